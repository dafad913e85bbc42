//! Builds and runs statements through the facade with settings loaded from
//! TOML. Each integration test file is its own process, so configuring the
//! global slot here does not leak into other tests.

use std::sync::{Mutex, Once};

use pretty_assertions::assert_eq;
use quarry::core::settings_loader;
use quarry::db::executor::{execute, fetch_all};
use quarry::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Member {
    id: i64,
    handle: String,
    token: Option<String>,
}

impl Model for Member {
    fn from_record(record: &Record) -> QuarryResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            handle: record.get("handle")?,
            token: if record.contains("token") {
                record.get("token")?
            } else {
                None
            },
        })
    }

    fn to_record(&self) -> Record {
        Record::from_pairs([
            ("id", Value::from(self.id)),
            ("handle", Value::from(self.handle.clone())),
            ("token", Value::from(self.token.clone())),
        ])
    }
}

static INIT: Once = Once::new();

fn init() {
    INIT.call_once(|| {
        let settings = settings_loader::from_toml_str(
            r#"
            log_level = "quarry_db=debug"
            virtual_values = "skip"
            subquery_suffix = "_inner"
            include_sensitive = true
            "#,
        )
        .unwrap();
        setup_logging(&settings);
        SETTINGS.configure(settings).unwrap();

        registry()
            .register::<Member>(
                TableBuilder::named("members")
                    .field("id", FieldDescriptor::new().primary_key())
                    .field("handle", FieldDescriptor::new())
                    .field("token", FieldDescriptor::new().column("api_token").sensitive())
                    .filter_field("team", FieldDescriptor::related("team_members", "team_id", "member_id")),
            )
            .unwrap();
    });
}

struct TreeCompiler;

impl Compiler for TreeCompiler {
    type Output = Query;

    fn compile(&self, query: &Query) -> QuarryResult<Query> {
        Ok(query.clone())
    }
}

#[derive(Default)]
struct CannedDriver {
    rows: Vec<Row>,
    executed: Mutex<Vec<Query>>,
}

#[quarry::async_trait]
impl Driver for CannedDriver {
    type Statement = Query;

    async fn fetch(&self, _statement: &Query) -> QuarryResult<Vec<Row>> {
        Ok(self.rows.clone())
    }

    async fn execute(&self, statement: &Query) -> QuarryResult<u64> {
        self.executed.lock().unwrap().push(statement.clone());
        Ok(1)
    }
}

#[test]
fn test_settings_are_loaded() {
    init();
    assert!(SETTINGS.is_configured());
    assert_eq!(SETTINGS.get().virtual_values, VirtualValuesPolicy::Skip);
}

#[tokio::test]
async fn test_skip_policy_drops_virtual_values() {
    init();
    let driver = CannedDriver::default();
    let insert = Insert::into::<Member>()
        .unwrap()
        .values([("handle", "ada".into_expr()), ("team", 7_i64.into_expr())])
        .unwrap();
    execute(&TreeCompiler, &driver, insert).await.unwrap();

    let executed = driver.executed.lock().unwrap();
    assert_eq!(executed[0].values.keys().collect::<Vec<_>>(), ["handle"]);
}

#[test]
fn test_derived_table_uses_configured_suffix() {
    init();
    let inner = Select::from::<Member>().unwrap();
    let outer = Select::from_query(inner, None).unwrap().build();
    assert_eq!(outer.table().table_name(), "members_inner");
}

#[tokio::test]
async fn test_include_sensitive_setting_reaches_executor() {
    init();
    let driver = CannedDriver {
        rows: vec![Row::from_pairs([
            ("id", Value::Int(4)),
            ("handle", Value::from("ada")),
            ("api_token", Value::from("t0k3n")),
        ])],
        ..CannedDriver::default()
    };
    let members: Vec<Member> = fetch_all(&TreeCompiler, &driver, Select::from::<Member>().unwrap())
        .await
        .unwrap();
    assert_eq!(
        members,
        [Member {
            id: 4,
            handle: "ada".into(),
            token: Some("t0k3n".into()),
        }]
    );
}
