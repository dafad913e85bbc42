//! Compiler and driver seams, plus round-trip helpers.
//!
//! quarry stops at the query tree. A [`Compiler`] renders a [`Query`] into
//! whatever statement form a backend understands, and a [`Driver`] runs that
//! statement and hands back raw [`Row`]s. Both live outside this crate; the
//! helpers here only wire compile, run, and hydrate together.
//!
//! Model fetches hydrate against the global registry and honor
//! `Settings::include_sensitive`.

use quarry_core::logging::statement_span;
use quarry_core::{QuarryError, QuarryResult, SETTINGS};
use tracing::Instrument;

use crate::model::Model;
use crate::query::tree::Query;
use crate::reader::{self, Hydrator};
use crate::row::Row;

/// Renders query trees into backend statements.
pub trait Compiler: Send + Sync {
    /// The compiled statement, e.g. SQL text plus bound parameters.
    type Output: Send + Sync;

    /// Compiles one query tree.
    fn compile(&self, query: &Query) -> QuarryResult<Self::Output>;
}

/// Executes compiled statements.
///
/// Implementations map their own failures into `QuarryError::Driver`.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// The statement type this driver runs.
    type Statement: Send + Sync;

    /// Runs a statement that returns rows.
    async fn fetch(&self, statement: &Self::Statement) -> QuarryResult<Vec<Row>>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(&self, statement: &Self::Statement) -> QuarryResult<u64>;
}

async fn fetch_rows<C, D>(compiler: &C, driver: &D, query: &Query) -> QuarryResult<Vec<Row>>
where
    C: Compiler,
    D: Driver<Statement = C::Output>,
{
    let span = statement_span(query.kind.as_str(), query.table().table_name());
    async {
        let statement = compiler.compile(query)?;
        let rows = driver.fetch(&statement).await?;
        tracing::debug!(rows = rows.len(), "fetched rows");
        Ok::<_, QuarryError>(rows)
    }
    .instrument(span)
    .await
}

fn hydrator<M: Model>() -> Hydrator {
    Hydrator::for_model::<M>().include_sensitive(SETTINGS.get().include_sensitive)
}

/// Runs a query and hydrates every row into `M`.
///
/// # Errors
///
/// Propagates compiler, driver, and hydration errors.
pub async fn fetch_all<M, C, D>(compiler: &C, driver: &D, query: impl Into<Query>) -> QuarryResult<Vec<M>>
where
    M: Model,
    C: Compiler,
    D: Driver<Statement = C::Output>,
{
    let rows = fetch_rows(compiler, driver, &query.into()).await?;
    hydrator::<M>().models(&rows)
}

/// Runs a query and hydrates the first row into `M`.
///
/// # Errors
///
/// Returns `NotFound` when the query yields no rows, or propagates
/// compiler, driver, and hydration errors.
pub async fn fetch_one<M, C, D>(compiler: &C, driver: &D, query: impl Into<Query>) -> QuarryResult<M>
where
    M: Model,
    C: Compiler,
    D: Driver<Statement = C::Output>,
{
    let rows = fetch_rows(compiler, driver, &query.into()).await?;
    hydrator::<M>().one(&rows)
}

/// Runs a query and reads the first cell as a count.
///
/// # Errors
///
/// Propagates compiler and driver errors, or `Hydration` when the cell is
/// not a number.
pub async fn fetch_count<C, D>(compiler: &C, driver: &D, query: impl Into<Query>) -> QuarryResult<i64>
where
    C: Compiler,
    D: Driver<Statement = C::Output>,
{
    let rows = fetch_rows(compiler, driver, &query.into()).await?;
    reader::scalar(&rows)
}

/// Runs a statement that returns no rows and reports the affected count.
///
/// # Errors
///
/// Propagates compiler and driver errors.
pub async fn execute<C, D>(compiler: &C, driver: &D, query: impl Into<Query>) -> QuarryResult<u64>
where
    C: Compiler,
    D: Driver<Statement = C::Output>,
{
    let query = query.into();
    let span = statement_span(query.kind.as_str(), query.table().table_name());
    async {
        let statement = compiler.compile(&query)?;
        let affected = driver.execute(&statement).await?;
        tracing::debug!(affected, "executed statement");
        Ok::<_, QuarryError>(affected)
    }
    .instrument(span)
    .await
}
