//! Named window definitions.
//!
//! A [`Window`] resolves partition and ordering names the same way SELECT
//! grouping and ordering do. Choosing a frame unit with [`Window::rows`],
//! [`Window::range`] or [`Window::groups`] returns a [`Frame`], which is the
//! only place frame bounds and exclusions can be set.
//!
//! ```
//! use quarry_db::prelude::*;
//!
//! struct Sale;
//! impl Model for Sale {
//!     fn from_record(_: &Record) -> QuarryResult<Self> { Ok(Sale) }
//!     fn to_record(&self) -> Record { Record::new() }
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register::<Sale>(
//!         TableBuilder::new()
//!             .field("region", FieldDescriptor::new())
//!             .field("day", FieldDescriptor::new()),
//!     )
//!     .unwrap();
//!
//! let by_region = Window::new_in::<Sale>(&registry).unwrap().partition_by(["region"]).unwrap();
//! let running = Window::extending_in::<Sale>(&registry, &by_region)
//!     .unwrap()
//!     .order_by([asc("day")])
//!     .unwrap()
//!     .rows()
//!     .start(FrameBound::UnboundedPreceding)
//!     .end(FrameBound::CurrentRow)
//!     .def();
//! assert_eq!(running.partition_by.len(), 1);
//! assert!(running.extends.is_none());
//! ```

use quarry_core::QuarryResult;

use super::common;
use crate::model::Model;
use crate::query::expressions::{
    Expr, FrameBound, FrameExclusion, FrameMode, OrderTarget, OrderTerm, WindowDescriptor,
};
use crate::query::resolver::Resolver;
use crate::registry::{registry, Registry};

/// A window definition under construction.
#[derive(Debug, Clone)]
pub struct Window {
    resolver: Resolver,
    descriptor: WindowDescriptor,
}

impl Window {
    /// Starts a window over a globally registered model.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn new<M: Model>() -> QuarryResult<Self> {
        Self::new_in::<M>(registry())
    }

    /// Starts a window over a model registered in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn new_in<M: Model>(registry: &Registry) -> QuarryResult<Self> {
        Ok(Self::with_resolver(Resolver::new(registry.lookup::<M>()?), None))
    }

    /// Starts a window extending `parent`, over a globally registered model.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn extending<M: Model>(parent: &Self) -> QuarryResult<Self> {
        Self::extending_in::<M>(registry(), parent)
    }

    /// Starts a window extending `parent`, over a model from `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn extending_in<M: Model>(registry: &Registry, parent: &Self) -> QuarryResult<Self> {
        Ok(Self::with_resolver(
            Resolver::new(registry.lookup::<M>()?),
            Some(parent),
        ))
    }

    /// Starts a window resolving names through an existing resolver, e.g.
    /// one carrying a SELECT's alias.
    ///
    /// The parent's definition is captured as it is now; later changes to
    /// the parent are not seen.
    pub fn with_resolver(resolver: Resolver, parent: Option<&Self>) -> Self {
        Self {
            resolver,
            descriptor: WindowDescriptor {
                extends: parent.map(|p| Box::new(p.chain())),
                ..WindowDescriptor::default()
            },
        }
    }

    /// PARTITION BY the named fields (or ordinals).
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField`.
    pub fn partition_by<I, T>(mut self, targets: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTarget>,
    {
        let exprs = common::group_targets(&self.resolver, targets)?;
        self.descriptor.partition_by.extend(exprs);
        Ok(self)
    }

    /// PARTITION BY the expressions returned by the callback.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn partition_by_with<F>(mut self, exprs: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<Expr>>,
    {
        let exprs = exprs(&self.resolver)?;
        self.descriptor
            .partition_by
            .extend(exprs.into_iter().map(Expr::unaliased));
        Ok(self)
    }

    /// ORDER BY names, expressions, or ordinals.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField` for named terms.
    pub fn order_by<I, T>(mut self, terms: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        let terms = common::order_terms(&self.resolver, terms)?;
        self.descriptor.order_by.extend(terms);
        Ok(self)
    }

    /// ORDER BY the terms returned by the callback.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn order_by_with<F>(mut self, terms: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<OrderTerm>>,
    {
        let terms = terms(&self.resolver)?;
        let terms = common::order_terms(&self.resolver, terms)?;
        self.descriptor.order_by.extend(terms);
        Ok(self)
    }

    fn frame(mut self, mode: FrameMode) -> Frame {
        self.descriptor.frame_mode = Some(mode);
        Frame { window: self }
    }

    /// Sets a ROWS frame.
    pub fn rows(self) -> Frame {
        self.frame(FrameMode::Rows)
    }

    /// Sets a RANGE frame.
    pub fn range(self) -> Frame {
        self.frame(FrameMode::Range)
    }

    /// Sets a GROUPS frame.
    pub fn groups(self) -> Frame {
        self.frame(FrameMode::Groups)
    }

    /// Returns the resolver partition and ordering names go through.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Returns the definition with its inheritance chain merged.
    pub fn def(&self) -> WindowDescriptor {
        let def = self.descriptor.flattened();
        tracing::trace!(depth = self.descriptor.depth(), "window definition flattened");
        def
    }

    /// Returns the definition with `extends` links kept, for compilers that
    /// emit named windows referring to their parent.
    pub fn chain(&self) -> WindowDescriptor {
        self.descriptor.clone()
    }
}

/// A window whose frame unit is set.
#[derive(Debug, Clone)]
pub struct Frame {
    window: Window,
}

impl Frame {
    /// Sets the frame start.
    #[must_use]
    pub fn start(mut self, bound: FrameBound) -> Self {
        self.window.descriptor.frame_start = Some(bound);
        self
    }

    /// Sets the frame end.
    #[must_use]
    pub fn end(mut self, bound: FrameBound) -> Self {
        self.window.descriptor.frame_end = Some(bound);
        self
    }

    /// Sets the frame exclusion.
    #[must_use]
    pub fn exclusion(mut self, exclusion: FrameExclusion) -> Self {
        self.window.descriptor.frame_exclusion = Some(exclusion);
        self
    }

    /// Returns the definition with its inheritance chain merged.
    pub fn def(&self) -> WindowDescriptor {
        self.window.def()
    }

    /// Returns the definition with `extends` links kept.
    pub fn chain(&self) -> WindowDescriptor {
        self.window.chain()
    }

    /// Returns the window, e.g. to extend it.
    pub fn into_window(self) -> Window {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;
    use crate::model::TableBuilder;
    use crate::query::expressions::{desc, row_number, Direction, WindowCall, WindowFunction};
    use crate::row::Record;
    use pretty_assertions::assert_eq;

    struct Sale;

    impl Model for Sale {
        fn from_record(_record: &Record) -> QuarryResult<Self> {
            Ok(Self)
        }
        fn to_record(&self) -> Record {
            Record::new()
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register::<Sale>(
                TableBuilder::new()
                    .field("id", FieldDescriptor::new().primary_key())
                    .field("region", FieldDescriptor::new())
                    .field("amount", FieldDescriptor::new())
                    .filter_field("tag", FieldDescriptor::related("tag", "sale_id", "label")),
            )
            .unwrap();
        registry
    }

    fn col(name: &str) -> Expr {
        Expr::column(Some("sale"), name)
    }

    #[test]
    fn test_partition_and_order() {
        let registry = registry();
        let def = Window::new_in::<Sale>(&registry)
            .unwrap()
            .partition_by(["region"])
            .unwrap()
            .order_by([desc("amount")])
            .unwrap()
            .def();
        assert_eq!(def.partition_by, vec![col("region")]);
        assert_eq!(def.order_by[0].target, OrderTarget::Expr(col("amount")));
        assert_eq!(def.order_by[0].direction, Some(Direction::Desc));
        assert_eq!(def.frame_mode, None);
    }

    #[test]
    fn test_partition_rejects_virtual() {
        let registry = registry();
        let err = Window::new_in::<Sale>(&registry)
            .unwrap()
            .partition_by(["tag"])
            .unwrap_err();
        assert!(err.is_metadata_error());
    }

    #[test]
    fn test_frame_settings() {
        let registry = registry();
        let def = Window::new_in::<Sale>(&registry)
            .unwrap()
            .range()
            .start(FrameBound::Preceding(3))
            .end(FrameBound::Following(1))
            .exclusion(FrameExclusion::Ties)
            .def();
        assert_eq!(def.frame_mode, Some(FrameMode::Range));
        assert_eq!(def.frame_start, Some(FrameBound::Preceding(3)));
        assert_eq!(def.frame_end, Some(FrameBound::Following(1)));
        assert_eq!(def.frame_exclusion, Some(FrameExclusion::Ties));
    }

    #[test]
    fn test_extending_inherits_and_overrides() {
        let registry = registry();
        let parent = Window::new_in::<Sale>(&registry)
            .unwrap()
            .partition_by(["region"])
            .unwrap()
            .rows()
            .start(FrameBound::UnboundedPreceding)
            .into_window();
        let child = Window::extending_in::<Sale>(&registry, &parent)
            .unwrap()
            .order_by(["amount"])
            .unwrap()
            .groups();

        let def = child.def();
        assert!(def.extends.is_none());
        assert_eq!(def.partition_by, vec![col("region")]);
        assert_eq!(def.order_by.len(), 1);
        assert_eq!(def.frame_mode, Some(FrameMode::Groups));
        assert_eq!(def.frame_start, Some(FrameBound::UnboundedPreceding));

        let chain = child.chain();
        assert_eq!(chain.depth(), 2);
        assert!(chain.partition_by.is_empty());
    }

    #[test]
    fn test_window_in_function_call() {
        let registry = registry();
        let over = Window::new_in::<Sale>(&registry)
            .unwrap()
            .partition_by(["region"])
            .unwrap()
            .def();
        let expr = row_number(&over, None);
        match expr {
            Expr::Window(call) => {
                let WindowCall { function, window, .. } = *call;
                assert_eq!(function, WindowFunction::RowNumber);
                assert_eq!(window, over);
            }
            other => panic!("expected window call, got {other:?}"),
        }
    }

    #[test]
    fn test_aliased_resolver() {
        let registry = registry();
        let resolver = Resolver::new(registry.lookup::<Sale>().unwrap()).with_alias("s");
        let def = Window::with_resolver(resolver, None)
            .partition_by_with(|s| Ok(vec![s.field("region")?]))
            .unwrap()
            .def();
        assert_eq!(def.partition_by, vec![Expr::column(Some("s"), "region")]);
    }
}
