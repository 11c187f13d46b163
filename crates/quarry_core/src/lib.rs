//! Logical query core: plan trees, rule based analysis and a row executor.
//!
//! A parser front-end produces an unresolved [`logical::operator::LogicalOperator`]
//! tree. The [`analyzer::Analyzer`] binds it against a [`catalog::Catalog`] and
//! [`catalog::view::ViewRegistry`], and [`execution::execute`] runs the
//! resolved plan.

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod context;
pub mod execution;
pub mod expr;
pub mod functions;
pub mod logical;
pub mod tree;
pub mod types;
