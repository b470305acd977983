//! # Filtering & Sorting
//!
//! Translates the normalized [`RequestModel`](crate::request::RequestModel) into an abstract,
//! backend-agnostic description of the WHERE and ORDER BY parts of a grid query.
//!
//! ## Combination rule
//!
//! ```text
//! (global_1 OR global_2 OR ... global_N) AND column_1 AND column_2 AND ... column_M
//! ```
//!
//! - The global group is built from the global search term, once per searchable column.
//! - The column group holds one predicate per searchable column with its own search term.
//! - Empty groups are omitted; with both empty no filtering is applied.
//!
//! Each executor interprets the resulting [`PredicateSet`] and [`OrderDirective`] list in
//! its own dialect: the raw SQL executor renders bound SQL text, the builder executor
//! emits Sea-ORM conditions with `EXISTS` sub-queries for relation-scoped predicates.

pub mod predicate;
pub mod sort;

pub use predicate::{Operator, Predicate, PredicateSet, build_predicates};
pub use sort::{OrderDirective, build_order};
