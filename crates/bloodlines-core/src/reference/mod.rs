//! Static reference data: clinical ranges and the sidebar test catalog.
//!
//! Both tables are built once per process and shared through
//! [`RangeTable::standard`] and [`TestCatalog::standard`].

mod catalog;
mod ranges;

pub use catalog::*;
pub use ranges::*;
