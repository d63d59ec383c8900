//! Client-side employee table
//!
//! The full employee list is fetched once; filtering, sorting and paging are
//! derived from it on every change, never incrementally.

pub mod engine;
pub mod export;
pub mod pager;
pub mod query;

pub use engine::EmployeeTable;
pub use export::{employees_to_csv, CSV_HEADERS};
pub use pager::{page_window, total_pages};
pub use query::{derive_view, SortColumn, SortDirection, TableViewState};
