/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains the functions that read and write wisdom rows, including the
/// atomic updates that drive each wisdom through its 21/21 cycle.
///
/// The repository pattern abstracts away the details of database access
/// and provides a clean API for the rest of the application to use.

mod wisdom_repo;
mod cycle_repo;
mod category_repo;

// Re-export all repository functions
pub use wisdom_repo::*;
pub use cycle_repo::*;
pub use category_repo::*;
