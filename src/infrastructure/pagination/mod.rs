//! List query execution

mod paginator;

pub use paginator::paginate;
