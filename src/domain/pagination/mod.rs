//! Pagination domain types

mod query;
mod result;

pub use query::{
    ListSpec, PageLimits, PageRequest, PaginationQuery, DEFAULT_MAX_PAGE_LIMIT, DEFAULT_PAGE_LIMIT,
};
pub use result::{Paginated, PaginationMeta};
