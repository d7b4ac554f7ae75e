//! List query normalisation

use serde::Deserialize;

use crate::domain::storage::{SortOrder, SortSpec};

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;

/// Raw, caller-supplied list parameters (typically from the query string)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Page-size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
        }
    }
}

impl PageLimits {
    /// A zero max is treated as 1 and the default is kept within bounds
    pub fn new(default_limit: u32, max_limit: u32) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            default_limit: default_limit.clamp(1, max_limit),
            max_limit,
        }
    }
}

/// Per-resource listing rules
#[derive(Debug, Clone)]
pub struct ListSpec {
    /// Fields searched (OR) by the `search` parameter
    pub search_fields: &'static [&'static str],
    /// Whitelist for `sort_by`
    pub sortable_fields: &'static [&'static str],
    /// Used when `sort_by` is absent or not whitelisted
    pub default_sort: &'static str,
    pub limits: PageLimits,
}

impl ListSpec {
    pub fn new(
        search_fields: &'static [&'static str],
        sortable_fields: &'static [&'static str],
        default_sort: &'static str,
    ) -> Self {
        Self {
            search_fields,
            sortable_fields,
            default_sort,
            limits: PageLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Normalised, bounded page request
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort: SortSpec,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl PaginationQuery {
    /// Clamp and whitelist the raw parameters against a listing spec
    pub fn normalize(&self, spec: &ListSpec) -> PageRequest {
        let limits = spec.limits;

        let page = self
            .page
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX)) as u32;

        let limit = self
            .limit
            .unwrap_or(i64::from(limits.default_limit))
            .clamp(1, i64::from(limits.max_limit)) as u32;

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let sort_field = self
            .sort_by
            .as_deref()
            .map(str::trim)
            .and_then(|field| spec.sortable_fields.iter().find(|f| **f == field))
            .copied()
            .unwrap_or(spec.default_sort);

        PageRequest {
            page,
            limit,
            search,
            sort: SortSpec::new(
                sort_field,
                SortOrder::parse_or_default(self.sort_order.as_deref()),
            ),
        }
    }
}
