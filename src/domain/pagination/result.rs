//! Paginated response envelope

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Items in this page
    pub count: usize,
    /// Items matching the filter across all pages
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: usize, page: u32, page_size: u32, offset: usize) -> Self {
        let count = data.len();

        Self {
            data,
            pagination: PaginationMeta {
                count,
                total,
                page,
                page_size,
                has_more: offset + count < total,
            },
        }
    }

    /// Convert the items while keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_more() {
        let page = Paginated::new(vec![1, 2], 5, 1, 2, 0);
        assert!(page.pagination.has_more);
        assert_eq!(page.pagination.count, 2);

        let last = Paginated::new(vec![5], 5, 3, 2, 4);
        assert!(!last.pagination.has_more);

        let beyond: Paginated<i32> = Paginated::new(vec![], 5, 10, 2, 18);
        assert!(!beyond.pagination.has_more);
    }

    #[test]
    fn test_map_keeps_meta() {
        let page = Paginated::new(vec![1, 2], 4, 1, 2, 0).map(|n| n.to_string());
        assert_eq!(page.data, vec!["1", "2"]);
        assert_eq!(page.pagination.total, 4);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(Paginated::new(vec!["a"], 1, 1, 20, 0)).unwrap();
        assert_eq!(value["pagination"]["page_size"], 20);
        assert_eq!(value["pagination"]["has_more"], false);
    }
}
