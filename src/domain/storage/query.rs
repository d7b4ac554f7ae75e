//! Backend-neutral query model: filters, sorting and windowing
//!
//! Filters address top-level fields of an entity's JSON document. The same
//! filter is evaluated in memory (`Filter::matches`) and translated to SQL by
//! the PostgreSQL backend, so both must agree on text semantics: scalar
//! values compare by their textual form, and missing or null fields never
//! match.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{StorageEntity, StorageKey};
use crate::domain::DomainError;

const MAX_FIELD_NAME_LENGTH: usize = 63;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a user supplied direction, falling back to descending
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "asc" || v == "ascending" => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Field + direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Boolean filter expression over document fields
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field's textual value equals `value`
    Eq { field: String, value: String },
    /// Field's textual value contains `needle`, ignoring case
    Contains { field: String, needle: String },
    /// Every inner filter matches (empty = true)
    And(Vec<Filter>),
    /// At least one inner filter matches (empty = false)
    Or(Vec<Filter>),
}

impl Default for Filter {
    fn default() -> Self {
        Self::All
    }
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    /// Combine with another filter via logical AND, flattening `All`
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, other) => Filter::And(vec![f, other]),
        }
    }

    /// Every field name referenced by the filter
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Filter::All => Vec::new(),
            Filter::Eq { field, .. } | Filter::Contains { field, .. } => vec![field.as_str()],
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().flat_map(|f| f.fields()).collect()
            }
        }
    }

    /// Reject filters whose field names could not be safely embedded in SQL
    pub fn validate(&self) -> Result<(), DomainError> {
        for field in self.fields() {
            validate_field_name(field)?;
        }
        Ok(())
    }

    /// Evaluate against a serialized document
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => {
                field_text(document, field).is_some_and(|text| text == *value)
            }
            Filter::Contains { field, needle } => field_text(document, field)
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }
}

/// Filter + optional sort + window
#[derive(Debug, Clone, Default)]
pub struct StorageQuery {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl StorageQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.filter.validate()?;

        if let Some(sort) = &self.sort {
            validate_field_name(&sort.field)?;
        }

        Ok(())
    }
}

/// Field names are restricted to `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_field_name(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();

    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !valid_start
        || name.len() > MAX_FIELD_NAME_LENGTH
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::validation(format!(
            "Invalid field name '{}'",
            name
        )));
    }

    Ok(())
}

/// Run a query over already-loaded entities
///
/// Used by the in-memory backends. Results are ordered by the sort field and
/// then by key so that paging is deterministic. Fields listed in
/// `E::TIMESTAMP_FIELDS` compare chronologically, everything else by value.
pub fn apply_query<E: StorageEntity>(
    entities: Vec<E>,
    query: &StorageQuery,
) -> Result<Vec<E>, DomainError> {
    query.validate()?;

    let mut documents = Vec::with_capacity(entities.len());

    for entity in entities {
        let document = serde_json::to_value(&entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize entity: {}", e)))?;

        if query.filter.matches(&document) {
            documents.push((document, entity));
        }
    }

    let chronological = query
        .sort
        .as_ref()
        .is_some_and(|sort| E::TIMESTAMP_FIELDS.contains(&sort.field.as_str()));

    documents.sort_by(|(doc_a, a), (doc_b, b)| {
        let primary = match &query.sort {
            Some(sort) => {
                let ordering = compare_values(
                    doc_a.get(&sort.field),
                    doc_b.get(&sort.field),
                    chronological,
                );
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            }
            None => Ordering::Equal,
        };

        primary.then_with(|| a.key().as_str().cmp(b.key().as_str()))
    });

    let iter = documents.into_iter().skip(query.offset).map(|(_, e)| e);

    Ok(match query.limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    })
}

fn field_text(document: &Value, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>, chronological: bool) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) if chronological => {
            // chrono drops trailing zero fractions, so text order is wrong
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter_matches_text_form() {
        let doc = json!({"name": "Dragon", "level": 3, "active": true});

        assert!(Filter::eq("name", "Dragon").matches(&doc));
        assert!(Filter::eq("level", "3").matches(&doc));
        assert!(Filter::eq("active", "true").matches(&doc));
        assert!(!Filter::eq("name", "dragon").matches(&doc));
        assert!(!Filter::eq("missing", "x").matches(&doc));
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let doc = json!({"name": "Ancient Dragon"});

        assert!(Filter::contains("name", "dragon").matches(&doc));
        assert!(Filter::contains("name", "ANCIENT").matches(&doc));
        assert!(!Filter::contains("name", "wyvern").matches(&doc));
    }

    #[test]
    fn test_null_never_matches() {
        let doc = json!({"owner_id": null});
        assert!(!Filter::eq("owner_id", "null").matches(&doc));
    }

    #[test]
    fn test_empty_and_or() {
        let doc = json!({});
        assert!(Filter::And(vec![]).matches(&doc));
        assert!(!Filter::Or(vec![]).matches(&doc));
    }

    #[test]
    fn test_and_flattens_all() {
        let f = Filter::All.and(Filter::eq("a", "1"));
        assert_eq!(f, Filter::eq("a", "1"));

        let f = Filter::eq("a", "1")
            .and(Filter::eq("b", "2"))
            .and(Filter::eq("c", "3"));
        assert!(matches!(f, Filter::And(ref inner) if inner.len() == 3));
    }

    #[test]
    fn test_field_name_validation() {
        assert!(validate_field_name("owner_id").is_ok());
        assert!(validate_field_name("_private").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("1abc").is_err());
        assert!(validate_field_name("name; DROP TABLE users").is_err());
        assert!(validate_field_name("data'->>'x").is_err());
    }

    #[test]
    fn test_query_validate_rejects_bad_sort() {
        let query = StorageQuery::default().with_sort(SortSpec::new("bad field", SortOrder::Asc));
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse_or_default(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or_default(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or_default(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(None), SortOrder::Desc);
    }

    #[test]
    fn test_timestamps_compare_chronologically() {
        let earlier = json!("2024-01-01T00:00:00Z");
        let later = json!("2024-01-01T00:00:00.500Z");

        assert_eq!(
            compare_values(Some(&earlier), Some(&later), true),
            Ordering::Less
        );
        // As text, "...00Z" sorts after "...00.500Z"
        assert_eq!(
            compare_values(Some(&earlier), Some(&later), false),
            Ordering::Greater
        );
    }
}
