//! Paginated listing over any resource store

use tracing::debug;

use crate::domain::pagination::{ListSpec, Paginated, PaginationQuery};
use crate::domain::storage::{Filter, Storage, StorageEntity, StorageQuery};
use crate::domain::DomainError;

/// Count, then fetch one page
///
/// The search term is OR-ed across the listing's search fields and the result is
/// AND-ed with `base_filter`, so owner scoping can never be widened by a search.
pub async fn paginate<E>(
    store: &dyn Storage<E>,
    query: &PaginationQuery,
    spec: &ListSpec,
    base_filter: Filter,
) -> Result<Paginated<E>, DomainError>
where
    E: StorageEntity + 'static,
{
    let request = query.normalize(spec);

    let mut filter = base_filter;
    if let Some(search) = &request.search {
        let clauses: Vec<Filter> = spec
            .search_fields
            .iter()
            .map(|field| Filter::contains(*field, search.as_str()))
            .collect();

        if !clauses.is_empty() {
            filter = filter.and(Filter::Or(clauses));
        }
    }

    let total = store.count_where(&filter).await?;

    let offset = request.offset();
    let find = StorageQuery::new(filter)
        .with_sort(request.sort.clone())
        .with_offset(offset)
        .with_limit(request.limit as usize);

    let data = store.find(&find).await?;

    debug!(
        total = total,
        page = request.page,
        limit = request.limit,
        sort_by = %request.sort.field,
        "Paginated query"
    );

    Ok(Paginated::new(data, total, request.page, request.limit, offset))
}
