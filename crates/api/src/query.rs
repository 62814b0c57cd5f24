//! Query-string handling for list endpoints.
//!
//! List endpoints take every query pair as-is: `limit`, `offset` and
//! `order_by` control paging and sorting, everything else is a filter
//! resolved against the entity's [`FilterSchema`].

use crm_core::filter::{FilterSchema, Ordering, Predicate};
use crm_db::pagination::Page;

use crate::error::{AppError, AppResult};

/// Raw `?key=value` pairs of a list request, in request order.
#[derive(Debug, Default, Clone)]
pub struct ListParams {
    pairs: Vec<(String, String)>,
}

/// Everything a repository `list` call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    pub filter: Option<Predicate>,
    pub ordering: Ordering,
    pub page: Page,
}

impl ListParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn integer(&self, key: &str) -> AppResult<Option<i64>> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("{key} must be an integer")))
            })
            .transpose()
    }

    /// Resolve filters, ordering and paging against `schema`.
    pub fn resolve(&self, schema: &FilterSchema) -> AppResult<ListSpec> {
        let page = Page::new(self.integer("limit")?, self.integer("offset")?);
        let ordering = schema.ordering(self.get("order_by"))?;
        let filter = schema.parse(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        Ok(ListSpec {
            filter,
            ordering,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crm_core::error::CoreError;
    use crm_core::filter::{CUSTOMER_FILTERS, PRODUCT_FILTERS};
    use crm_db::pagination::DEFAULT_LIMIT;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn empty_query_uses_defaults() {
        let spec = params(&[]).resolve(&CUSTOMER_FILTERS).unwrap();
        assert_eq!(spec.filter, None);
        assert_eq!(spec.ordering, CUSTOMER_FILTERS.default_ordering);
        assert_eq!(spec.page.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn splits_paging_sorting_and_filters() {
        let spec = params(&[
            ("limit", "5"),
            ("offset", "10"),
            ("order_by", "-price"),
            ("name__icontains", "key"),
        ])
        .resolve(&PRODUCT_FILTERS)
        .unwrap();

        assert_eq!(spec.page, Page::new(Some(5), Some(10)));
        assert_eq!(spec.ordering.column, "price_cents");
        assert!(spec.ordering.descending);
        assert_eq!(spec.filter, Some(Predicate::icontains("name", "key")));
    }

    #[test]
    fn non_numeric_limit_is_bad_request() {
        assert_matches!(
            params(&[("limit", "ten")]).resolve(&CUSTOMER_FILTERS),
            Err(AppError::BadRequest(_))
        );
    }

    #[test]
    fn unknown_filter_is_validation_error() {
        assert_matches!(
            params(&[("password", "x")]).resolve(&CUSTOMER_FILTERS),
            Err(AppError::Core(CoreError::Validation(_)))
        );
    }
}
