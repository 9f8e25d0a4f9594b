use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Largest offset Postgres accepts (`OFFSET` is a signed bigint).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Resolves optional `page`/`limit` into `(page, limit, offset)`. Huge pages saturate
/// to `MAX_OFFSET` and simply come back empty.
pub fn normalize(page: Option<u64>, limit: Option<u64>) -> (u64, u64, u64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = (page - 1).saturating_mul(limit).min(MAX_OFFSET);
    (page, limit, offset)
}

// Paging fields are repeated per query struct instead of flattened: serde_urlencoded
// cannot parse numbers inside a flattened struct.

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }
}

/// Free-text search plus paging, shared by users, buyers, vouchers and books.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl SearchQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }

    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub search: Option<String>,
    pub user_id: Option<i32>,
    pub buyer_id: Option<i64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl OrderQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DetailOrderQuery {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl DetailOrderQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RatingQuery {
    pub order_id: Option<i64>,
    pub product_id: Option<i32>,
    pub buyer_id: Option<i64>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl RatingQuery {
    pub fn normalize(&self) -> (u64, u64, u64) {
        normalize(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        assert_eq!(normalize(None, None), (1, 10, 0));
    }

    #[test]
    fn computes_offset_from_page_and_limit() {
        assert_eq!(normalize(Some(2), Some(5)), (2, 5, 5));
        assert_eq!(normalize(Some(3), Some(20)), (3, 20, 40));
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(normalize(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(normalize(Some(1), Some(1000)), (1, MAX_LIMIT, 0));
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let (page, limit, offset) = normalize(Some(u64::MAX), Some(10));
        assert_eq!((page, limit), (u64::MAX, 10));
        assert_eq!(offset, i64::MAX as u64);

        let query: ProductQuery = parse_query("page=18446744073709551615");
        assert_eq!(query.normalize().2, i64::MAX as u64);
    }

    #[test]
    fn product_query_reads_type_from_query_string() {
        let query: ProductQuery =
            parse_query("search=book&type=ebook&page=2&limit=5");
        assert_eq!(query.product_type.as_deref(), Some("ebook"));
        assert_eq!(query.normalize(), (2, 5, 5));
    }

    fn parse_query<T: serde::de::DeserializeOwned>(s: &str) -> T {
        let uri: axum::http::Uri = format!("/?{s}").parse().unwrap();
        axum::extract::Query::<T>::try_from_uri(&uri).unwrap().0
    }
}
