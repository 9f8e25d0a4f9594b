use serde::Serialize;
use utoipa::ToSchema;

/// Paging block attached to list responses.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub total_data: u64,
    pub total_page: u64,
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total_data: u64) -> Self {
        let total_page = if limit == 0 {
            0
        } else {
            total_data.div_ceil(limit)
        };
        Self {
            total_data,
            total_page,
            page,
            limit,
        }
    }
}

/// Envelope shared by every endpoint, success or failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    pub fn paginated(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::success(message, data)
        }
    }

    /// Success without a payload, e.g. after a delete.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
            error: None,
            pagination: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
            error,
            pagination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_total_page_up() {
        let p = Pagination::new(2, 5, 12);
        assert_eq!(
            p,
            Pagination {
                total_data: 12,
                total_page: 3,
                page: 2,
                limit: 5
            }
        );
        assert_eq!(Pagination::new(1, 10, 0).total_page, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_page, 1);
    }

    #[test]
    fn envelope_omits_absent_error_and_pagination() {
        let body = serde_json::to_value(ApiResponse::success("ok", 1)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": true, "message": "ok", "data": 1 }));

        let body = serde_json::to_value(ApiResponse::<()>::failure("gagal", Some("boom".into())))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": false, "message": "gagal", "data": null, "error": "boom" })
        );
    }
}
