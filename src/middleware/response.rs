use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Pagination details reported in the envelope's `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl PaginationMeta {
    /// Page-number metadata for a limit/offset window.
    pub fn from_offset(limit: i64, offset: i64, total: i64) -> Self {
        let limit = limit.max(1);
        Self {
            page: offset / limit + 1,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
            offset: Some(offset),
        }
    }
}

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub metadata: Option<PaginationMeta>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            metadata: None,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data,
            metadata: None,
            status_code: Some(StatusCode::CREATED),
        }
    }

    pub fn paginated(data: T, metadata: PaginationMeta) -> Self {
        Self {
            data,
            metadata: Some(metadata),
            status_code: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// The `{success: true, data, metadata?}` body.
    pub fn envelope(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = json!({
            "success": true,
            "data": serde_json::to_value(&self.data)?,
        });
        if let Some(metadata) = &self.metadata {
            envelope["metadata"] = serde_json::to_value(metadata)?;
        }
        Ok(envelope)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);
        match self.envelope() {
            Ok(envelope) => (status, Json(envelope)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                crate::error::ApiError::internal(e).into_response()
            }
        }
    }
}

/// Body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: uuid::Uuid,
    pub deleted: bool,
}

impl Deleted {
    pub fn new(id: uuid::Uuid) -> Self {
        Self { id, deleted: true }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_pages_start_at_one() {
        let meta = PaginationMeta::from_offset(2, 0, 5);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.total_pages, 3);

        let meta = PaginationMeta::from_offset(2, 4, 5);
        assert_eq!(meta.page, 3);
        assert_eq!(meta.offset, Some(4));
    }

    #[test]
    fn empty_result_has_zero_pages() {
        assert_eq!(PaginationMeta::from_offset(20, 0, 0).total_pages, 0);
    }

    #[test]
    fn metadata_is_omitted_unless_paginated() {
        let plain = ApiResponse::success(vec![1, 2]).envelope().unwrap();
        assert_eq!(plain, json!({"success": true, "data": [1, 2]}));

        let paged = ApiResponse::paginated(vec![1], PaginationMeta::from_offset(1, 0, 2)).envelope().unwrap();
        assert_eq!(paged["metadata"]["totalPages"], json!(2));
        assert_eq!(paged["metadata"]["offset"], json!(0));
    }
}
