//! Pagination window extractor for list endpoints.

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, HeaderName, HeaderValue, request::Parts},
    response::Response,
};
use serde::Deserialize;

use crate::errors::AppError;
use pagination::{
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, Pagination, PaginationHeaders, PaginationOptions,
    create_pagination,
};

/// Hard cap on `pageSize` for HTTP list endpoints.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Deserialize)]
struct PaginationParams {
    page: Option<u64>,
    #[serde(rename = "pageSize", alias = "page_size")]
    page_size: Option<u64>,
}

/// Extracts a validated [`Pagination`] window from `page` / `pageSize`
/// query parameters.
///
/// Missing parameters fall back to page 1 with 20 records; `page=0`,
/// `pageSize=0` or a page size above [`MAX_PAGE_SIZE`] is rejected with
/// a 400 validation error.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::PaginationQuery;
///
/// async fn list(PaginationQuery(pagination): PaginationQuery) -> String {
///     format!("page {} offset {}", pagination.page, pagination.offset)
/// }
/// ```
pub struct PaginationQuery(pub Pagination);

impl<S> FromRequestParts<S> for PaginationQuery
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        use axum::response::IntoResponse;

        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()).into_response())?;

        let options = PaginationOptions {
            max_limit: Some(MAX_PAGE_SIZE),
        };
        let pagination = create_pagination(
            params.page.unwrap_or(DEFAULT_PAGE),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            &options,
        )
        .map_err(|e| AppError::BadRequest(e.to_string()).into_response())?;

        Ok(PaginationQuery(pagination))
    }
}

/// Build the `x-pagination-*` response headers for one page of results.
///
/// Values are plain integers, so conversion into header values cannot
/// fail in practice; a value that somehow does is skipped.
pub fn pagination_header_map(headers: &PaginationHeaders) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers.as_pairs() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/",
            get(|PaginationQuery(p): PaginationQuery| async move {
                format!("{}:{}:{}", p.page, p.page_size, p.offset)
            }),
        )
    }

    async fn body_text(request: Request<Body>) -> (StatusCode, String) {
        use http_body_util::BodyExt;

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn defaults_when_params_missing() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = body_text(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1:20:0");
    }

    #[tokio::test]
    async fn derives_offset_from_page() {
        let request = Request::builder()
            .uri("/?page=3&pageSize=25")
            .body(Body::empty())
            .unwrap();
        let (status, body) = body_text(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "3:25:50");
    }

    #[tokio::test]
    async fn rejects_zero_page() {
        let request = Request::builder()
            .uri("/?page=0")
            .body(Body::empty())
            .unwrap();
        let (status, _) = body_text(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_oversized_page_size() {
        let request = Request::builder()
            .uri("/?pageSize=1000")
            .body(Body::empty())
            .unwrap();
        let (status, body) = body_text(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("100"));
    }

    #[test]
    fn header_map_contains_all_three_headers() {
        let headers = PaginationHeaders {
            page: 2,
            page_size: 10,
            total: 45,
        };
        let map = pagination_header_map(&headers);
        assert_eq!(map.get("x-pagination-page").unwrap(), "2");
        assert_eq!(map.get("x-pagination-page-size").unwrap(), "10");
        assert_eq!(map.get("x-pagination-total").unwrap(), "45");
    }
}
