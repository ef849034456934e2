//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the id assigned by the correlation middleware
//! - [`ApiJson`], [`ApiPath`], [`ApiQuery`]: the stock extractors with
//!   rejections rendered as [`AppError`] JSON instead of plain text
//! - [`OptionalJson`]: a JSON body the client may leave out entirely
//!
//! # Examples
//!
//! ```
//! use eventhub_web::{ApiJson, ApiPath, AppError, CorrelationId};
//! use serde::Deserialize;
//! use uuid::Uuid;
//!
//! #[derive(Deserialize)]
//! struct Rename { title: String }
//!
//! async fn rename(
//!     correlation_id: CorrelationId,
//!     ApiPath(id): ApiPath<Uuid>,
//!     ApiJson(body): ApiJson<Rename>,
//! ) -> Result<String, AppError> {
//!     tracing::info!(%correlation_id, %id, "renaming");
//!     Ok(body.title)
//! }
//! ```

use crate::error::AppError;
use crate::middleware::parse_header;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when the middleware is installed,
/// otherwise from the `X-Correlation-ID` header, otherwise generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }
        Ok(Self(parse_header(&parts.headers).unwrap_or_else(Uuid::new_v4)))
    }
}

/// JSON body extractor and response with [`AppError`] rejections.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// JSON body that may be omitted.
///
/// An empty body yields `None`. A non-empty body must parse as `T`, with the
/// same rejections as [`ApiJson`]; unlike `Option<Json<T>>`, malformed
/// input is reported rather than silently dropped.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::from_rejection(rejection.status(), rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        let axum::Json(value) = axum::Json::<T>::from_bytes(&bytes)?;
        Ok(Self(Some(value)))
    }
}

/// Path extractor with [`AppError`] rejections.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query-string extractor with [`AppError`] rejections.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        count: u32,
    }

    fn app() -> Router {
        Router::new()
            .route("/items/:id", get(|ApiPath(id): ApiPath<Uuid>| async move { id.to_string() }))
            .route(
                "/items",
                post(|ApiJson(p): ApiJson<Payload>| async move { format!("{}", p.count) }),
            )
            .route(
                "/maybe",
                post(|OptionalJson(p): OptionalJson<Payload>| async move {
                    p.map_or_else(|| "none".to_string(), |p| p.count.to_string())
                }),
            )
    }

    async fn post_maybe(body: &'static str) -> Response {
        let req = Request::builder()
            .method("POST")
            .uri("/maybe")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        app().oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Correlation-ID", uuid.to_string())
            .body(())
            .expect("Valid request");

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let assigned = Uuid::new_v4();
        let mut req = Request::builder()
            .header("X-Correlation-ID", Uuid::new_v4().to_string())
            .body(())
            .expect("Valid request");
        req.extensions_mut().insert(CorrelationId(assigned));

        let (mut parts, ()) = req.into_parts();
        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .expect("Should extract");
        assert_eq!(correlation_id.0, assigned);
    }

    #[tokio::test]
    async fn test_bad_path_is_json_error() {
        let req = Request::builder()
            .uri("/items/not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_wrong_json_shape_is_validation_error() {
        let req = Request::builder()
            .method("POST")
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count":"many"}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_optional_json_accepts_missing_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/maybe")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"none");
    }

    #[tokio::test]
    async fn test_optional_json_still_rejects_bad_bodies() {
        assert_eq!(post_maybe(r#"{"count": 3}"#).await.status(), StatusCode::OK);

        let malformed = post_maybe("{").await;
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(malformed).await["code"], "BAD_REQUEST");

        let wrong_shape = post_maybe(r#"{"count":"many"}"#).await;
        assert_eq!(wrong_shape.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
