use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::ApiError;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-pass gate settings used by middleware.
#[derive(Clone)]
pub struct AccessState {
    pass: Option<Arc<str>>,
}

impl AccessState {
    /// A blank or missing pass disables the gate. Configuration loading
    /// already refuses that outside development.
    #[must_use]
    pub fn new(pass: Option<&str>) -> Self {
        let pass = pass.map(str::trim).filter(|p| !p.is_empty()).map(Arc::from);
        if pass.is_none() {
            tracing::warn!("CNFEED_ACCESS_PASS not set; access gate disabled");
        }
        Self { pass }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.pass.is_some()
    }

    fn allows(&self, candidate: &str) -> bool {
        self.pass
            .as_deref()
            .is_some_and(|pass| bool::from(pass.as_bytes().ct_eq(candidate.as_bytes())))
    }
}

#[derive(Debug, Deserialize)]
struct PassQuery {
    pass: Option<String>,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware admitting requests that present the pass as `?pass=` or as
/// `Authorization: Bearer <pass>`.
pub async fn require_access(
    State(access): State<AccessState>,
    req: Request,
    next: Next,
) -> Response {
    if !access.enabled() {
        return next.run(req).await;
    }

    let from_query = Query::<PassQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.pass);
    let from_header = extract_bearer_token(req.headers().get(AUTHORIZATION));

    let allowed = from_query.as_deref().is_some_and(|p| access.allows(p))
        || from_header.is_some_and(|p| access.allows(p));
    if allowed {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    tracing::debug!(request_id, "rejected request without a valid pass");
    ApiError::new(request_id, "UNAUTHORIZED", "invalid or missing 'pass'").into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
