use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use cnfeed_scraper::{build_dealer_url, render, scrape_listing, OutputFormat, ScraperError};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const BAD_REQUEST_MESSAGE: &str = "pass ?dealer=<slug> or ?url=https://www.coches.net/concesionario/...";
const NO_STORE: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Deserialize)]
pub(super) struct ListingQuery {
    pub dealer: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
    pub download: Option<String>,
    pub pretty: Option<String>,
}

pub(super) async fn get_listing(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListingQuery>,
) -> Result<Response, ApiError> {
    let format = OutputFormat::from_query(query.format.as_deref());
    let download = is_flag_set(query.download.as_deref());
    let pretty = is_flag_set(query.pretty.as_deref());

    let target = build_dealer_url(
        query.dealer.as_deref(),
        query.url.as_deref(),
        &state.base_url,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected listing request");
        ApiError::new(req_id.0.clone(), "BAD_REQUEST", BAD_REQUEST_MESSAGE)
    })?;

    let html = state
        .client
        .fetch_page(&target)
        .await
        .map_err(|e| map_fetch_error(req_id.0.clone(), &target, &e))?;

    let page = scrape_listing(&html, &state.base_url).map_err(|e| {
        tracing::warn!(url = %target, error = %e, "dealer page carried no listing payload");
        ApiError::new(
            req_id.0.clone(),
            "PARSING_ERROR",
            "__INITIAL_PROPS__ not found; unexpected page structure",
        )
    })?;

    let rendered = render(&page, format, &target, Utc::now(), pretty);
    tracing::info!(
        url = %target,
        %format,
        count = page.count(),
        total_results = page.total_results,
        "served dealer listing"
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.content_type),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    if download {
        let disposition = format!("attachment; filename=\"{}\"", rendered.filename);
        let value = HeaderValue::from_str(&disposition).map_err(|e| {
            tracing::error!(error = %e, "invalid content-disposition header");
            ApiError::new(req_id.0.clone(), "INTERNAL_ERROR", e.to_string())
        })?;
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, headers, rendered.body).into_response())
}

fn is_flag_set(raw: Option<&str>) -> bool {
    raw == Some("1")
}

fn map_fetch_error(request_id: String, target: &str, error: &ScraperError) -> ApiError {
    let status = match error {
        ScraperError::UpstreamStatus { status, .. } => Some(*status),
        ScraperError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
        ScraperError::Http(e) => e.status().map(|s| s.as_u16()),
        _ => {
            tracing::error!(error = %error, "unexpected error while fetching dealer page");
            return ApiError::new(request_id, "INTERNAL_ERROR", error.to_string());
        }
    };
    tracing::warn!(url = target, error = %error, "dealer page fetch failed");
    ApiError::new(request_id, "FETCH_FAILED", format!("failed to fetch {target}"))
        .with_upstream_status(status)
}
