use std::time::Instant;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::quoting::FetchError;
use crate::relay::Stage;
use crate::resilience::CancelGuard;

/// `GET /cotacao`: fetch, persist, answer `{"bid": "..."}`.
pub async fn get_quote(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Dropped with this future when the caller disconnects.
    let (_caller, signal) = CancelGuard::new();

    let span = tracing::info_span!("quote_request", request_id = %request_id);
    let result = state.responder.respond(signal).instrument(span.clone()).await;

    let response = match result {
        Ok(relayed) => {
            span.in_scope(|| {
                tracing::info!(
                    stage = %Stage::Responded,
                    bid = %relayed.quote.bid(),
                    persisted = relayed.stage == Stage::Persisted,
                    "Quote relayed"
                )
            });
            (StatusCode::OK, Json(relayed.quote)).into_response()
        }
        Err(e) => (
            status_for(&e),
            format!("error when searching for quote: {e}"),
        )
            .into_response(),
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

/// Map a fetch failure to the status the caller sees.
pub fn status_for(error: &FetchError) -> StatusCode {
    match error {
        FetchError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        FetchError::Transport(_) | FetchError::UnexpectedStatus(_) | FetchError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        FetchError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
