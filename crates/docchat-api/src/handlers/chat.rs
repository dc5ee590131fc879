use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use docchat_retrieval::StreamFramer;
use futures::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::dto::ChatQuery;
use crate::error::ApiError;
use crate::state::AppState;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Batch answer; pipeline failures still produce a 200 with a degraded answer
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatQuery>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!("chat", %request_id);
    let answer = async {
        tracing::info!(query_len = request.query.len(), "Processing chat request");
        state.pipeline.answer_query(&request.query).await
    }
    .instrument(span)
    .await;

    Ok(([(REQUEST_ID_HEADER, request_id.to_string())], Json(answer)).into_response())
}

/// Streamed answer as newline-delimited JSON frames
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatQuery>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let request_id = Uuid::new_v4();

    tracing::info!(
        %request_id,
        query_len = request.query.len(),
        "Processing streaming chat request"
    );

    let frames = state.pipeline.answer_query_stream(&request.query);
    let lines = StreamFramer::frame_lines(frames).map(Ok::<_, Infallible>);

    Response::builder()
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id.to_string())
        .body(Body::from_stream(lines))
        .map_err(|e| {
            ApiError::internal("Failed to build streaming response").with_details(e.to_string())
        })
}
