//! services/api/src/web/history.rs
//!
//! Read side of the per-user history: a one-shot listing and a live
//! server-sent-events stream that pushes a fresh snapshot whenever a new
//! analysis or summary is saved for the signed-in user.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::Stream;
use satyashodh_core::ports::{DatabaseService, PortResult};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error};
use uuid::Uuid;

use crate::web::protocol::{FraudHistoryItem, HistoryResponse, SummaryHistoryItem};
use crate::web::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Loads both history collections for one user, newest first.
pub async fn load_history(db: &dyn DatabaseService, user_id: Uuid) -> PortResult<HistoryResponse> {
    let (fraud, summaries) = tokio::try_join!(
        db.list_fraud_history(user_id),
        db.list_summary_history(user_id)
    )?;

    let mut fraud_detection: Vec<FraudHistoryItem> = fraud.into_iter().map(Into::into).collect();
    fraud_detection.sort_by(|a, b| b.analysis_timestamp.cmp(&a.analysis_timestamp));
    let mut summaries: Vec<SummaryHistoryItem> = summaries.into_iter().map(Into::into).collect();
    summaries.sort_by(|a, b| b.summary_timestamp.cmp(&a.summary_timestamp));

    Ok(HistoryResponse {
        fraud_detection,
        summaries,
    })
}

/// List the signed-in user's fraud analyses and summaries.
#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Both history collections, newest first", body = HistoryResponse),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "history"
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<HistoryResponse>, (StatusCode, String)> {
    load_history(state.db.as_ref(), user_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(%user_id, "Failed to load history: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history".to_string())
        })
}

/// Stream history snapshots as server-sent events named `history`.
///
/// The first event is the current snapshot; another follows every time a record
/// is saved for this user. The stream ends when the server shuts down.
#[utoipa::path(
    get,
    path = "/history/stream",
    responses(
        (status = 200, description = "An event stream of `HistoryResponse` snapshots", body = String, content_type = "text/event-stream"),
        (status = 401, description = "Not signed in")
    ),
    tag = "history"
)]
pub async fn history_stream_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut changes = state.history_events.subscribe();
    let shutdown = state.shutdown.clone();
    let db = state.db.clone();

    let stream = async_stream::stream! {
        if let Some(event) = snapshot_event(db.as_ref(), user_id).await {
            yield Ok(event);
        }

        loop {
            let changed = tokio::select! {
                _ = shutdown.cancelled() => None,
                changed = changes.recv() => Some(changed),
            };
            match changed {
                None | Some(Err(RecvError::Closed)) => break,
                Some(Ok(id)) if id != user_id => continue,
                Some(Ok(_)) => {}
                Some(Err(RecvError::Lagged(skipped))) => {
                    debug!(%user_id, skipped, "History stream lagged; resending snapshot");
                }
            }
            if let Some(event) = snapshot_event(db.as_ref(), user_id).await {
                yield Ok(event);
            }
        }
        debug!(%user_id, "History stream closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

async fn snapshot_event(db: &dyn DatabaseService, user_id: Uuid) -> Option<Event> {
    let snapshot = match load_history(db, user_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(%user_id, "Failed to load history snapshot: {:?}", e);
            return None;
        }
    };
    match Event::default().event("history").json_data(&snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            error!(%user_id, "Failed to encode history snapshot: {:?}", e);
            None
        }
    }
}
