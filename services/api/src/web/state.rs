//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use crate::config::Config;
use satyashodh_core::{ports::DatabaseService, FlowService};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Capacity of the history change channel. Slow subscribers skip to the latest snapshot.
const HISTORY_EVENTS_CAPACITY: usize = 64;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub flows: FlowService,
    /// Carries the id of a user whose history just gained a record.
    pub history_events: broadcast::Sender<Uuid>,
    /// Cancelled when the server begins shutting down; ends open history streams.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        flows: FlowService,
        shutdown: CancellationToken,
    ) -> Self {
        let (history_events, _) = broadcast::channel(HISTORY_EVENTS_CAPACITY);
        Self {
            db,
            config,
            flows,
            history_events,
            shutdown,
        }
    }
}
