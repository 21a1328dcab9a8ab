use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::Session;
use crate::ws::presence::PresenceStore;
use crate::ws::rooms::RoomRegistry;

/// Sender half of one connection's outbound channel. Any part of the system
/// can clone this to push frames to that client; the writer task owns the sink.
pub type SessionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;

/// A connected session together with its outbound channel.
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Session,
    pub sender: SessionSender,
}

/// Shared state of the gateway: who is connected, which room they are in,
/// and what their live presence looks like.
///
/// Explicitly constructed and passed around so tests can spin up isolated
/// instances; there is no process-global gateway.
#[derive(Default)]
pub struct GatewayState {
    pub rooms: RwLock<RoomRegistry>,
    pub presence: RwLock<PresenceStore>,
    pub sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl GatewayState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}
