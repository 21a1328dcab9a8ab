use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::presence::{CursorPosition, PresencePatch, PresenceRecord, PresenceStatus};

/// A comment as relayed to room members. Durable storage belongs to the app
/// service; this service only stamps and broadcasts it.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<CursorPosition>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Analysis,
    Diagram,
}

/// Progress of an asynchronous backend job, relayed unmodified to the room.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: String,
    pub job_type: JobType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub terminal: bool,
}

/// Response for a relayed progress event
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ProgressAccepted {
    pub delivered: u32,
}

/// Messages a client may send over the live connection.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join-room", rename_all = "camelCase")]
    JoinRoom { room_key: String },
    #[serde(rename = "leave-room", rename_all = "camelCase")]
    LeaveRoom { room_key: String },
    #[serde(rename = "status-update", rename_all = "camelCase")]
    StatusUpdate { status: PresenceStatus },
    #[serde(rename = "cursor-move", rename_all = "camelCase")]
    CursorMove {
        room_key: String,
        cursor: CursorPosition,
    },
    #[serde(rename = "submit-comment", rename_all = "camelCase")]
    SubmitComment {
        room_key: String,
        content: String,
        #[serde(default)]
        target: Option<CursorPosition>,
    },
}

/// Messages the server pushes to clients.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "room-snapshot")]
    RoomSnapshot { members: Vec<PresenceRecord> },
    #[serde(rename = "user-joined", rename_all = "camelCase")]
    UserJoined {
        user_id: String,
        display_name: String,
        color: String,
    },
    #[serde(rename = "user-left", rename_all = "camelCase")]
    UserLeft { user_id: String },
    #[serde(rename = "presence-update", rename_all = "camelCase")]
    PresenceUpdate {
        user_id: String,
        partial_state: PresencePatch,
    },
    #[serde(rename = "comment-broadcast")]
    CommentBroadcast(CommentEvent),
    #[serde(rename = "progress-update")]
    ProgressUpdate(ProgressEvent),
    #[serde(rename = "auth-error")]
    AuthError { reason: String },
    #[serde(rename = "invalid-input")]
    InvalidInput { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_parses_join_room() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join-room","roomKey":"proj-1"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom { ref room_key } if room_key == "proj-1"));
    }

    #[test]
    fn client_message_parses_cursor_move() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"cursor-move","roomKey":"proj-1","cursor":{"x":10.0,"y":20.0}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::CursorMove { room_key, cursor } => {
                assert_eq!(room_key, "proj-1");
                assert_eq!(cursor, CursorPosition::Point { x: 10.0, y: 20.0 });
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn server_message_tags_user_left() {
        let json = serde_json::to_string(&ServerMessage::UserLeft {
            user_id: "u-1".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"user-left","userId":"u-1"}"#);
    }

    #[test]
    fn progress_event_terminal_defaults_to_false() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"jobId":"j-1","jobType":"analysis","percent":40}"#).unwrap();
        assert!(!event.terminal);
        assert_eq!(event.job_type, JobType::Analysis);
    }
}
