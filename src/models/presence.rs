use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live availability of a room member.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Busy,
}

/// Where a member's cursor sits. Canvas clients report pixel coordinates,
/// editor clients report a file position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum CursorPosition {
    Point { x: f64, y: f64 },
    Text { file: String, line: u32, column: u32 },
}

/// One room member's live state, as sent inside room snapshots.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub user_id: String,
    pub display_name: String,
    pub color: String,
    pub status: PresenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    pub last_seen: DateTime<Utc>,
}

/// Partial update merged into an existing PresenceRecord.
/// Absent fields leave the current value untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresencePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PresenceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
}

/// Palette used for member colors, mirrored by the web client.
const MEMBER_COLORS: [&str; 8] = [
    "#e06c75", "#61afef", "#98c379", "#c678dd",
    "#d19a66", "#56b6c2", "#be5046", "#e5c07b",
];

/// Pick a stable color for a user. The same user id always maps to the same
/// palette entry so reconnects keep their color.
pub fn color_for_user(user_id: &str) -> String {
    let sum: u64 = user_id.bytes().map(u64::from).sum();
    MEMBER_COLORS[(sum % MEMBER_COLORS.len() as u64) as usize].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_stable_per_user() {
        assert_eq!(color_for_user("u-42"), color_for_user("u-42"));
    }

    #[test]
    fn cursor_deserializes_both_shapes() {
        let point: CursorPosition = serde_json::from_str(r#"{"x":10.0,"y":20.0}"#).unwrap();
        assert_eq!(point, CursorPosition::Point { x: 10.0, y: 20.0 });

        let text: CursorPosition =
            serde_json::from_str(r#"{"file":"guide.md","line":3,"column":7}"#).unwrap();
        assert!(matches!(text, CursorPosition::Text { ref file, .. } if file == "guide.md"));
    }
}
