use uuid::Uuid;

/// One authenticated, live connection. Created when the token on the upgrade
/// request validates, destroyed on disconnect. Never persisted.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: Uuid,
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub color: String,
}

impl Session {
    pub fn new(user_id: String, display_name: String, avatar_url: Option<String>) -> Self {
        let color = crate::models::presence::color_for_user(&user_id);
        Self {
            id: Uuid::new_v4(),
            user_id,
            display_name,
            avatar_url,
            color,
        }
    }
}
