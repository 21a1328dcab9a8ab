pub mod broadcast;
pub mod handler;
pub mod msg_comment_handler;
pub mod msg_presence_handler;
pub mod msg_room_handler;
pub mod presence;
pub mod rooms;
pub mod state;
pub mod userctx;
