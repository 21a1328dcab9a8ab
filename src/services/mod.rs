pub mod auth_service;
pub mod comment_service;
pub mod progress_service;
