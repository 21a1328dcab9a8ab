pub mod api;
pub mod auth_middleware;
