pub mod app_service_client;
