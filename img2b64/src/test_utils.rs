//! Test helpers for building an in-process server.

use axum_test::TestServer;

use crate::config::Config;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

pub fn create_test_app(config: Config) -> TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}
