use std::net::{IpAddr, Ipv4Addr};

use axum::Router;

use languagekids_backend::config::Config;

pub async fn create_test_app() -> Router {
    let config = Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        log_level: "warn".to_string(),
        database_url: "sqlite::memory:".to_string(),
        catalog_path: None,
        log_dir: None,
    };

    languagekids_backend::create_app_with(&config)
        .await
        .expect("test app")
}
