use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    /// Optional path to a JSON achievement catalog; the built-in catalog is
    /// used when unset.
    pub catalog_path: Option<String>,
    /// Directory for daily-rolling file logs; stdout only when unset.
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "sqlite://progress.db".to_string());

        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .filter(|value| !value.is_empty());

        let log_dir = std::env::var("LOG_DIR")
            .ok()
            .filter(|value| !value.is_empty());

        Self {
            host,
            port,
            log_level,
            database_url,
            catalog_path,
            log_dir,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
