use std::{env, time::Duration};

use log::*;

const DEFAULT_RDS_HOST: &str = "127.0.0.1";
const DEFAULT_RDS_PORT: u16 = 8080;
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MATCH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the coordinate batch is flushed to storage.
    pub flush_interval: Duration,
    /// How often a matching pass runs.
    pub match_interval: Duration,
    /// Seed value for the payment gateway URL. `POST /api/initialize` overrides it at runtime.
    pub payment_gateway_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RDS_HOST.to_string(),
            port: DEFAULT_RDS_PORT,
            database_url: String::default(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            match_interval: DEFAULT_MATCH_INTERVAL,
            payment_gateway_url: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("RDS_HOST").ok().unwrap_or_else(|| DEFAULT_RDS_HOST.into());
        let port = env::var("RDS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for RDS_PORT. {e} Using the default, {DEFAULT_RDS_PORT}, instead."
                    );
                    DEFAULT_RDS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_RDS_PORT);
        let database_url = env::var("RDS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ RDS_DATABASE_URL is not set. Please set it to the URL for the dispatch database.");
            String::default()
        });
        let flush_interval = interval_from_env("RDS_FLUSH_INTERVAL_MS", DEFAULT_FLUSH_INTERVAL);
        let match_interval = interval_from_env("RDS_MATCH_INTERVAL_MS", DEFAULT_MATCH_INTERVAL);
        let payment_gateway_url = env::var("RDS_PAYMENT_GATEWAY_URL").ok().filter(|s| !s.is_empty());
        if payment_gateway_url.is_none() {
            info!(
                "🪛️ RDS_PAYMENT_GATEWAY_URL is not set. The gateway URL must be supplied via POST /api/initialize \
                 before rides can be completed."
            );
        }
        Self { host, port, database_url, flush_interval, match_interval, payment_gateway_url }
    }
}

fn interval_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .map_err(|_| info!("🪛️ {var} is not set. Using the default value of {} ms.", default.as_millis()))
        .and_then(|s| {
            s.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| warn!("🪛️ Invalid configuration value for {var}. {e}"))
        })
        .ok()
        .unwrap_or(default)
}
