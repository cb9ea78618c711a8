use std::env;

use anyhow::Context;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
}

#[derive(Debug, serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

impl Settings {
    /// Reads `RENDEZVOUS_HOST` and `RENDEZVOUS_PORT`, falling back to
    /// `127.0.0.1:8888`. A `.env` file is honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(
            env::var("RENDEZVOUS_HOST").ok(),
            env::var("RENDEZVOUS_PORT").ok(),
        )
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> anyhow::Result<Self> {
        let mut application = ApplicationSettings::default();
        if let Some(host) = host {
            application.host = host;
        }
        if let Some(port) = port {
            application.port = port
                .parse()
                .with_context(|| format!("RENDEZVOUS_PORT is not a port number: {port}"))?;
        }
        Ok(Self { application })
    }
}
