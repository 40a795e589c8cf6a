use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub judge0_api_url: String,
    pub judge0_api_host: String,
    pub judge0_api_key: String,
    pub default_client_domain: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            judge0_api_url: get_env_or("JUDGE0_API_URL", "https://judge0-ce.p.rapidapi.com"),
            judge0_api_host: get_env_or("JUDGE0_API_HOST", "judge0-ce.p.rapidapi.com"),
            judge0_api_key: get_env_or("JUDGE0_API_KEY", ""),
            default_client_domain: get_env_or("DEFAULT_CLIENT_DOMAIN", "ksrce.ac.in"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
