// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub admin_username: String,
    pub admin_password: String,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://proctor.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(28800);

        // Trimmed so trailing whitespace in .env files does not break admin login
        let admin_username = env::var("ADMIN_USERNAME")
            .expect("ADMIN_USERNAME must be set")
            .trim()
            .to_string();

        let admin_password = env::var("ADMIN_PASSWORD")
            .expect("ADMIN_PASSWORD must be set")
            .trim()
            .to_string();

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            admin_username,
            admin_password,
            rust_log,
            port,
        }
    }
}
