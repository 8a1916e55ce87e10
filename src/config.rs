use std::env;

pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_AVATAR: &str = "/images/default-avatar.png";

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub upload_max_bytes: usize,
    pub default_avatar: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            upload_max_bytes: env::var("UPLOAD_MAX_BYTES")
                .map(|v| v.parse().expect("UPLOAD_MAX_BYTES must be a number"))
                .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES),
            default_avatar: env::var("DEFAULT_AVATAR")
                .unwrap_or_else(|_| DEFAULT_AVATAR.to_string()),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
