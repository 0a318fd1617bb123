/// Runtime configuration assembled from environment variables (`.env` is loaded in `main`)
use std::env;

const DAY_SECONDS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub cors_origins: Vec<String>,
    /// Upper bound for a single multipart file, in bytes
    pub max_upload_size: usize,
    pub auth: AuthConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry: i64,
    pub refresh_token_secret: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: var_or("SERVER_HOST", "127.0.0.1"),
            port: parse_or("SERVER_PORT", 8000),
            mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
            database_name: var_or("DATABASE_NAME", "videotube"),
            cors_origins: split_origins(&var_or("CORS_ALLOWED_ORIGINS", "http://localhost:5173")),
            max_upload_size: parse_or("MAX_UPLOAD_SIZE", 200 * 1024 * 1024),
            auth: AuthConfig {
                access_token_secret: var_or("ACCESS_TOKEN_SECRET", "access-secret"),
                access_token_expiry: parse_or("ACCESS_TOKEN_EXPIRY", DAY_SECONDS),
                refresh_token_secret: var_or("REFRESH_TOKEN_SECRET", "refresh-secret"),
                refresh_token_expiry: parse_or("REFRESH_TOKEN_EXPIRY", 10 * DAY_SECONDS),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: var_or("CLOUDINARY_CLOUD_NAME", ""),
                api_key: var_or("CLOUDINARY_API_KEY", ""),
                api_secret: var_or("CLOUDINARY_API_SECRET", ""),
                api_base: var_or("CLOUDINARY_API_BASE", "https://api.cloudinary.com/v1_1"),
            },
        }
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.cors_origins.iter().any(|o| o == origin)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma separated origin list, dropping blanks
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
