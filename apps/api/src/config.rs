use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Interpreter used to run the analysis scripts (`python` by default).
    pub analysis_interpreter: String,
    pub timeline_script: String,
    pub plan_script: String,
    /// Base URL of the resume extraction service.
    pub resume_service_url: String,
    /// Resume archive. `None` unless every S3 variable is set.
    pub archive: Option<ArchiveConfig>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            analysis_interpreter: env_or("ANALYSIS_INTERPRETER", "python"),
            timeline_script: env_or("TIMELINE_SCRIPT", "utils/gemini_timeline.py"),
            plan_script: env_or("PLAN_SCRIPT", "utils/gemini_plan.py"),
            resume_service_url: env_or("RESUME_SERVICE_URL", "http://127.0.0.1:5000"),
            archive: ArchiveConfig::from_env(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

impl ArchiveConfig {
    fn from_env() -> Option<Self> {
        Some(ArchiveConfig {
            s3_bucket: std::env::var("S3_BUCKET").ok()?,
            s3_endpoint: std::env::var("S3_ENDPOINT").ok()?,
            aws_access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok()?,
            aws_secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok()?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
