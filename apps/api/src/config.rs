use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Root directory for the filesystem artifact store. Ignored when the
    /// S3 backend is configured.
    pub artifacts_dir: String,
    /// Blob store settings; the S3 backend is selected when `S3_BUCKET` is
    /// set, otherwise artifacts live on the local filesystem.
    pub s3: Option<S3Config>,
    /// Caller-side timeout for one producer call, in seconds.
    pub producer_timeout_s: u64,
    /// Extra removal verbs appended to the built-in allow-list,
    /// comma-separated. Configuration, not logic.
    pub removal_keywords_extra: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3 = match std::env::var("S3_BUCKET") {
            Ok(bucket) if !bucket.trim().is_empty() => Some(S3Config {
                bucket,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            }),
            _ => None,
        };

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            artifacts_dir: std::env::var("ARTIFACTS_DIR")
                .unwrap_or_else(|_| "./artifacts".to_string()),
            s3,
            producer_timeout_s: std::env::var("PRODUCER_TIMEOUT_S")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("PRODUCER_TIMEOUT_S must be a number of seconds")?,
            removal_keywords_extra: std::env::var("REMOVAL_KEYWORDS_EXTRA")
                .map(|raw| parse_keyword_list(&raw))
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_keyword_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyword_list_trims_and_lowercases() {
        assert_eq!(
            parse_keyword_list(" Erase , scrap ,, STRIKE "),
            vec!["erase", "scrap", "strike"]
        );
        assert!(parse_keyword_list("  ").is_empty());
    }
}
