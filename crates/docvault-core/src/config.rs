//! Configuration module
//!
//! Environment-derived configuration for the vault: database connection,
//! bucket credentials/endpoint, and the optional SSE-C customer key.

use std::env;

use crate::ssec::CustomerKey;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Object storage configuration
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    /// Base64-encoded 256-bit customer encryption key. When set, every object
    /// read/write carries SSE-C parameters derived from it.
    pub sse_customer_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = Config {
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            s3_bucket: env::var("S3_BUCKET").map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?,
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            s3_access_key_id: env::var("S3_ACCESS_KEY_ID")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .ok()
                .filter(|s| !s.is_empty()),
            s3_secret_access_key: env::var("S3_SECRET_ACCESS_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .ok()
                .filter(|s| !s.is_empty()),
            sse_customer_key: env::var("S3_SSE_CUSTOMER_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.s3_region.is_none() {
            return Err(anyhow::anyhow!("S3_REGION or AWS_REGION must be set"));
        }

        if self.is_production()
            && (self.s3_access_key_id.is_none() || self.s3_secret_access_key.is_none())
        {
            return Err(anyhow::anyhow!(
                "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set in production"
            ));
        }

        // An unparseable customer key must abort startup, never fall back to
        // unencrypted writes.
        if let Some(encoded) = &self.sse_customer_key {
            CustomerKey::from_base64(encoded)
                .map_err(|e| anyhow::anyhow!("S3_SSE_CUSTOMER_KEY is invalid: {}", e))?;
        }

        Ok(())
    }

    /// The SSE-C key material derived from configuration, if any.
    pub fn customer_key(&self) -> Result<Option<CustomerKey>, anyhow::Error> {
        match &self.sse_customer_key {
            Some(encoded) => Ok(Some(
                CustomerKey::from_base64(encoded)
                    .map_err(|e| anyhow::anyhow!("S3_SSE_CUSTOMER_KEY is invalid: {}", e))?,
            )),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            environment: "development".to_string(),
            database_url: "postgresql://localhost/docvault".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            s3_bucket: "vault-test".to_string(),
            s3_region: Some("us-east-1".to_string()),
            s3_endpoint: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            sse_customer_key: None,
        }
    }

    #[test]
    fn validate_accepts_minimal_development_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_postgres_url() {
        let mut config = base_config();
        config.database_url = "mysql://localhost/docvault".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_region() {
        let mut config = base_config();
        config.s3_region = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_requires_static_credentials() {
        let mut config = base_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.s3_access_key_id = Some("AKIA123".to_string());
        config.s3_secret_access_key = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_customer_key() {
        let mut config = base_config();
        config.sse_customer_key = Some("not!!valid@@base64".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("S3_SSE_CUSTOMER_KEY"));
    }
}
