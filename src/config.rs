// config.rs
use std::env;

use crate::errors::{AppError, Result};

pub const DEFAULT_PHONEPE_BASE_URL: &str = "https://api-preprod.phonepe.com/apis/pg-sandbox";

#[derive(Debug, Clone)]
pub struct PhonePeConfig {
    pub merchant_id: String,
    pub salt_key: String,
    pub salt_index: u32,
    pub base_url: String,
    pub redirect_base_url: String,
    pub timeout_secs: u64,
    pub default_amount: i64,
    pub default_user_id: String,
    pub mobile_number: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub phonepe: PhonePeConfig,
    pub jwt_secret: String,
    pub database_url: String,
    pub database_name: String,
    pub port: u16,
    pub host: String,
    pub use_memory_store: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::configuration(format!("{} must be set", key)))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port: u16 = or_default("PORT", "8800")
            .parse()
            .map_err(|_| AppError::configuration("PORT must be a number"))?;

        let use_memory_store = or_default("STORE", "mongo").eq_ignore_ascii_case("memory");

        let database_url = match required("DATABASE_URL").or_else(|_| required("MONGO")) {
            Ok(url) => url,
            Err(_) if use_memory_store => String::new(),
            Err(_) => return Err(AppError::configuration("DATABASE_URL must be set")),
        };

        let salt_index = or_default("PHONEPE_SALT_INDEX", "1")
            .parse()
            .map_err(|_| AppError::configuration("PHONEPE_SALT_INDEX must be a number"))?;

        let timeout_secs = or_default("PHONEPE_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| AppError::configuration("PHONEPE_TIMEOUT_SECS must be a number"))?;

        let default_amount: i64 = or_default("PAYMENT_DEFAULT_AMOUNT", "10000")
            .parse()
            .map_err(|_| AppError::configuration("PAYMENT_DEFAULT_AMOUNT must be a number"))?;
        if default_amount <= 0 {
            return Err(AppError::configuration("PAYMENT_DEFAULT_AMOUNT must be positive"));
        }

        let redirect_base_url = or_default("PHONEPE_REDIRECT_BASE_URL", &format!("http://localhost:{}", port));

        let phonepe = PhonePeConfig {
            merchant_id: required("PHONEPE_MERCHANT_ID")?,
            salt_key: required("PHONEPE_SALT_KEY")?,
            salt_index,
            base_url: or_default("PHONEPE_BASE_URL", DEFAULT_PHONEPE_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            redirect_base_url: redirect_base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            default_amount,
            default_user_id: or_default("PAYMENT_DEFAULT_USER_ID", "123"),
            mobile_number: or_default("PAYMENT_MOBILE_NUMBER", "9999999999"),
        };

        Ok(AppConfig {
            phonepe,
            jwt_secret: required("JWT_SECRET")?,
            database_url,
            database_name: or_default("DATABASE_NAME", "booking"),
            port,
            host: or_default("HOST", "0.0.0.0"),
            use_memory_store,
        })
    }

    pub fn is_sandbox(&self) -> bool {
        self.phonepe.base_url.contains("sandbox") || self.phonepe.base_url.contains("preprod")
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "phonepe_base_url": self.phonepe.base_url,
            "is_sandbox": self.is_sandbox(),
            "merchant_id_set": !self.phonepe.merchant_id.is_empty(),
            "salt_index": self.phonepe.salt_index,
            "redirect_base_url": self.phonepe.redirect_base_url,
            "database_name": self.database_name,
            "memory_store": self.use_memory_store,
            "port": self.port,
            "host": self.host,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("PHONEPE_MERCHANT_ID", "PGTESTPAYUAT"),
            ("PHONEPE_SALT_KEY", "salt"),
            ("JWT_SECRET", "jwt"),
        ]
    }

    #[test]
    fn defaults_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&base_env())).unwrap();

        assert_eq!(config.port, 8800);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.phonepe.salt_index, 1);
        assert_eq!(config.phonepe.base_url, DEFAULT_PHONEPE_BASE_URL);
        assert_eq!(config.phonepe.redirect_base_url, "http://localhost:8800");
        assert_eq!(config.phonepe.default_amount, 10000);
        assert_eq!(config.phonepe.default_user_id, "123");
        assert!(config.is_sandbox());
        assert!(!config.use_memory_store);
    }

    #[test]
    fn secrets_are_required() {
        let env: Vec<_> = base_env()
            .into_iter()
            .filter(|(k, _)| *k != "PHONEPE_SALT_KEY")
            .collect();

        let err = AppConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(err.to_string().contains("PHONEPE_SALT_KEY"));
    }

    #[test]
    fn legacy_mongo_variable_is_accepted() {
        let mut env: Vec<_> = base_env()
            .into_iter()
            .filter(|(k, _)| *k != "DATABASE_URL")
            .collect();
        env.push(("MONGO", "mongodb://db:27017"));

        let config = AppConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.database_url, "mongodb://db:27017");
    }

    #[test]
    fn memory_store_does_not_need_a_database_url() {
        let mut env: Vec<_> = base_env()
            .into_iter()
            .filter(|(k, _)| *k != "DATABASE_URL")
            .collect();
        env.push(("STORE", "memory"));

        let config = AppConfig::from_lookup(lookup_from(&env)).unwrap();
        assert!(config.use_memory_store);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut env = base_env();
        env.push(("PORT", "not-a-port"));
        assert!(AppConfig::from_lookup(lookup_from(&env)).is_err());

        let mut env = base_env();
        env.push(("PAYMENT_DEFAULT_AMOUNT", "0"));
        assert!(AppConfig::from_lookup(lookup_from(&env)).is_err());
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let mut env = base_env();
        env.push(("PHONEPE_BASE_URL", "https://api.phonepe.com/apis/hermes/"));
        env.push(("PHONEPE_REDIRECT_BASE_URL", "https://book.example.com/"));

        let config = AppConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.phonepe.base_url, "https://api.phonepe.com/apis/hermes");
        assert_eq!(config.phonepe.redirect_base_url, "https://book.example.com");
        assert!(!config.is_sandbox());
    }
}
