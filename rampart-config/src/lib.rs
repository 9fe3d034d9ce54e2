// Configuration management for Rampart

pub mod env;
pub mod error;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Main configuration manager
///
/// Values loaded from the environment are stored as strings; the typed
/// getters accept either a native JSON value or its string spelling.
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.extend_strings(loader.load()?);
        Ok(())
    }

    /// Load configuration from an explicit variable set, as if it were the environment
    pub fn load_vars<I>(&self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.extend_strings(loader.load_from(vars));
    }

    /// Load a `.env` file into the process environment, then load the environment.
    ///
    /// Without a path, a missing `.env` in the working directory is not an error.
    pub fn load_dotenv(&self, path: Option<&str>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    fn extend_strings(&self, values: HashMap<String, String>) {
        let mut config = self.config.write();
        for (key, value) in values {
            config.insert(key, Value::String(value));
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.write().insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.raw(key)?;

        serde_json::from_value(value)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get a string value; numbers and booleans are rendered as text
    pub fn get_string(&self, key: &str) -> Result<String> {
        match self.raw(key)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(ConfigError::ParseError {
                key: key.to_string(),
                message: format!("expected a string, found {}", other),
            }),
        }
    }

    /// Get an integer value
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.raw(key)? {
            Value::Number(n) => n.as_i64().ok_or_else(|| ConfigError::ParseError {
                key: key.to_string(),
                message: format!("{} is not an integer", n),
            }),
            Value::String(s) => s.trim().parse().map_err(|e| ConfigError::ParseError {
                key: key.to_string(),
                message: format!("{}", e),
            }),
            other => Err(ConfigError::ParseError {
                key: key.to_string(),
                message: format!("expected an integer, found {}", other),
            }),
        }
    }

    /// Get a boolean value; accepts `true`/`false`/`1`/`0`/`yes`/`no`
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.raw(key)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::ParseError {
                    key: key.to_string(),
                    message: format!("'{}' is not a boolean", s),
                }),
            },
            other => Err(ConfigError::ParseError {
                key: key.to_string(),
                message: format!("expected a boolean, found {}", other),
            }),
        }
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(key)
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        self.config.read().keys().cloned().collect()
    }

    fn raw(&self, key: &str) -> Result<Value> {
        self.config
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let manager = ConfigManager::new();
        manager.set("test_key", "test_value").unwrap();

        let value: String = manager.get("test_key").unwrap();
        assert_eq!(value, "test_value");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: String = manager.get_or("missing_key", "default_value".to_string());
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_has_key() {
        let manager = ConfigManager::new();
        manager.set("existing_key", "value").unwrap();

        assert!(manager.has("existing_key"));
        assert!(!manager.has("missing_key"));
    }

    #[test]
    fn test_type_conversions() {
        let manager = ConfigManager::new();

        manager.set("string_key", "hello").unwrap();
        manager.set("int_key", 42i64).unwrap();
        manager.set("bool_key", true).unwrap();

        assert_eq!(manager.get_string("string_key").unwrap(), "hello");
        assert_eq!(manager.get_int("int_key").unwrap(), 42);
        assert!(manager.get_bool("bool_key").unwrap());
    }

    #[test]
    fn test_string_valued_env_conversions() {
        let manager = ConfigManager::new();
        manager.load_vars(vec![
            ("HTTP_CSRF_COOKIE_MAX_AGE".to_string(), "3600".to_string()),
            ("HTTP_CSRF_COOKIE_SECURE".to_string(), "1".to_string()),
            ("HTTP_CSRF_COOKIE_HTTP_ONLY".to_string(), "false".to_string()),
            ("HTTP_CSRF_FIELD_NAME".to_string(), "token".to_string()),
        ]);

        assert_eq!(manager.get_int("http_csrf_cookie_max_age").unwrap(), 3600);
        assert!(manager.get_bool("http_csrf_cookie_secure").unwrap());
        assert!(!manager.get_bool("http_csrf_cookie_http_only").unwrap());
        assert!(manager.get_bool("http_csrf_field_name").is_err());
        assert!(manager.get_int("http_csrf_field_name").is_err());
    }

    #[test]
    fn test_missing_key_error() {
        let manager = ConfigManager::new();
        assert!(matches!(
            manager.get_string("absent"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_redis_selector_and_auth_are_independent_keys() {
        let manager = ConfigManager::new();
        manager.load_vars(vec![
            ("HTTP_SESSION_REDIS_DB".to_string(), "2".to_string()),
            ("HTTP_SESSION_REDIS_AUTH".to_string(), "hunter2".to_string()),
        ]);

        assert_eq!(manager.get_int("http_session_redis_db").unwrap(), 2);
        assert_eq!(
            manager.get_string("http_session_redis_auth").unwrap(),
            "hunter2"
        );
    }

    #[test]
    fn test_prefixed_vars() {
        let manager = ConfigManager::with_prefix("MYAPP");
        manager.load_vars(vec![
            ("MYAPP_HTTP_CSRF_SECRET".to_string(), "abc".to_string()),
            ("HTTP_CSRF_SECRET".to_string(), "ignored".to_string()),
        ]);

        assert_eq!(manager.get_string("http_csrf_secret").unwrap(), "abc");
        assert_eq!(manager.keys().len(), 1);
    }
}
