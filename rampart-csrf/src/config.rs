use rampart_config::{ConfigError, ConfigManager};
use rampart_core::SameSite;

/// Form field used when none is configured
pub const DEFAULT_FIELD_NAME: &str = "authenticity_token";

/// CSRF protection configuration
#[derive(Debug, Clone)]
pub struct CsrfConfig {
    /// Key used to sign the token cookie. Empty means not configured.
    pub secret: Vec<u8>,

    /// Cookie name for the signed token
    pub cookie_name: String,

    /// Cookie domain
    pub cookie_domain: Option<String>,

    /// Cookie path
    pub cookie_path: String,

    /// Cookie secure flag (HTTPS only)
    pub cookie_secure: bool,

    /// Cookie HttpOnly flag
    pub cookie_http_only: bool,

    /// Cookie lifetime in seconds; 0 issues a session cookie that never expires in the codec
    pub cookie_max_age: i64,

    /// Cookie SameSite policy
    pub cookie_same_site: SameSite,

    /// Form field carrying the masked token
    pub field_name: String,

    /// Header carrying the masked token
    pub header_name: String,

    /// Optional AES-256 key (32 bytes) used to encrypt the cookie payload
    pub encryption_key: Option<Vec<u8>>,

    /// Header that marks a request as API-only; `"true"` or `"1"` skips the check
    pub api_only_header: Option<String>,

    /// Path prefixes excluded from protection
    pub exclude_paths: Vec<String>,
}

impl CsrfConfig {
    /// Create a configuration signing cookies with `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: "_csrf_token".to_string(),
            cookie_domain: None,
            cookie_path: "/".to_string(),
            cookie_secure: false,
            cookie_http_only: true,
            cookie_max_age: 0,
            cookie_same_site: SameSite::Strict,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            header_name: "X-CSRF-Token".to_string(),
            encryption_key: None,
            api_only_header: Some("X-API-Only".to_string()),
            exclude_paths: Vec::new(),
        }
    }

    /// Read the `http_csrf_*` keys from a configuration manager.
    ///
    /// Missing keys fall back to their defaults; a present key with a value
    /// of the wrong type is an error.
    pub fn from_config(config: &ConfigManager) -> rampart_config::Result<Self> {
        let mut csrf = Self::new(string_or(config, "http_csrf_secret", ""))
            .with_cookie_domain(string_or(config, "http_csrf_cookie_domain", "localhost"));

        csrf.cookie_name = string_or(config, "http_csrf_cookie_name", &csrf.cookie_name);
        csrf.cookie_path = string_or(config, "http_csrf_cookie_path", &csrf.cookie_path);
        csrf.field_name = string_or(config, "http_csrf_field_name", &csrf.field_name);
        csrf.header_name = string_or(config, "http_csrf_request_header", &csrf.header_name);

        if let Some(secure) = optional(config.get_bool("http_csrf_cookie_secure"))? {
            csrf.cookie_secure = secure;
        }
        if let Some(http_only) = optional(config.get_bool("http_csrf_cookie_http_only"))? {
            csrf.cookie_http_only = http_only;
        }
        if let Some(max_age) = optional(config.get_int("http_csrf_cookie_max_age"))? {
            csrf.cookie_max_age = max_age;
        }

        if let Some(same_site) = optional(config.get_string("http_csrf_cookie_same_site"))? {
            csrf.cookie_same_site =
                parse_same_site(&same_site).ok_or_else(|| ConfigError::ParseError {
                    key: "http_csrf_cookie_same_site".to_string(),
                    message: format!("'{}' is not one of strict, lax, none", same_site),
                })?;
        }

        if let Some(key) = optional(config.get_string("http_csrf_encryption_key"))? {
            csrf.encryption_key = (!key.is_empty()).then(|| key.into_bytes());
        }

        if let Some(header) = optional(config.get_string("http_csrf_api_only_header"))? {
            csrf.api_only_header = (!header.trim().is_empty()).then(|| header.trim().to_string());
        }

        if let Some(paths) = optional(config.get_string("http_csrf_exclude_paths"))? {
            csrf.exclude_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(csrf)
    }

    /// Generate a random 32-byte secret
    pub fn generate_secret() -> Vec<u8> {
        use rand::RngCore;
        let mut secret = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        secret
    }

    /// The field name used for extraction and rendering
    pub fn effective_field_name(&self) -> String {
        let name = self.field_name.trim().to_lowercase();
        if name.is_empty() {
            DEFAULT_FIELD_NAME.to_string()
        } else {
            name
        }
    }

    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.cookie_domain = (!domain.is_empty()).then_some(domain);
        self
    }

    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set the cookie lifetime in seconds
    pub fn with_cookie_max_age(mut self, seconds: i64) -> Self {
        self.cookie_max_age = seconds;
        self
    }

    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Encrypt the cookie payload with AES-256-GCM under `key`
    pub fn with_encryption_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    /// Set or clear the API-only header
    pub fn with_api_only_header(mut self, header: Option<String>) -> Self {
        self.api_only_header = header;
        self
    }

    pub fn with_exclude_paths(mut self, paths: Vec<String>) -> Self {
        self.exclude_paths = paths;
        self
    }
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Parse a SameSite policy name, case-insensitively
pub fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

fn string_or(config: &ConfigManager, key: &str, default: &str) -> String {
    config
        .get_string(key)
        .unwrap_or_else(|_| default.to_string())
}

fn optional<T>(result: rampart_config::Result<T>) -> rampart_config::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::KeyNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
