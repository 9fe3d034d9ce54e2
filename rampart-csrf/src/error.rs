use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrfError {
    #[error("the CSRF secret is not configured")]
    SecretMissing,

    #[error("invalid CSRF key: {0}")]
    InvalidKey(String),

    #[error("the CSRF token is missing")]
    NoToken,

    #[error("CSRF token generation failed: {0}")]
    Generation(String),

    #[error("the request referer is missing")]
    NoReferer,

    #[error("the request referer is invalid")]
    BadReferer,

    #[error("the CSRF token is invalid")]
    BadToken,

    #[error("CSRF cookie could not be decoded: {0}")]
    Codec(String),
}

impl CsrfError {
    /// Errors after which the request cannot safely hold a token at all
    pub fn is_no_token_class(&self) -> bool {
        matches!(self, CsrfError::NoToken | CsrfError::Generation(_))
    }

    /// Errors caused by server configuration rather than by the client
    pub fn is_configuration(&self) -> bool {
        matches!(self, CsrfError::SecretMissing | CsrfError::InvalidKey(_))
    }
}

impl From<CsrfError> for rampart_core::Error {
    fn from(err: CsrfError) -> Self {
        rampart_core::Error::Forbidden(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CsrfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(CsrfError::NoReferer.to_string(), "the request referer is missing");
        assert_eq!(CsrfError::BadReferer.to_string(), "the request referer is invalid");
        assert_eq!(CsrfError::NoToken.to_string(), "the CSRF token is missing");
        assert_eq!(CsrfError::BadToken.to_string(), "the CSRF token is invalid");
    }

    #[test]
    fn test_classes() {
        assert!(CsrfError::Generation("entropy".into()).is_no_token_class());
        assert!(CsrfError::NoToken.is_no_token_class());
        assert!(!CsrfError::BadToken.is_no_token_class());
        assert!(CsrfError::SecretMissing.is_configuration());
    }

    #[test]
    fn test_converts_to_forbidden() {
        let err: rampart_core::Error = CsrfError::BadToken.into();
        assert_eq!(err.status_code(), 403);
    }
}
