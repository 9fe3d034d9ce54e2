//! The per-request CSRF decision procedure.

use crate::codec::{SecureCookieCodec, TokenCodec};
use crate::config::CsrfConfig;
use crate::context::CsrfContext;
use crate::error::{CsrfError, Result};
use crate::origin::verify_referer;
use crate::source::TokenSource;
use crate::token::{OsRngGenerator, RealToken, TokenGenerator, generate_token, mask_token, unmask_token};
use cookie::time::Duration;
use rampart_core::{Cookie, HttpRequest};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Whether `method` is safe (GET, HEAD, OPTIONS, TRACE)
///
/// Method names are case-sensitive, so `get` is not safe.
pub fn is_safe_method(method: &str) -> bool {
    http::Method::from_bytes(method.as_bytes())
        .map(|m| m.is_safe())
        .unwrap_or(false)
}

/// Whether `path` equals `prefix` or lies below it on a segment boundary
fn path_is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// Why a request was allowed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfCheck {
    /// Opted out by `SkipCheck`, the API-only header or an excluded path
    Skipped,
    /// Safe method; a token was issued but nothing validated
    SafeMethod,
    /// Submitted token matched the cookie token
    Verified,
}

/// Result of [`CsrfProtection::protect`]
///
/// `cookie` is the freshly issued token cookie, present whenever a new real
/// token was generated, including on rejection.
#[derive(Debug, Clone)]
pub enum CsrfOutcome {
    Pass {
        check: CsrfCheck,
        cookie: Option<Cookie<'static>>,
    },
    Reject {
        reason: CsrfError,
        cookie: Option<Cookie<'static>>,
    },
}

impl CsrfOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CsrfOutcome::Pass { .. })
    }

    pub fn cookie(&self) -> Option<&Cookie<'static>> {
        match self {
            CsrfOutcome::Pass { cookie, .. } | CsrfOutcome::Reject { cookie, .. } => {
                cookie.as_ref()
            }
        }
    }

    pub fn reason(&self) -> Option<&CsrfError> {
        match self {
            CsrfOutcome::Reject { reason, .. } => Some(reason),
            CsrfOutcome::Pass { .. } => None,
        }
    }
}

/// CSRF orchestrator
///
/// Shared read-only between concurrent requests; all per-request state lives in
/// the request's [`CsrfContext`].
#[derive(Clone)]
pub struct CsrfProtection {
    config: Arc<CsrfConfig>,
    field_name: String,
    source: TokenSource,
    generator: Arc<dyn TokenGenerator>,
    codec: Arc<dyn TokenCodec>,
}

impl CsrfProtection {
    /// Protection with the OS random generator and the signed cookie codec
    pub fn new(config: CsrfConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: CsrfConfig) -> CsrfProtectionBuilder {
        CsrfProtectionBuilder {
            config,
            generator: None,
            codec: None,
        }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// The lower-cased field name used for extraction and rendering
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Run the CSRF check for one request.
    ///
    /// Records the skip flag, masked token and field name in the request's
    /// [`CsrfContext`] for downstream handlers.
    pub fn protect(&self, req: &mut HttpRequest) -> CsrfOutcome {
        if self.should_skip(req) {
            CsrfContext::update(req, |ctx| {
                ctx.skip = true;
                ctx.field_name = self.field_name.clone();
            });
            debug!(method = %req.method, path = %req.path, "CSRF check skipped");
            return CsrfOutcome::Pass {
                check: CsrfCheck::Skipped,
                cookie: None,
            };
        }

        let (real, cookie) = match self.resolve_real_token(req) {
            Ok(resolved) => resolved,
            Err(reason) => return self.reject(req, reason, None),
        };

        let masked = match mask_token(&real, self.generator.as_ref()) {
            Ok(masked) => masked,
            Err(reason) => {
                error!(error = %reason, "CSRF token masking failed");
                return self.reject(req, reason, cookie);
            }
        };

        CsrfContext::update(req, |ctx| {
            ctx.token = Some(masked);
            ctx.field_name = self.field_name.clone();
        });

        if is_safe_method(&req.method) {
            return CsrfOutcome::Pass {
                check: CsrfCheck::SafeMethod,
                cookie,
            };
        }

        match self.verify(req, &real) {
            Ok(()) => CsrfOutcome::Pass {
                check: CsrfCheck::Verified,
                cookie,
            },
            Err(reason) => self.reject(req, reason, cookie),
        }
    }

    fn should_skip(&self, req: &HttpRequest) -> bool {
        if crate::context::is_skipped(req) {
            return true;
        }

        let api_only = self
            .config
            .api_only_header
            .as_deref()
            .and_then(|name| req.header(name))
            .is_some_and(|value| value == "true" || value == "1");

        api_only
            || self
                .config
                .exclude_paths
                .iter()
                .any(|prefix| !prefix.is_empty() && path_is_under(&req.path, prefix))
    }

    /// The cookie's real token, or a newly generated one with the cookie to issue
    fn resolve_real_token(
        &self,
        req: &HttpRequest,
    ) -> Result<(RealToken, Option<Cookie<'static>>)> {
        let name = &self.config.cookie_name;

        if let Some(value) = req.cookie(name) {
            match self.codec.decode(name, &value) {
                Ok(token) if token.has_valid_length() => return Ok((token, None)),
                Ok(token) => {
                    debug!(length = token.len(), "CSRF cookie token has wrong length, replacing");
                }
                Err(e) if e.is_configuration() => {
                    error!(error = %e, "CSRF cookie codec is misconfigured");
                    return Err(e);
                }
                Err(e) => debug!(error = %e, "CSRF cookie rejected, replacing"),
            }
        }

        let token = generate_token(self.generator.as_ref()).inspect_err(|e| {
            error!(error = %e, "CSRF token generation failed");
        })?;
        let encoded = self.codec.encode(name, &token).inspect_err(|e| {
            error!(error = %e, "CSRF cookie encoding failed");
        })?;

        debug!(cookie = %name, "Issued new CSRF token");
        Ok((token, Some(self.token_cookie(encoded))))
    }

    fn verify(&self, req: &HttpRequest, real: &RealToken) -> Result<()> {
        if req.is_tls() {
            verify_referer(req)?;
        }

        let (location, submitted) = self.source.resolve(req)?;
        let submitted = unmask_token(&submitted)?;

        if real.ct_eq(&submitted) {
            debug!(source = %location, path = %req.path, "CSRF token verified");
            Ok(())
        } else {
            Err(CsrfError::BadToken)
        }
    }

    fn reject(
        &self,
        req: &HttpRequest,
        reason: CsrfError,
        cookie: Option<Cookie<'static>>,
    ) -> CsrfOutcome {
        warn!(
            method = %req.method,
            path = %req.path,
            reason = %reason,
            "CSRF check failed"
        );
        CsrfOutcome::Reject { reason, cookie }
    }

    /// Build the token cookie with the configured attributes
    pub fn token_cookie(&self, value: String) -> Cookie<'static> {
        let config = &self.config;
        let mut cookie = Cookie::build((config.cookie_name.clone(), value))
            .path(config.cookie_path.clone())
            .secure(config.cookie_secure)
            .http_only(config.cookie_http_only)
            .same_site(config.cookie_same_site);

        if let Some(domain) = &config.cookie_domain {
            cookie = cookie.domain(domain.clone());
        }
        if config.cookie_max_age > 0 {
            cookie = cookie.max_age(Duration::seconds(config.cookie_max_age));
        }

        cookie.build()
    }
}

/// Builder for [`CsrfProtection`] with injectable generator and codec
pub struct CsrfProtectionBuilder {
    config: CsrfConfig,
    generator: Option<Arc<dyn TokenGenerator>>,
    codec: Option<Arc<dyn TokenCodec>>,
}

impl CsrfProtectionBuilder {
    pub fn generator<G: TokenGenerator + 'static>(mut self, generator: G) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn codec<C: TokenCodec + 'static>(mut self, codec: C) -> Self {
        self.codec = Some(Arc::new(codec));
        self
    }

    pub fn build(self) -> CsrfProtection {
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(SecureCookieCodec::from_config(&self.config)));
        let generator = self.generator.unwrap_or_else(|| Arc::new(OsRngGenerator));
        let field_name = self.config.effective_field_name();
        let source = TokenSource::new(self.config.header_name.clone(), field_name.clone());

        CsrfProtection {
            config: Arc::new(self.config),
            field_name,
            source,
            generator,
            codec,
        }
    }
}
