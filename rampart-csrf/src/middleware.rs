use crate::config::CsrfConfig;
use crate::context::skip_check;
use crate::protection::{CsrfCheck, CsrfOutcome, CsrfProtection};
use async_trait::async_trait;
use rampart_core::{Error, HttpRequest, HttpResponse, Middleware, Next};

/// CSRF protection middleware
///
/// Runs [`CsrfProtection::protect`] and translates the outcome: a pass
/// continues the chain, a rejection ends it with `403 Forbidden` and the
/// [`CsrfError`](crate::CsrfError) recorded in the response's error list.
#[derive(Clone)]
pub struct CsrfMiddleware {
    protection: CsrfProtection,
}

impl CsrfMiddleware {
    pub fn new(config: CsrfConfig) -> Self {
        Self::from_protection(CsrfProtection::new(config))
    }

    /// Wrap a protection built with custom collaborators
    pub fn from_protection(protection: CsrfProtection) -> Self {
        Self { protection }
    }

    pub fn protection(&self) -> &CsrfProtection {
        &self.protection
    }
}

#[async_trait]
impl Middleware for CsrfMiddleware {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        match self.protection.protect(&mut req) {
            CsrfOutcome::Pass { check, cookie } => {
                let mut response = next(req).await?;
                if check != CsrfCheck::Skipped {
                    response.append_header("Vary", "Cookie");
                }
                if let Some(cookie) = cookie {
                    response.add_cookie(cookie);
                }
                Ok(response)
            }
            CsrfOutcome::Reject { reason, cookie } => {
                let mut response = HttpResponse::forbidden();
                response.append_header("Vary", "Cookie");
                if let Some(cookie) = cookie {
                    response.add_cookie(cookie);
                }
                response.errors.push(reason);
                Ok(response)
            }
        }
    }
}

/// Marks every request passing through as exempt from CSRF validation
///
/// Mount it ahead of [`CsrfMiddleware`] on routes that opt out.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfSkipCheck;

#[async_trait]
impl Middleware for CsrfSkipCheck {
    async fn handle(&self, mut req: HttpRequest, next: Next) -> Result<HttpResponse, Error> {
        skip_check(&mut req);
        next(req).await
    }
}
