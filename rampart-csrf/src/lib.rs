//! CSRF protection for Rampart
//!
//! Double-submit cookie protection with BREACH-resistant masked tokens:
//!
//! - A 32-byte real token lives only in a signed (optionally encrypted) cookie
//! - Pages and API clients receive a masked token, `mask ‖ (real XOR mask)`,
//!   freshly masked on every request
//! - Unsafe requests must echo a masked token via header, URL-encoded form or
//!   multipart form; over TLS the `Referer` must also be same-origin
//!
//! ## Example
//!
//! ```no_run
//! use rampart_core::{HttpRequest, HttpResponse, MiddlewareChain, handler};
//! use rampart_csrf::{CsrfConfig, CsrfMiddleware, template_field};
//!
//! # async fn run() -> Result<(), rampart_core::Error> {
//! let config = CsrfConfig::new(CsrfConfig::generate_secret());
//! let chain = MiddlewareChain::new().with(CsrfMiddleware::new(config));
//!
//! let response = chain
//!     .apply(
//!         HttpRequest::new("GET", "/form"),
//!         handler(|req: HttpRequest| async move {
//!             Ok(HttpResponse::ok().with_body(format!("<form>{}</form>", template_field(&req))))
//!         }),
//!     )
//!     .await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod origin;
pub mod protection;
pub mod source;
pub mod token;

pub use codec::{SecureCookieCodec, TokenCodec};
pub use config::{CsrfConfig, DEFAULT_FIELD_NAME, parse_same_site};
pub use context::{CsrfContext, current_token, is_skipped, skip_check, template_field};
pub use error::{CsrfError, Result};
pub use middleware::{CsrfMiddleware, CsrfSkipCheck};
pub use origin::verify_referer;
pub use protection::{CsrfCheck, CsrfOutcome, CsrfProtection, CsrfProtectionBuilder, is_safe_method};
pub use source::{TokenLocation, TokenSource};
pub use token::{
    OsRngGenerator, RealToken, TOKEN_LENGTH, TokenGenerator, generate_token, mask_token,
    unmask_token,
};
