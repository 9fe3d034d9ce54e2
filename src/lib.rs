// Rampart - HTTP middleware toolkit
//
// This library bundles the request/response surface, the middleware chain and
// the optional configuration and CSRF protection crates.

// Re-export core functionality
pub use rampart_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use rampart_config;

#[cfg(feature = "csrf")]
pub use rampart_csrf;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Error, ErrorList, Extensions, HttpRequest, HttpResponse, Middleware, MiddlewareChain,
        Next,
    };

    #[cfg(feature = "csrf")]
    pub use rampart_csrf::{
        CsrfConfig, CsrfError, CsrfMiddleware, CsrfProtection, CsrfSkipCheck, current_token,
        template_field,
    };

    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
