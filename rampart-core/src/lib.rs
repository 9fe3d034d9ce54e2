//! # Rampart Core
//!
//! The request/response surface that Rampart middleware is mounted on.
//!
//! - [`HttpRequest`] / [`HttpResponse`] wrappers with cookie helpers
//! - [`Extensions`] for typed, request-scoped state
//! - [`ErrorList`] for errors attached while a response is produced
//! - [`Middleware`] and [`MiddlewareChain`] for ordered request processing
//! - [`form`] parsing for URL-encoded and multipart bodies
//! - [`logging`] initialisation on top of `tracing`

pub mod error;
pub mod error_list;
pub mod extensions;
pub mod form;
pub mod http;
pub mod logging;
pub mod middleware;

pub use cookie::{Cookie, SameSite};
pub use error::Error;
pub use error_list::ErrorList;
pub use extensions::Extensions;
pub use form::{FormField, MultipartParser, parse_form_map};
pub use http::{HttpRequest, HttpResponse};
pub use middleware::{HandlerFn, Middleware, MiddlewareChain, Next, handler};
