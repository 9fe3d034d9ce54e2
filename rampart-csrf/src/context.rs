//! Per-request CSRF state and the accessors templates use.

use crate::config::DEFAULT_FIELD_NAME;
use rampart_core::HttpRequest;

/// CSRF state carried in [`HttpRequest::extensions`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfContext {
    /// Validation is skipped for this request
    pub skip: bool,
    /// Masked token to embed in rendered pages
    pub token: Option<String>,
    /// Form field name to render the token under
    pub field_name: String,
}

impl CsrfContext {
    pub fn get(req: &HttpRequest) -> Option<&CsrfContext> {
        req.extensions.get::<CsrfContext>()
    }

    pub fn update<F: FnOnce(&mut CsrfContext)>(req: &mut HttpRequest, f: F) {
        req.extensions.update::<CsrfContext, _>(f);
    }
}

/// Opt the request out of CSRF validation
pub fn skip_check(req: &mut HttpRequest) {
    CsrfContext::update(req, |ctx| ctx.skip = true);
}

pub fn is_skipped(req: &HttpRequest) -> bool {
    CsrfContext::get(req).is_some_and(|ctx| ctx.skip)
}

/// The masked token for this request, or an empty string
pub fn current_token(req: &HttpRequest) -> String {
    CsrfContext::get(req)
        .and_then(|ctx| ctx.token.clone())
        .unwrap_or_default()
}

/// Hidden form input carrying the masked token
pub fn template_field(req: &HttpRequest) -> String {
    let name = CsrfContext::get(req)
        .map(|ctx| ctx.field_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FIELD_NAME);
    let token = current_token(req);

    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        html_escape::encode_double_quoted_attribute(name),
        html_escape::encode_double_quoted_attribute(&token)
    )
}
