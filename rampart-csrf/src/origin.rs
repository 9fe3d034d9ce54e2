//! Same-origin check of the `Referer` header for requests over TLS.

use crate::error::{CsrfError, Result};
use rampart_core::HttpRequest;
use url::Url;

/// Verify that the request's `Referer` is an https URL on the request's own host
pub fn verify_referer(req: &HttpRequest) -> Result<()> {
    let referer = req
        .header("Referer")
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(CsrfError::NoReferer)?;

    let referer = Url::parse(referer).map_err(|_| CsrfError::BadReferer)?;
    if referer.scheme() != "https" {
        return Err(CsrfError::BadReferer);
    }

    let host = req.host().ok_or(CsrfError::BadReferer)?;
    let own = Url::parse(&format!("https://{}", host.trim())).map_err(|_| CsrfError::BadReferer)?;

    if same_authority(&referer, &own) {
        Ok(())
    } else {
        Err(CsrfError::BadReferer)
    }
}

fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}
