//! Extraction of the submitted masked token from a request.

use crate::error::{CsrfError, Result};
use rampart_core::{HttpRequest, MultipartParser, parse_form_map};
use std::fmt;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Where a submitted token was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLocation {
    Header,
    Form,
    Multipart,
}

impl fmt::Display for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenLocation::Header => "header",
            TokenLocation::Form => "form",
            TokenLocation::Multipart => "multipart",
        })
    }
}

/// Resolves the submitted token from the header, then the URL-encoded form,
/// then the multipart form. The first non-empty value wins.
#[derive(Debug, Clone)]
pub struct TokenSource {
    header_name: String,
    field_name: String,
}

impl TokenSource {
    pub fn new(header_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn resolve(&self, req: &HttpRequest) -> Result<(TokenLocation, String)> {
        if let Some(token) = non_empty(req.header(&self.header_name).map(String::from)) {
            return Ok((TokenLocation::Header, token));
        }

        if let Some(token) = self.from_form(req) {
            return Ok((TokenLocation::Form, token));
        }

        if let Some(token) = self.from_multipart(req) {
            return Ok((TokenLocation::Multipart, token));
        }

        Err(CsrfError::NoToken)
    }

    fn from_form(&self, req: &HttpRequest) -> Option<String> {
        if req.content_type().as_deref() != Some(FORM_URLENCODED) {
            return None;
        }
        let mut form = parse_form_map(&req.body).ok()?;
        non_empty(form.remove(&self.field_name))
    }

    fn from_multipart(&self, req: &HttpRequest) -> Option<String> {
        if req.content_type().as_deref() != Some(MULTIPART_FORM_DATA) {
            return None;
        }
        let parser = MultipartParser::from_content_type(req.header("Content-Type")?).ok()?;
        let mut fields = MultipartParser::to_map(parser.parse(&req.body).ok()?);
        non_empty(fields.remove(&self.field_name))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> TokenSource {
        TokenSource::new("X-CSRF-Token", "authenticity_token")
    }

    fn multipart(token: &str) -> HttpRequest {
        let body = format!(
            "--XyZ\r\nContent-Disposition: form-data; name=\"authenticity_token\"\r\n\r\n{}\r\n--XyZ--\r\n",
            token
        );
        HttpRequest::new("POST", "/")
            .with_header("Content-Type", "multipart/form-data; boundary=XyZ")
            .with_body(body)
    }

    #[test]
    fn test_header_source() {
        let req = HttpRequest::new("POST", "/").with_header("x-csrf-token", "abc");
        assert_eq!(
            source().resolve(&req).unwrap(),
            (TokenLocation::Header, "abc".to_string())
        );
    }

    #[test]
    fn test_form_source() {
        let req = HttpRequest::new("POST", "/")
            .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
            .with_body("name=a&authenticity_token=ab%2Bc%3D");
        assert_eq!(
            source().resolve(&req).unwrap(),
            (TokenLocation::Form, "ab+c=".to_string())
        );
    }

    #[test]
    fn test_multipart_source() {
        assert_eq!(
            source().resolve(&multipart("q+w/e=")).unwrap(),
            (TokenLocation::Multipart, "q+w/e=".to_string())
        );
    }

    #[test]
    fn test_multipart_source_after_unnamed_part() {
        let body = "--XyZ\r\nContent-Disposition: form-data\r\n\r\nstray\r\n\
                    --XyZ\r\nContent-Disposition: form-data; name=\"authenticity_token\"\r\n\r\nq+w/e=\r\n\
                    --XyZ--\r\n";
        let req = HttpRequest::new("POST", "/")
            .with_header("Content-Type", "multipart/form-data; boundary=XyZ")
            .with_body(body);

        assert_eq!(
            source().resolve(&req).unwrap(),
            (TokenLocation::Multipart, "q+w/e=".to_string())
        );
    }

    #[test]
    fn test_header_takes_precedence() {
        let req = multipart("from-body").with_header("X-CSRF-Token", "from-header");
        assert_eq!(source().resolve(&req).unwrap().0, TokenLocation::Header);
    }

    #[test]
    fn test_empty_header_falls_through() {
        let req = multipart("from-body").with_header("X-CSRF-Token", "");
        assert_eq!(source().resolve(&req).unwrap().0, TokenLocation::Multipart);
    }

    #[test]
    fn test_no_token() {
        assert_eq!(
            source().resolve(&HttpRequest::new("POST", "/")),
            Err(CsrfError::NoToken)
        );

        // Form fields are only read from a matching content type
        let req = HttpRequest::new("POST", "/")
            .with_header("Content-Type", "application/json")
            .with_body("authenticity_token=abc");
        assert_eq!(source().resolve(&req), Err(CsrfError::NoToken));

        let req = HttpRequest::new("POST", "/")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body("authenticity_token=");
        assert_eq!(source().resolve(&req), Err(CsrfError::NoToken));
    }
}
