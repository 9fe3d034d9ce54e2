//! Form processing and multipart support

use crate::Error;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Parse URL-encoded form data into a HashMap
///
/// When a field repeats, the first occurrence wins.
pub fn parse_form_map(body: &[u8]) -> Result<HashMap<String, String>, Error> {
    let form_data: Vec<(String, String)> = parse_form(body)?;

    let mut map = HashMap::with_capacity(form_data.len());
    for (key, value) in form_data {
        map.entry(key).or_insert(value);
    }
    Ok(map)
}

/// Multipart form field
#[derive(Debug, Clone)]
pub struct FormField {
    /// Field name
    pub name: String,

    /// Field value (for text fields)
    pub value: Option<String>,

    /// Original filename (for file fields)
    pub filename: Option<String>,

    /// Declared content type of the part
    pub content_type: Option<String>,
}

impl FormField {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Multipart form data parser
pub struct MultipartParser {
    boundary: String,
}

impl MultipartParser {
    /// Create a new multipart parser from Content-Type header
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        // Example: "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW"
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                let part = part.trim();
                let (key, value) = part.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("boundary")
                    .then(|| value.trim().trim_matches('"').to_string())
            })
            .filter(|boundary| !boundary.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Ok(Self { boundary })
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parse multipart form data
    pub fn parse(&self, body: &[u8]) -> Result<Vec<FormField>, Error> {
        let mut fields = Vec::new();
        let boundary_marker = format!("--{}", self.boundary);
        let body_str = String::from_utf8_lossy(body);

        for part in body_str.split(&boundary_marker).skip(1) {
            // The closing delimiter is the boundary followed by "--"
            if part.starts_with("--") || part.trim().is_empty() {
                continue;
            }

            if let Some(field) = self.parse_part(part)? {
                fields.push(field);
            }
        }

        Ok(fields)
    }

    /// Parse a single multipart part
    fn parse_part(&self, part: &str) -> Result<Option<FormField>, Error> {
        // Drop the line break that follows the boundary line
        let part = part
            .strip_prefix("\r\n")
            .or_else(|| part.strip_prefix('\n'))
            .unwrap_or(part);

        let (head, content) = match part.split_once("\r\n\r\n") {
            Some(split) => split,
            None => match part.split_once("\n\n") {
                Some(split) => split,
                None => return Ok(None),
            },
        };

        let mut name = None;
        let mut filename = None;
        let mut content_type = None;

        for line in head.lines() {
            let Some((header, value)) = line.split_once(':') else {
                continue;
            };

            if header.trim().eq_ignore_ascii_case("content-disposition") {
                for attr in value.split(';') {
                    let Some((key, val)) = attr.trim().split_once('=') else {
                        continue;
                    };
                    let val = val.trim().trim_matches('"').to_string();
                    match key.trim().to_ascii_lowercase().as_str() {
                        "name" => name = Some(val),
                        "filename" => filename = Some(val),
                        _ => {}
                    }
                }
            } else if header.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }

        // Unnamed parts carry no addressable field
        let Some(name) = name else {
            return Ok(None);
        };

        // The line break before the next boundary belongs to the delimiter
        let content = content
            .strip_suffix("\r\n")
            .or_else(|| content.strip_suffix('\n'))
            .unwrap_or(content);

        Ok(Some(FormField {
            name,
            value: if filename.is_some() {
                None
            } else {
                Some(content.to_string())
            },
            filename,
            content_type,
        }))
    }

    /// Convert parsed text fields to a HashMap; the first occurrence of a name wins
    pub fn to_map(fields: Vec<FormField>) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for field in fields {
            if let Some(value) = field.value {
                map.entry(field.name).or_insert(value);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

    fn multipart_body() -> String {
        format!(
            "--{b}\r\n\
             Content-Disposition: form-data; name=\"title\"\r\n\
             \r\n\
             Hello world\r\n\
             --{b}\r\n\
             content-disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             file body\r\n\
             --{b}\r\n\
             Content-Disposition: form-data; name=\"authenticity_token\"\r\n\
             \r\n\
             abc+/=\r\n\
             --{b}--\r\n",
            b = BOUNDARY
        )
    }

    #[test]
    fn test_parse_form_map() {
        let body = b"name=John+Doe&email=john%40example.com&age=30";
        let form = parse_form_map(body).unwrap();

        assert_eq!(form.get("name"), Some(&"John Doe".to_string()));
        assert_eq!(form.get("email"), Some(&"john@example.com".to_string()));
        assert_eq!(form.get("age"), Some(&"30".to_string()));
    }

    #[test]
    fn test_parse_form_map_first_value_wins() {
        let form = parse_form_map(b"token=first&token=second").unwrap();
        assert_eq!(form.get("token"), Some(&"first".to_string()));
    }

    #[test]
    fn test_multipart_parser_from_content_type() {
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        let parser = MultipartParser::from_content_type(&content_type).unwrap();

        assert_eq!(parser.boundary(), BOUNDARY);
    }

    #[test]
    fn test_multipart_parser_quoted_boundary() {
        let parser =
            MultipartParser::from_content_type("multipart/form-data; boundary=\"abc\"").unwrap();
        assert_eq!(parser.boundary(), "abc");
    }

    #[test]
    fn test_multipart_parser_missing_boundary() {
        let result = MultipartParser::from_content_type("multipart/form-data");
        assert!(result.is_err());
    }

    #[test]
    fn test_multipart_parse_fields() {
        let parser =
            MultipartParser::from_content_type(&format!("multipart/form-data; boundary={}", BOUNDARY))
                .unwrap();
        let fields = parser.parse(multipart_body().as_bytes()).unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "title");
        assert_eq!(fields[0].value.as_deref(), Some("Hello world"));
        assert!(fields[1].is_file());
        assert_eq!(fields[1].filename.as_deref(), Some("notes.txt"));
        assert_eq!(fields[1].content_type.as_deref(), Some("text/plain"));

        let map = MultipartParser::to_map(fields);
        assert_eq!(map.get("authenticity_token"), Some(&"abc+/=".to_string()));
        assert!(!map.contains_key("upload"));
    }

    #[test]
    fn test_multipart_accepts_bare_newlines() {
        let body = "--xyz\nContent-Disposition: form-data; name=\"a\"\n\n1\n--xyz--\n";
        let parser = MultipartParser::from_content_type("multipart/form-data; boundary=xyz").unwrap();
        let map = MultipartParser::to_map(parser.parse(body.as_bytes()).unwrap());

        assert_eq!(map.get("a"), Some(&"1".to_string()));
    }

    #[test]
    fn test_multipart_skips_unnamed_part() {
        let body = "--xyz\r\n\
                    Content-Disposition: form-data\r\n\
                    \r\n\
                    orphan\r\n\
                    --xyz\r\n\
                    Content-Disposition: form-data; name=\"a\"\r\n\
                    \r\n\
                    1\r\n\
                    --xyz--\r\n";
        let parser = MultipartParser::from_content_type("multipart/form-data; boundary=xyz").unwrap();
        let fields = parser.parse(body.as_bytes()).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].value.as_deref(), Some("1"));
    }
}
