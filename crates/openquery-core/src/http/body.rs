//! Request body encoding keyed by the declared media type

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `application/json`, `application/problem+json`, `text/json` ...
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = media_essence(content_type);
    essence == "application/json" || essence.ends_with("+json") || essence.ends_with("/json")
}

/// Lowercased media type without parameters
pub(crate) fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// How a payload value is turned into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEncoding {
    Json,
    Form,
    /// `multipart/form-data` with one text part per field
    Multipart,
    Text,
    /// Any other media type; only strings are accepted and sent verbatim
    Raw,
}

impl BodyEncoding {
    pub fn for_content_type(content_type: &str) -> Self {
        let essence = media_essence(content_type);
        if essence.is_empty() || is_json_content_type(&essence) {
            BodyEncoding::Json
        } else if essence == "application/x-www-form-urlencoded" {
            BodyEncoding::Form
        } else if essence == "multipart/form-data" {
            BodyEncoding::Multipart
        } else if essence.starts_with("text/") {
            BodyEncoding::Text
        } else {
            BodyEncoding::Raw
        }
    }
}

/// Encoded request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestBody {
    /// Encode `value` for `content_type`; an empty content type means JSON
    pub fn encode(content_type: &str, value: &Value) -> EngineResult<Self> {
        let mut content_type = if content_type.trim().is_empty() {
            "application/json".to_string()
        } else {
            content_type.to_string()
        };

        let bytes = match BodyEncoding::for_content_type(&content_type) {
            BodyEncoding::Json => serde_json::to_vec(value)
                .map_err(|e| EngineError::validation(format!("body is not serializable: {}", e)))?,
            BodyEncoding::Form => encode_form(value)?.into_bytes(),
            BodyEncoding::Multipart => {
                let (boundary, bytes) = encode_multipart(value)?;
                content_type = format!("multipart/form-data; boundary={}", boundary);
                bytes
            }
            BodyEncoding::Text => match value {
                Value::Array(_) | Value::Object(_) => {
                    return Err(EngineError::validation(format!(
                        "body for '{}' must be text, not structured data",
                        content_type
                    )))
                }
                other => scalar_to_string(other).into_bytes(),
            },
            BodyEncoding::Raw => match value {
                Value::String(s) => s.clone().into_bytes(),
                _ => {
                    return Err(EngineError::validation(format!(
                        "unsupported body media type '{}'; only string payloads can be sent",
                        content_type
                    )))
                }
            },
        };

        Ok(Self {
            content_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Body as text, when it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Scalar rendering shared by query strings, headers and form fields
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Field pairs of a form payload; arrays repeat their key, nested objects are sent as JSON text
fn form_fields<'a>(value: &'a Value, encoding: &str) -> EngineResult<Vec<(&'a str, String)>> {
    let fields = value.as_object().ok_or_else(|| {
        EngineError::validation(format!("{} body must be an object of fields", encoding))
    })?;

    let mut pairs = Vec::new();
    for (key, field) in fields {
        match field {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.as_str(), scalar_to_string(item)));
                }
            }
            other => pairs.push((key.as_str(), scalar_to_string(other))),
        }
    }
    Ok(pairs)
}

fn encode_form(value: &Value) -> EngineResult<String> {
    Ok(form_fields(value, "form-encoded")?
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

const MULTIPART_BOUNDARY: &str = "openquery-form-boundary";

/// Multipart payload and the boundary it was framed with
///
/// The boundary is fixed so that prepared requests are reproducible; it grows
/// until no field contains it.
fn encode_multipart(value: &Value) -> EngineResult<(String, Vec<u8>)> {
    let pairs = form_fields(value, "multipart")?;

    let mut boundary = MULTIPART_BOUNDARY.to_string();
    while pairs
        .iter()
        .any(|(k, v)| k.contains(&boundary) || v.contains(&boundary))
    {
        boundary.push('x');
    }

    let mut body = String::new();
    for (name, field) in &pairs {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            boundary,
            escape_part_name(name),
            field
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));

    Ok((boundary, body.into_bytes()))
}

fn escape_part_name(name: &str) -> String {
    name.replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/vnd.api+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_encode_json() {
        let body = RequestBody::encode("", &json!({"name": "demo", "active": true})).unwrap();
        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.as_str(), Some(r#"{"name":"demo","active":true}"#));
    }

    #[test]
    fn test_encode_form() {
        let body = RequestBody::encode(
            "application/x-www-form-urlencoded",
            &json!({"q": "a b&c", "tag": ["x", "y"], "skip": null, "n": 3}),
        )
        .unwrap();
        assert_eq!(body.as_str(), Some("q=a%20b%26c&tag=x&tag=y&n=3"));
    }

    #[test]
    fn test_form_requires_object() {
        let err = RequestBody::encode("application/x-www-form-urlencoded", &json!("plain"))
            .unwrap_err();
        assert!(err.to_string().contains("form-encoded"));
    }

    #[test]
    fn test_text_and_raw() {
        let text = RequestBody::encode("text/plain", &json!("hello")).unwrap();
        assert_eq!(text.as_str(), Some("hello"));

        let number = RequestBody::encode("text/plain", &json!(42)).unwrap();
        assert_eq!(number.as_str(), Some("42"));

        let raw = RequestBody::encode("application/octet-stream", &json!("AAEC")).unwrap();
        assert_eq!(raw.as_str(), Some("AAEC"));
        assert_eq!(raw.content_type, "application/octet-stream");
    }

    #[test]
    fn test_structured_payload_for_opaque_media_is_rejected() {
        let err = RequestBody::encode("application/octet-stream", &json!({"a": 1})).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(err.to_string().contains("application/octet-stream"));

        let err = RequestBody::encode("text/plain", &json!(["a"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn test_encode_multipart() {
        assert_eq!(
            BodyEncoding::for_content_type("multipart/form-data"),
            BodyEncoding::Multipart
        );

        let body = RequestBody::encode(
            "multipart/form-data",
            &json!({"name": "doggie", "tags": ["a", "b"], "skip": null}),
        )
        .unwrap();
        assert_eq!(
            body.content_type,
            "multipart/form-data; boundary=openquery-form-boundary"
        );
        assert_eq!(
            body.as_str(),
            Some(concat!(
                "--openquery-form-boundary\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\ndoggie\r\n",
                "--openquery-form-boundary\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\na\r\n",
                "--openquery-form-boundary\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\nb\r\n",
                "--openquery-form-boundary--\r\n"
            ))
        );
    }

    #[test]
    fn test_multipart_boundary_avoids_field_content() {
        let body = RequestBody::encode(
            "multipart/form-data",
            &json!({"note": "--openquery-form-boundary--"}),
        )
        .unwrap();
        assert_eq!(
            body.content_type,
            "multipart/form-data; boundary=openquery-form-boundaryx"
        );
        assert!(body.as_str().unwrap().ends_with("--openquery-form-boundaryx--\r\n"));

        let err = RequestBody::encode("multipart/form-data", &json!("plain")).unwrap_err();
        assert!(err.to_string().contains("multipart"));
    }
}
