//! URL building utilities for action requests

use crate::error::{EngineError, EngineResult};
use url::Url;

/// URL builder that handles path expansion, joining and query encoding
pub struct UrlBuilder;

impl UrlBuilder {
    /// Append an expanded path to the base URL, keeping the base path
    ///
    /// Examples:
    /// - `join("https://h.example.com/api/v1", "/users")` -> `https://h.example.com/api/v1/users`
    /// - `join("https://h.example.com/api/v1/", "users")` -> `https://h.example.com/api/v1/users`
    /// - `join("https://h.example.com", "")` -> `https://h.example.com/`
    pub fn join(base_url: &str, path: &str) -> EngineResult<Url> {
        let base = base_url.trim().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        };

        Url::parse(&joined).map_err(|e| {
            EngineError::config(format!("Invalid server URL '{}': {}", base_url, e))
        })
    }

    /// Join base URL with path and append query pairs in order
    pub fn join_with_query(
        base_url: &str,
        path: &str,
        query: &[(String, String)],
    ) -> EngineResult<Url> {
        let mut url = Self::join(base_url, path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Validate that a server URL is an absolute http(s) URL
    pub fn validate(url: &str) -> EngineResult<()> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| EngineError::config(format!("Invalid server URL '{}': {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(EngineError::config(format!(
                "Unsupported server URL scheme '{}'",
                other
            ))),
        }
    }

    /// Substitute `{name}` placeholders with percent-encoded values
    ///
    /// An unterminated `{` is kept literally.
    pub fn expand_path<F>(template: &str, mut lookup: F) -> EngineResult<String>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut expanded = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            let name = &after[..end];
            let value = lookup(name).ok_or_else(|| EngineError::missing_parameter(name))?;

            expanded.push_str(&rest[..start]);
            expanded.push_str(&urlencoding::encode(&value));
            rest = &after[end + 1..];
        }

        expanded.push_str(rest);
        Ok(expanded)
    }
}
