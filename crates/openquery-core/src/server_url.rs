//! Server URL normalization
//!
//! Users paste instance URLs in every possible shape (`https://host`,
//! `https://host/`, `https://host/api/v1`). The normalizer turns them into the
//! request root for one API version and leaves already-canonical URLs alone.

use serde::{Deserialize, Serialize};

/// Normalize `raw` against a single version suffix such as `api/v1`
pub fn normalize(raw: &str, suffix: &str) -> String {
    ServerUrlNormalizer::new(suffix).normalize(raw)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerUrlNormalizer {
    suffix: String,
    /// Suffixes that already count as canonical (always includes `suffix`)
    accepted: Vec<String>,
}

impl ServerUrlNormalizer {
    pub fn new(suffix: impl AsRef<str>) -> Self {
        let suffix = clean_suffix(suffix.as_ref());
        Self {
            accepted: vec![suffix.clone()],
            suffix,
        }
    }

    /// Normalizer for the version suffix declared by a document's servers
    pub fn for_document(document: &crate::spec::Document) -> Self {
        Self::new(document.version_suffix())
    }

    /// Also leave URLs ending in `suffix` untouched (e.g. `api/v2` next to `api/v1`)
    pub fn accept(mut self, suffix: impl AsRef<str>) -> Self {
        let suffix = clean_suffix(suffix.as_ref());
        if !suffix.is_empty() && !self.accepted.contains(&suffix) {
            self.accepted.push(suffix);
        }
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn normalize(&self, raw: &str) -> String {
        let base = raw.trim().trim_end_matches('/');

        if self.suffix.is_empty() {
            return base.to_string();
        }

        if self
            .accepted
            .iter()
            .any(|accepted| ends_with_segments(base, accepted))
        {
            return base.to_string();
        }

        format!("{}/{}", base, self.suffix)
    }
}

fn clean_suffix(suffix: &str) -> String {
    suffix.trim().trim_matches('/').to_string()
}

/// `https://h/api/v1` ends with `api/v1`, `https://h/xapi/v1` does not
fn ends_with_segments(base: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    base.strip_suffix(suffix)
        .map(|head| head.ends_with('/'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_suffix() {
        assert_eq!(
            normalize("https://host.example.com", "api/v1"),
            "https://host.example.com/api/v1"
        );
        assert_eq!(
            normalize("https://host.example.com/", "api/v1"),
            "https://host.example.com/api/v1"
        );
        assert_eq!(
            normalize("https://host.example.com///", "/api/v1/"),
            "https://host.example.com/api/v1"
        );
    }

    #[test]
    fn test_already_suffixed_unchanged() {
        assert_eq!(
            normalize("https://host.example.com/api/v1", "api/v1"),
            "https://host.example.com/api/v1"
        );
    }

    #[test]
    fn test_partial_segment_is_not_a_match() {
        assert_eq!(
            normalize("https://host.example.com/xapi/v1", "api/v1"),
            "https://host.example.com/xapi/v1/api/v1"
        );
    }

    #[test]
    fn test_accepted_alternates() {
        let normalizer = ServerUrlNormalizer::new("api/v1").accept("api/v2");
        assert_eq!(
            normalizer.normalize("https://n8n.example.com/api/v2"),
            "https://n8n.example.com/api/v2"
        );
        assert_eq!(
            normalizer.normalize("https://n8n.example.com"),
            "https://n8n.example.com/api/v1"
        );
    }

    #[test]
    fn test_empty_suffix_only_trims() {
        assert_eq!(normalize(" https://host/ ", ""), "https://host");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "",
            "/",
            "https://host.example.com",
            "https://host.example.com/",
            "https://host.example.com/api/v1",
            "https://host.example.com/api/v1/",
            "https://host.example.com/base",
            "  https://host.example.com/api  ",
        ];
        for suffix in ["api/v1", "", "v2", "/api/v1/"] {
            for input in inputs {
                let once = normalize(input, suffix);
                assert_eq!(normalize(&once, suffix), once, "input={input:?} suffix={suffix:?}");
            }
        }
    }
}
