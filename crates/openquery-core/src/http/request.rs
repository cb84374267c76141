//! Request building
//!
//! Turns an action, a data source config and caller values into a fully
//! resolved [`PreparedRequest`]. Building is pure: no I/O happens here, so a
//! validation failure never reaches the network.

use super::body::{scalar_to_string, RequestBody};
use super::credentials::select_credentials;
use super::url_builder::UrlBuilder;
use crate::catalog::{Action, ActionParameter, BodyShape, ParameterLocation};
use crate::config::{DataSourceConfig, ParameterValues};
use crate::error::{EngineError, EngineResult};
use crate::server_url::ServerUrlNormalizer;
use crate::spec::Document;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;
use url::Url;

const REDACTED: &str = "***";

/// Everything needed to run one action
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub document: &'a Document,
    pub action: &'a Action,
    pub config: &'a DataSourceConfig,
    pub parameters: &'a ParameterValues,
}

impl<'a> RunRequest<'a> {
    pub fn new(
        document: &'a Document,
        action: &'a Action,
        config: &'a DataSourceConfig,
        parameters: &'a ParameterValues,
    ) -> Self {
        Self {
            document,
            action,
            config,
            parameters,
        }
    }
}

/// Mutable request pieces collected while building
#[derive(Debug, Default)]
pub struct RequestParts {
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    sensitive_headers: BTreeSet<String>,
    sensitive_query: BTreeSet<String>,
}

impl RequestParts {
    pub fn set_header(&mut self, name: &str, value: &str) {
        // header names are case-insensitive; the last writer keeps its spelling
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    pub fn set_secret_header(&mut self, name: &str, value: &str) {
        self.set_header(name, value);
        self.sensitive_headers.insert(name.to_ascii_lowercase());
    }

    pub fn add_secret_query(&mut self, name: &str, value: &str) {
        self.query.push((name.to_string(), value.to_string()));
        self.sensitive_query.insert(name.to_string());
    }

    pub fn add_secret_cookie(&mut self, name: &str, value: &str) {
        self.cookies.push((name.to_string(), value.to_string()));
        self.sensitive_headers.insert("cookie".to_string());
    }

    pub fn is_sensitive_header(&self, name: &str) -> bool {
        self.sensitive_headers.contains(&name.to_ascii_lowercase())
    }
}

/// Fully resolved HTTP request, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    sensitive_headers: BTreeSet<String>,
    sensitive_query: BTreeSet<String>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Copy with credential headers and query values masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();

        for (name, value) in copy.headers.iter_mut() {
            if self.sensitive_headers.contains(&name.to_ascii_lowercase()) {
                *value = REDACTED.to_string();
            }
        }

        if !self.sensitive_query.is_empty() && self.url.query().is_some() {
            let pairs: Vec<(String, String)> = self
                .url
                .query_pairs()
                .map(|(k, v)| {
                    let value = if self.sensitive_query.contains(k.as_ref()) {
                        REDACTED.to_string()
                    } else {
                        v.into_owned()
                    };
                    (k.into_owned(), value)
                })
                .collect();
            copy.url.query_pairs_mut().clear().extend_pairs(pairs);
        }

        copy
    }

    /// JSON description of the request (method, url, headers, body text)
    pub fn to_value(&self) -> Value {
        let body = self.body.as_ref().map(|b| match b.as_str() {
            Some(text) => json!({"contentType": b.content_type, "text": text}),
            None => json!({"contentType": b.content_type, "length": b.len()}),
        });
        json!({
            "method": self.method.as_str(),
            "url": self.url.as_str(),
            "headers": self.headers,
            "body": body,
        })
    }
}

/// A value counts as supplied when it is neither null nor an empty string
fn supplied<'v>(values: &'v ParameterValues, key: &str) -> Option<&'v Value> {
    values.get(key).filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

/// Builder for action requests
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn build(request: &RunRequest<'_>) -> EngineResult<PreparedRequest> {
        let RunRequest {
            document,
            action,
            config,
            parameters,
        } = *request;

        config.validate()?;
        let base_url = config
            .normalizer
            .clone()
            .unwrap_or_else(|| ServerUrlNormalizer::for_document(document))
            .normalize(&config.server_url);

        let method = Method::from_bytes(action.method.as_bytes()).map_err(|_| {
            EngineError::parse_at(&action.id, format!("invalid HTTP method '{}'", action.method))
        })?;

        let mut parts = RequestParts::default();
        let mut path_values: HashMap<&str, String> = HashMap::new();
        let mut body_fields = Map::new();
        let mut whole_body: Option<Value> = None;

        for parameter in &action.parameters {
            let Some(value) = Self::resolve_value(parameter, parameters)? else {
                continue;
            };

            match parameter.location {
                ParameterLocation::Path => {
                    path_values.insert(parameter.name.as_str(), scalar_to_string(&value));
                }
                ParameterLocation::Query => match &value {
                    Value::Array(items) => {
                        for item in items {
                            parts.query.push((parameter.name.clone(), scalar_to_string(item)));
                        }
                    }
                    other => parts
                        .query
                        .push((parameter.name.clone(), scalar_to_string(other))),
                },
                ParameterLocation::Header => {
                    parts.set_header(&parameter.name, &scalar_to_string(&value))
                }
                ParameterLocation::Cookie => parts
                    .cookies
                    .push((parameter.name.clone(), scalar_to_string(&value))),
                ParameterLocation::Body => match action.request_body.as_ref().map(|b| b.shape) {
                    Some(BodyShape::Whole) => whole_body = Some(value),
                    _ => {
                        body_fields.insert(parameter.name.clone(), value);
                    }
                },
            }
        }

        // placeholders without a declared parameter fall back to a value of the same name
        let path = UrlBuilder::expand_path(&action.path, |name| {
            path_values
                .get(name)
                .cloned()
                .or_else(|| supplied(parameters, name).map(scalar_to_string))
        })?;

        let requirements = action
            .security
            .as_deref()
            .unwrap_or(document.security.as_slice());
        for injector in select_credentials(document, requirements, &config.dynamic_params)? {
            injector.inject_auth(&mut parts)?;
        }

        // values are percent-encoded so that `;` or `,` cannot start another cookie
        if !parts.cookies.is_empty() {
            let cookie = parts
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("; ");
            parts.set_header("Cookie", &cookie);
        }

        let body = match &action.request_body {
            Some(spec) => {
                let payload = match spec.shape {
                    BodyShape::Whole => whole_body,
                    BodyShape::Fields if !body_fields.is_empty() || spec.required => {
                        Some(Value::Object(body_fields))
                    }
                    BodyShape::Fields => None,
                };
                match payload {
                    Some(payload) => Some(RequestBody::encode(&spec.content_type, &payload)?),
                    None if spec.required => {
                        return Err(EngineError::missing_parameter("body"));
                    }
                    None => None,
                }
            }
            None => None,
        };

        Self::validate_headers(&parts.headers)?;

        let url = UrlBuilder::join_with_query(&base_url, &path, &parts.query)?;

        debug!(
            action = %action.id,
            method = %method,
            path = %url.path(),
            query_params = parts.query.len(),
            has_body = body.is_some(),
            "prepared request"
        );

        Ok(PreparedRequest {
            method,
            url,
            headers: parts.headers,
            body,
            sensitive_headers: parts.sensitive_headers,
            sensitive_query: parts.sensitive_query,
        })
    }

    /// Supplied value, else the default for path and required parameters
    fn resolve_value(
        parameter: &ActionParameter,
        values: &ParameterValues,
    ) -> EngineResult<Option<Value>> {
        if let Some(value) = supplied(values, &parameter.key) {
            return Ok(Some(value.clone()));
        }

        let use_default = parameter.required || parameter.location == ParameterLocation::Path;
        match parameter.default.clone().filter(|_| use_default) {
            Some(default) => Ok(Some(default)),
            None if parameter.required => Err(EngineError::missing_parameter(&parameter.key)),
            None => Ok(None),
        }
    }

    fn validate_headers(headers: &BTreeMap<String, String>) -> EngineResult<()> {
        for (name, value) in headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| EngineError::ValidationError {
                parameter: Some(name.clone()),
                message: format!("invalid header name '{}'", name),
            })?;
            HeaderValue::from_str(value).map_err(|_| EngineError::ValidationError {
                parameter: Some(name.clone()),
                message: format!("invalid value for header '{}' (length: {})", name, value.len()),
            })?;
        }
        Ok(())
    }
}
