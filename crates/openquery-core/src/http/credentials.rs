//! Credential injection
//!
//! Security requirements are alternatives: the first one whose schemes all
//! have credentials in the `DynamicParamsConfig` is applied. An empty
//! requirement (`{}`) means the operation may be called anonymously.

use super::request::RequestParts;
use crate::config::DynamicParamsConfig;
use crate::error::{EngineError, EngineResult};
use crate::spec::{Document, SecurityRequirement, SecurityScheme};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Where an API key is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// Injects one scheme's credential into the outgoing request parts
pub trait AuthInjector: Send + Sync {
    fn inject_auth(&self, parts: &mut RequestParts) -> EngineResult<()>;
}

/// API Key authentication injector
pub struct ApiKeyInjector {
    pub name: String,
    pub location: ApiKeyLocation,
    pub value: String,
}

impl AuthInjector for ApiKeyInjector {
    fn inject_auth(&self, parts: &mut RequestParts) -> EngineResult<()> {
        match self.location {
            ApiKeyLocation::Header => parts.set_secret_header(&self.name, &self.value),
            ApiKeyLocation::Query => parts.add_secret_query(&self.name, &self.value),
            ApiKeyLocation::Cookie => parts.add_secret_cookie(&self.name, &self.value),
        }
        Ok(())
    }
}

/// Basic Auth injector: `Authorization: Basic base64(username:password)`
pub struct BasicAuthInjector {
    pub username: String,
    pub password: String,
}

impl AuthInjector for BasicAuthInjector {
    fn inject_auth(&self, parts: &mut RequestParts) -> EngineResult<()> {
        let credentials = format!("{}:{}", self.username, self.password);
        let encoded = STANDARD.encode(credentials.as_bytes());
        parts.set_secret_header("Authorization", &format!("Basic {}", encoded));
        Ok(())
    }
}

/// Bearer token injector, also used for oauth2 and openIdConnect access tokens
pub struct BearerInjector {
    pub token: String,
}

impl AuthInjector for BearerInjector {
    fn inject_auth(&self, parts: &mut RequestParts) -> EngineResult<()> {
        parts.set_secret_header("Authorization", &format!("Bearer {}", self.token));
        Ok(())
    }
}

/// Create the injector for a declared scheme
///
/// Returns `Ok(None)` when the credential is absent or empty, and a parse
/// error when the scheme itself cannot be applied.
pub fn create_auth_injector(
    scheme_name: &str,
    scheme: &SecurityScheme,
    params: &DynamicParamsConfig,
) -> EngineResult<Option<Box<dyn AuthInjector>>> {
    let location = format!("security scheme {}", scheme_name);

    let injector: Option<Box<dyn AuthInjector>> = match scheme.scheme_type.as_str() {
        "apiKey" => {
            let name = scheme
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| EngineError::parse_at(&location, "apiKey scheme has no name"))?;
            let key_location = match scheme.location.as_deref() {
                Some("header") => ApiKeyLocation::Header,
                Some("query") => ApiKeyLocation::Query,
                Some("cookie") => ApiKeyLocation::Cookie,
                other => {
                    return Err(EngineError::parse_at(
                        &location,
                        format!("unsupported apiKey location {:?}", other.unwrap_or("")),
                    ))
                }
            };
            params.credential(scheme_name, "value").map(|value| {
                Box::new(ApiKeyInjector {
                    name,
                    location: key_location,
                    value: value.to_string(),
                }) as Box<dyn AuthInjector>
            })
        }
        "http" => match scheme
            .scheme
            .as_deref()
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("basic") => basic_injector(scheme_name, params),
            Some("bearer") => bearer_injector(scheme_name, params),
            other => {
                return Err(EngineError::parse_at(
                    &location,
                    format!("unsupported http auth scheme {:?}", other.unwrap_or("")),
                ))
            }
        },
        // Swagger 2 spelling
        "basic" => basic_injector(scheme_name, params),
        "oauth2" | "openIdConnect" => bearer_injector(scheme_name, params),
        other => {
            return Err(EngineError::parse_at(
                &location,
                format!("unsupported security scheme type '{}'", other),
            ))
        }
    };

    Ok(injector)
}

fn basic_injector(scheme_name: &str, params: &DynamicParamsConfig) -> Option<Box<dyn AuthInjector>> {
    let username = params.credential(scheme_name, "username")?;
    let password = params.credential(scheme_name, "password")?;
    Some(Box::new(BasicAuthInjector {
        username: username.to_string(),
        password: password.to_string(),
    }))
}

fn bearer_injector(scheme_name: &str, params: &DynamicParamsConfig) -> Option<Box<dyn AuthInjector>> {
    params.credential(scheme_name, "value").map(|token| {
        Box::new(BearerInjector {
            token: token.to_string(),
        }) as Box<dyn AuthInjector>
    })
}

/// Pick the first satisfiable requirement and return its injectors
///
/// An alternative naming an undeclared or unsupported scheme is skipped like
/// one whose credential is missing. When nothing is satisfiable the error
/// names the first scheme that could not be applied.
pub fn select_credentials(
    document: &Document,
    requirements: &[SecurityRequirement],
    params: &DynamicParamsConfig,
) -> EngineResult<Vec<Box<dyn AuthInjector>>> {
    if requirements.is_empty() {
        return Ok(Vec::new());
    }

    let mut first_failure: Option<EngineError> = None;

    'alternatives: for requirement in requirements {
        let mut injectors = Vec::with_capacity(requirement.len());
        for scheme_name in requirement.keys() {
            let Some(scheme) = document.security_scheme(scheme_name) else {
                first_failure.get_or_insert_with(|| {
                    EngineError::config(format!("undeclared security scheme '{}'", scheme_name))
                });
                continue 'alternatives;
            };
            match create_auth_injector(scheme_name, scheme, params) {
                Ok(Some(injector)) => injectors.push(injector),
                Ok(None) => {
                    first_failure
                        .get_or_insert_with(|| EngineError::missing_credential(scheme_name));
                    continue 'alternatives;
                }
                Err(e) => {
                    debug!(scheme = %scheme_name, error = %e, "skipping security alternative");
                    first_failure.get_or_insert_with(|| match e {
                        EngineError::ParseError { message, .. } => EngineError::config(message),
                        other => other,
                    });
                    continue 'alternatives;
                }
            }
        }

        debug!(
            schemes = ?requirement.keys().collect::<Vec<_>>(),
            "selected security requirement"
        );
        return Ok(injectors);
    }

    Err(first_failure.unwrap_or_else(|| EngineError::missing_credential("unknown")))
}
