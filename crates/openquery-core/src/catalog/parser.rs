// Document parser implementation
// Compiles an OpenAPI document into an action catalog grouped by resource tag

use super::models::*;
use crate::error::{EngineError, EngineResult};
use crate::http::body::{is_json_content_type, media_essence, BodyEncoding};
use crate::spec::{Document, Operation, SecurityRequirement, METHODS};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Limit for `$ref` chains and nested `allOf` compositions
const MAX_REF_DEPTH: usize = 32;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM: &str = "multipart/form-data";

/// Vendor hook producing a label or description for `(METHOD, path, operation)`
///
/// Returning `None` or a blank string falls back to the engine default.
pub type TextResolver = Arc<dyn Fn(&str, &str, &Operation) -> Option<String> + Send + Sync>;

/// Parsing options supplied by a plugin adapter
#[derive(Clone)]
pub struct ParseOptions {
    pub action_label: Option<TextResolver>,
    pub action_description: Option<TextResolver>,
    /// Whether deprecated operations become actions
    pub include_deprecated: bool,
    pub uncategorized_label: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            action_label: None,
            action_description: None,
            include_deprecated: true,
            uncategorized_label: UNCATEGORIZED.to_string(),
        }
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("action_label", &self.action_label.is_some())
            .field("action_description", &self.action_description.is_some())
            .field("include_deprecated", &self.include_deprecated)
            .field("uncategorized_label", &self.uncategorized_label)
            .finish()
    }
}

impl ParseOptions {
    pub fn with_action_label<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str, &str, &Operation) -> Option<String> + Send + Sync + 'static,
    {
        self.action_label = Some(Arc::new(resolver));
        self
    }

    pub fn with_action_description<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&str, &str, &Operation) -> Option<String> + Send + Sync + 'static,
    {
        self.action_description = Some(Arc::new(resolver));
        self
    }

    pub fn skip_deprecated(mut self) -> Self {
        self.include_deprecated = false;
        self
    }
}

/// Compile a document with the given options
pub fn parse(document: &Document, options: &ParseOptions) -> EngineResult<ActionCatalog> {
    DocumentParser::new(options.clone()).parse(document)
}

#[derive(Debug, Deserialize)]
struct ParameterObject {
    name: String,
    #[serde(rename = "in")]
    location: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    schema: Option<Value>,
    /// Resolved parameter object; Swagger 2 keeps `type`, `items` and `enum` inline
    #[serde(skip)]
    raw: Value,
}

/// Parameters of one operation, with Swagger 2 `body`/`formData` entries set aside
#[derive(Debug, Default)]
struct DeclaredParameters {
    parameters: Vec<ActionParameter>,
    body: Vec<ParameterObject>,
    form_data: Vec<ParameterObject>,
}

#[derive(Debug, Deserialize)]
struct RequestBodyObject {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    content: IndexMap<String, MediaTypeObject>,
}

#[derive(Debug, Deserialize)]
struct MediaTypeObject {
    #[serde(default)]
    schema: Option<Value>,
}

/// Object schema after `$ref` and `allOf` resolution
#[derive(Debug, Default)]
struct ObjectShape {
    properties: IndexMap<String, Value>,
    required: Vec<String>,
}

/// Document parser; pure and re-entrant, holds only its options
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    options: ParseOptions,
}

impl DocumentParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Compile every operation of the document; fails as a whole on the first malformed one
    pub fn parse(&self, document: &Document) -> EngineResult<ActionCatalog> {
        let paths = document
            .paths
            .as_ref()
            .ok_or_else(|| EngineError::parse_at("paths", "document declares no paths"))?;
        check_security(document, &document.security, "security")?;

        let mut actions = Vec::new();
        let mut categories: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut seen_ids = HashSet::new();
        let mut deprecated_skipped = 0usize;

        for (path, raw_item) in paths {
            let item = resolve_ref_chain(document, raw_item, path)?
                .as_object()
                .ok_or_else(|| EngineError::parse_at(path.as_str(), "path item is not an object"))?;

            let shared = match item.get("parameters") {
                None => &[][..],
                Some(Value::Array(list)) => list.as_slice(),
                Some(_) => {
                    return Err(EngineError::parse_at(
                        path.as_str(),
                        "path-level parameters must be a list",
                    ))
                }
            };

            for method in METHODS {
                let Some(raw_operation) = item.get(method) else {
                    continue;
                };
                let location = format!("{} {}", method.to_uppercase(), path);
                let operation: Operation = serde_json::from_value(raw_operation.clone())
                    .map_err(|e| {
                        EngineError::parse_at(&location, format!("invalid operation: {}", e))
                    })?;

                if operation.deprecated && !self.options.include_deprecated {
                    deprecated_skipped += 1;
                    continue;
                }

                let action = self.parse_operation(
                    document,
                    path,
                    method,
                    &operation,
                    shared,
                    &location,
                    &mut seen_ids,
                )?;
                categories
                    .entry(action.category.clone())
                    .or_default()
                    .push(action.id.clone());
                actions.push(action);
            }
        }

        debug!(
            actions = actions.len(),
            categories = categories.len(),
            deprecated_skipped,
            "compiled action catalog"
        );

        Ok(ActionCatalog {
            categories: categories
                .into_iter()
                .map(|(label, action_ids)| Category { label, action_ids })
                .collect(),
            actions,
        })
    }

    /// Parse a single operation into an action
    #[allow(clippy::too_many_arguments)]
    fn parse_operation(
        &self,
        document: &Document,
        path: &str,
        method: &str,
        operation: &Operation,
        shared_parameters: &[Value],
        location: &str,
        seen_ids: &mut HashSet<String>,
    ) -> EngineResult<Action> {
        let method = method.to_uppercase();
        let id = generate_action_id(operation, &method, path, seen_ids);

        let mut action = Action::new(id, method.as_str(), path);
        action.label = self.resolve_label(&method, path, operation);
        action.description = self.resolve_description(&method, path, operation);
        action.category = operation
            .tags
            .iter()
            .map(|t| t.trim())
            .find(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.options.uncategorized_label.clone());
        if let Some(requirements) = &operation.security {
            check_security(document, requirements, location)?;
        }
        action.security = operation.security.clone();
        action.deprecated = operation.deprecated;

        let declared =
            self.declared_parameters(document, shared_parameters, &operation.parameters, location)?;
        for parameter in declared.parameters {
            action.add_parameter(parameter);
        }

        let consumes = if operation.consumes.is_empty() {
            &document.consumes
        } else {
            &operation.consumes
        };
        if let Some(raw_body) = &operation.request_body {
            self.parse_request_body(document, &mut action, raw_body, location)?;
        } else if let Some(body) = declared.body.first() {
            let raw_body = legacy_body(body, consumes);
            self.parse_request_body(document, &mut action, &raw_body, location)?;
        } else if !declared.form_data.is_empty() {
            let raw_body = legacy_form_body(&declared.form_data, consumes);
            self.parse_request_body(document, &mut action, &raw_body, location)?;
        }

        Ok(action)
    }

    fn resolve_label(&self, method: &str, path: &str, operation: &Operation) -> String {
        run_resolver(self.options.action_label.as_ref(), method, path, operation)
            .or_else(|| non_blank(operation.summary.as_deref()))
            .unwrap_or_else(|| default_text(method, path))
    }

    fn resolve_description(&self, method: &str, path: &str, operation: &Operation) -> String {
        run_resolver(self.options.action_description.as_ref(), method, path, operation)
            .or_else(|| non_blank(operation.description.as_deref()))
            .or_else(|| non_blank(operation.summary.as_deref()))
            .unwrap_or_else(|| default_text(method, path))
    }

    /// Path-item parameters merged with operation parameters; the operation wins on `(name, in)`
    ///
    /// A name declared in more than one location is keyed `<location>.<name>`
    /// after its first occurrence.
    fn declared_parameters(
        &self,
        document: &Document,
        shared: &[Value],
        own: &[Value],
        location: &str,
    ) -> EngineResult<DeclaredParameters> {
        let mut merged: IndexMap<(String, String), ParameterObject> = IndexMap::new();

        for raw in shared.iter().chain(own.iter()) {
            let resolved = resolve_ref_chain(document, raw, location)?;
            let mut param: ParameterObject = serde_json::from_value(resolved.clone())
                .map_err(|e| EngineError::parse_at(location, format!("invalid parameter: {}", e)))?;
            param.raw = resolved.clone();
            merged.insert((param.name.clone(), param.location.clone()), param);
        }

        let mut declared = DeclaredParameters::default();
        let mut seen_names = HashSet::new();
        for ((name, _), param) in merged {
            match param.location.as_str() {
                "body" => declared.body.push(param),
                "formData" => declared.form_data.push(param),
                other => {
                    let param_location = ParameterLocation::from_openapi(other).ok_or_else(|| {
                        EngineError::parse_at(
                            location,
                            format!("unsupported location '{}' for parameter '{}'", other, name),
                        )
                    })?;
                    let key = if seen_names.insert(name.clone()) {
                        name.clone()
                    } else {
                        format!("{}.{}", param_location, name)
                    };
                    let parameter =
                        self.convert_parameter(document, name, param_location, param, location)?;
                    declared.parameters.push(parameter.key(key));
                }
            }
        }

        Ok(declared)
    }

    /// Convert OpenAPI parameter to action parameter
    fn convert_parameter(
        &self,
        document: &Document,
        name: String,
        param_location: ParameterLocation,
        param: ParameterObject,
        location: &str,
    ) -> EngineResult<ActionParameter> {
        let schema = match &param.schema {
            Some(schema) => Some(resolve_ref_chain(document, schema, location)?),
            None if param.raw.get("type").is_some() => Some(&param.raw),
            None => None,
        };

        let mut action_param = ActionParameter::new(name, param_location)
            .param_type(schema.map(schema_type).unwrap_or(ParameterType::String))
            .description(param.description.unwrap_or_default());

        // path parameters are always required, whatever the author wrote
        if param.required || param_location == ParameterLocation::Path {
            action_param = action_param.required();
        }

        if let Some(schema) = schema {
            apply_schema_hints(&mut action_param, schema);
        }

        Ok(action_param)
    }

    /// Parse request body into body-located parameters
    fn parse_request_body(
        &self,
        document: &Document,
        action: &mut Action,
        raw_body: &Value,
        location: &str,
    ) -> EngineResult<()> {
        let resolved = resolve_ref_chain(document, raw_body, location)?;
        let body: RequestBodyObject = serde_json::from_value(resolved.clone())
            .map_err(|e| EngineError::parse_at(location, format!("invalid request body: {}", e)))?;

        let Some((content_type, media)) = pick_media_type(&body.content) else {
            return Ok(());
        };

        let shape = match &media.schema {
            Some(schema) => object_shape(document, schema, location, 0)?,
            None => None,
        };

        match shape {
            Some(shape) => {
                for (field, raw_schema) in &shape.properties {
                    let field_schema = resolve_ref_chain(document, raw_schema, location)?;
                    // server-assigned fields are never sent
                    if field_schema.get("readOnly").and_then(Value::as_bool) == Some(true) {
                        continue;
                    }
                    let key = if action.parameter(field).is_some() {
                        format!("body.{}", field)
                    } else {
                        field.clone()
                    };

                    let mut param = ActionParameter::new(field.clone(), ParameterLocation::Body)
                        .key(key)
                        .param_type(schema_type(field_schema))
                        .description(
                            field_schema
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default(),
                        );
                    if body.required && shape.required.iter().any(|r| r == field) {
                        param = param.required();
                    }
                    apply_schema_hints(&mut param, field_schema);
                    action.add_parameter(param);
                }

                action.request_body = Some(RequestBodySpec {
                    content_type,
                    required: body.required,
                    shape: BodyShape::Fields,
                });
            }
            None => {
                let param_type = match &media.schema {
                    Some(schema) => schema_type(resolve_ref_chain(document, schema, location)?),
                    None if is_json_content_type(&content_type) => ParameterType::Object,
                    None => ParameterType::String,
                };
                let key = if action.parameter("body").is_some() {
                    "body.body"
                } else {
                    "body"
                };

                let mut param = ActionParameter::new("body", ParameterLocation::Body)
                    .key(key)
                    .param_type(param_type)
                    .description(body.description.clone().unwrap_or_default());
                if body.required {
                    param = param.required();
                }
                action.add_parameter(param);

                action.request_body = Some(RequestBodySpec {
                    content_type,
                    required: body.required,
                    shape: BodyShape::Whole,
                });
            }
        }

        Ok(())
    }
}

/// Generate action id: operationId when usable, `METHOD path` otherwise
fn generate_action_id(
    operation: &Operation,
    method: &str,
    path: &str,
    seen_ids: &mut HashSet<String>,
) -> String {
    let candidate = operation
        .operation_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty() && !seen_ids.contains(*id))
        .map(str::to_string)
        .unwrap_or_else(|| default_text(method, path));

    let mut id = candidate.clone();
    let mut counter = 2;
    while seen_ids.contains(&id) {
        id = format!("{}#{}", candidate, counter);
        counter += 1;
    }
    seen_ids.insert(id.clone());
    id
}

fn default_text(method: &str, path: &str) -> String {
    format!("{} {}", method, path)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

fn run_resolver(
    resolver: Option<&TextResolver>,
    method: &str,
    path: &str,
    operation: &Operation,
) -> Option<String> {
    resolver
        .and_then(|resolve| resolve(method, path, operation))
        .filter(|s| !s.trim().is_empty())
}

/// Follow local `$ref` pointers until a concrete value is reached
fn resolve_ref_chain<'a>(
    document: &'a Document,
    value: &'a Value,
    location: &str,
) -> EngineResult<&'a Value> {
    let mut current = value;
    for _ in 0..MAX_REF_DEPTH {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                current = document.resolve_ref(reference).ok_or_else(|| {
                    EngineError::parse_at(location, format!("unresolvable reference '{}'", reference))
                })?;
            }
            None => return Ok(current),
        }
    }
    Err(EngineError::parse_at(location, "reference chain too deep"))
}

fn object_shape(
    document: &Document,
    schema: &Value,
    location: &str,
    depth: usize,
) -> EngineResult<Option<ObjectShape>> {
    if depth > MAX_REF_DEPTH {
        return Err(EngineError::parse_at(location, "schema composition too deep"));
    }
    let schema = resolve_ref_chain(document, schema, location)?;
    let mut shape = ObjectShape::default();

    if let Some(Value::Array(parts)) = schema.get("allOf") {
        for part in parts {
            if let Some(sub) = object_shape(document, part, location, depth + 1)? {
                shape.properties.extend(sub.properties);
                for name in sub.required {
                    if !shape.required.contains(&name) {
                        shape.required.push(name);
                    }
                }
            }
        }
    }

    if let Some(Value::Object(properties)) = schema.get("properties") {
        for (name, property) in properties {
            shape.properties.insert(name.clone(), property.clone());
        }
    }

    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !shape.required.iter().any(|r| r == name) {
                shape.required.push(name.to_string());
            }
        }
    }

    Ok((!shape.properties.is_empty()).then_some(shape))
}

fn schema_type(schema: &Value) -> ParameterType {
    match schema.get("type") {
        Some(Value::String(t)) => ParameterType::from_schema_type(t),
        // OpenAPI 3.1 style `type: [string, "null"]`
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(ParameterType::from_schema_type)
            .unwrap_or(ParameterType::String),
        _ if schema.get("properties").is_some() || schema.get("allOf").is_some() => {
            ParameterType::Object
        }
        _ if schema.get("items").is_some() => ParameterType::Array,
        _ => ParameterType::String,
    }
}

fn apply_schema_hints(param: &mut ActionParameter, schema: &Value) {
    if let Some(default) = schema.get("default") {
        param.default = Some(default.clone());
    }
    if let Some(Value::Array(options)) = schema.get("enum") {
        param.options = options.clone();
    }
}

/// Prefer `application/json` and other JSON flavours, then the form encodings, then text;
/// the first declared type otherwise
fn pick_media_type(
    content: &IndexMap<String, MediaTypeObject>,
) -> Option<(String, &MediaTypeObject)> {
    let rank = |content_type: &str| match BodyEncoding::for_content_type(content_type) {
        BodyEncoding::Json if media_essence(content_type) == "application/json" => 0,
        BodyEncoding::Json => 1,
        BodyEncoding::Form => 2,
        BodyEncoding::Multipart => 3,
        BodyEncoding::Text => 4,
        BodyEncoding::Raw => 5,
    };
    content
        .iter()
        .min_by_key(|(content_type, _)| rank(content_type))
        .map(|(k, v)| (k.clone(), v))
}

/// Every scheme named by a requirement must be declared by the document
fn check_security(
    document: &Document,
    requirements: &[SecurityRequirement],
    location: &str,
) -> EngineResult<()> {
    for name in requirements.iter().flat_map(|r| r.keys()) {
        if document.security_scheme(name).is_none() {
            return Err(EngineError::parse_at(
                location,
                format!("undeclared security scheme '{}'", name),
            ));
        }
    }
    Ok(())
}

/// Request body equivalent of a Swagger 2 `in: body` parameter
fn legacy_body(param: &ParameterObject, consumes: &[String]) -> Value {
    let schema = param.schema.clone().unwrap_or_else(|| json!({}));
    let content: Map<String, Value> = if consumes.is_empty() {
        [("application/json".to_string(), json!({ "schema": schema }))]
            .into_iter()
            .collect()
    } else {
        consumes
            .iter()
            .map(|media| (media.clone(), json!({ "schema": schema })))
            .collect()
    };

    json!({
        "description": param.description,
        "required": param.required,
        "content": content,
    })
}

/// Request body equivalent of Swagger 2 `in: formData` parameters
///
/// Files need `multipart/form-data`; otherwise url-encoding is used unless the
/// operation only consumes multipart.
fn legacy_form_body(params: &[ParameterObject], consumes: &[String]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut has_file = false;

    for param in params {
        let mut schema = match &param.raw {
            Value::Object(raw) => raw.clone(),
            _ => Map::new(),
        };
        for keyword in ["name", "in", "required", "allowEmptyValue", "collectionFormat"] {
            schema.remove(keyword);
        }
        has_file |= schema.get("type").and_then(Value::as_str) == Some("file");
        properties.insert(param.name.clone(), Value::Object(schema));
        if param.required {
            required.push(param.name.clone());
        }
    }

    let consumes_essence = |target: &str| consumes.iter().any(|c| media_essence(c) == target);
    let media = if has_file || (consumes_essence(MULTIPART_FORM) && !consumes_essence(FORM_URLENCODED))
    {
        MULTIPART_FORM
    } else {
        FORM_URLENCODED
    };

    let mut content = Map::new();
    content.insert(
        media.to_string(),
        json!({"schema": {"type": "object", "properties": properties, "required": required}}),
    );
    json!({
        "required": !required.is_empty(),
        "content": content,
    })
}
