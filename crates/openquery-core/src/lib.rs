//! Spec-driven API adapter engine
//!
//! Loads OpenAPI documents, compiles them into action catalogs and executes
//! actions as authenticated HTTP requests.

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod server_url;
pub mod spec;

// Re-export commonly used types
pub use catalog::{
    Action, ActionCatalog, ActionParameter, Category, DocumentParser, ParameterLocation,
    ParameterType, ParseOptions, QueryConfig,
};
pub use config::{DataSourceConfig, DynamicParamsConfig, ParameterValues};
pub use error::{ClassifiedError, EngineError, EngineResult, ErrorKind, TransportCause};
pub use executor::{ActionResult, Executor, ResponseBody};
pub use http::{HttpResponse, HttpTransport, PreparedRequest, RunRequest, TransportSettings};
pub use server_url::{normalize, ServerUrlNormalizer};
pub use spec::{Document, Operation, SelectOption, SpecRegistry};
