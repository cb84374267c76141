//! Request building and transport

pub mod body;
pub mod credentials;
pub mod request;
pub mod transport;
pub mod url_builder;

pub use body::{is_json_content_type, BodyEncoding, RequestBody};
pub use credentials::{create_auth_injector, select_credentials, AuthInjector};
pub use request::{PreparedRequest, RequestBuilder, RequestParts, RunRequest};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportSettings};
pub use url_builder::UrlBuilder;
