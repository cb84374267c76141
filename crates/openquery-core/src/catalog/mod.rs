pub mod models;
pub mod parser;

pub use models::{
    Action, ActionCatalog, ActionParameter, BodyShape, Category, CategoryGroup, ParameterLocation,
    ParameterType, QueryConfig, RequestBodySpec, UNCATEGORIZED,
};
pub use parser::{parse, DocumentParser, ParseOptions, TextResolver};
