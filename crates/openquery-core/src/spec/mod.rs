pub mod document;
pub mod registry;

pub use document::{
    Components, Document, Info, Operation, SecurityRequirement, SecurityScheme, Server, Tag,
    METHODS,
};
pub use registry::{SelectOption, SpecRegistry};
