//! Advisory contract: typed requests, declared schemas and validated payloads

pub mod payload;
pub mod request;
pub mod schema;

pub use payload::*;
pub use request::{strip_code_fence, AdvisoryKind, AdvisoryRequest};
pub use schema::{Schema, SchemaType};
