//! RDF serializations, parsing/writing and content negotiation

pub mod codec;
pub mod content_neg;
pub mod format;

pub use codec::{parse_graph, serialize_graph};
pub use content_neg::{negotiate, request_serialization};
pub use format::RdfSerialization;
