//! Declarative binary record parsing for Davis Vantage console packets.
//!
//! Console records (LOOP1, LOOP2, HILOW) are packed little-endian structures
//! full of sentinel "dashed" values, scaled integers and fields whose
//! validity hinges on a sibling. Instead of hand-writing one reader per
//! record, this crate interprets a [`Schema`] (an ordered tree of typed
//! field positions, nullable sentinels, unit transforms and inter-field
//! links) against a payload buffer and produces a [`Record`] of typed
//! values.
//!
//! The schema language has four node kinds:
//! - [`FieldSpec`]: a primitive read at a byte (or bit) position
//! - copy-of: adopt a sibling's raw value, then apply an own pipeline
//! - arrays: repeated fields or records, property- or entry-strided
//! - objects: nested schemas
//!
//! Schemas are immutable after construction and safely shareable.

pub mod error;
pub mod node;
pub mod parser;
pub mod transform;
pub mod value;

pub use error::{Result, SchemaError};
pub use node::{ArrayKind, CopySpec, FieldSpec, PrimitiveKind, Schema, SchemaNode};
pub use parser::Parser;
pub use transform::Transform;
pub use value::{Record, Value};
