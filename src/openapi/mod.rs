//! OpenAPI to Python client generator.
//!
//! This module parses OpenAPI 3.x documents and generates a Python package with:
//! - pydantic v2 models from component schemas
//! - one API class per tag, calling into an external `Client` transport
//! - an examples test file and a JSON Patch carrying the examples back

mod emitter;
pub mod ir;
pub mod patch;
pub mod spec;

pub use emitter::{GeneratedTree, generate};
