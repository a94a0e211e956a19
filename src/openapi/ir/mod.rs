//! Intermediate Representation for OpenAPI to Python code generation.
//!
//! This module defines a three-layer architecture:
//! 1. Schema layer: references resolved, shapes classified once per node
//! 2. Python IR: type definitions, endpoint descriptors, expressions, modules
//! 3. Emission: IR to Python source via the `Emit` trait
//!
//! ## Module Structure
//!
//! - `resolve`: `$ref` lookup into the component sections
//! - `naming`: case conversion and identifier sanitizing
//! - `classify`: schema -> `ShapeKind`
//! - `context`: per-run state (seeded RNG, claimed names, nested-type registry)
//! - `typegen`: component schemas -> `TypeDefinition`
//! - `example`: schemas -> example literals
//! - `endpoints`: operations -> `EndpointDescriptor`
//! - `types` / `api`: the Python and endpoint IR
//! - `codegen` / `templates`: IR -> `PyModule`, client methods via tera
//! - `emit`: `PyModule` -> code strings

pub mod api;
pub mod classify;
pub mod codegen;
pub mod context;
pub mod emit;
pub mod endpoints;
pub mod example;
pub mod naming;
pub mod resolve;
pub mod templates;
pub mod typegen;
pub mod types;

// Re-export the main entry points
pub use context::GenerationContext;
pub use emit::Emit;
pub use endpoints::build_endpoints;
pub use typegen::synthesize_components;
