//! Python client emitter for OpenAPI specifications.
//!
//! This module is a thin wrapper around the IR-based code generation.
//! The pipeline is:
//! 1. Parse: OpenAPI JSON -> OpenApiSpec
//! 2. Synthesize: component schemas -> TypeDefinitions, operations -> EndpointDescriptors
//! 3. Codegen: IR -> PyModules
//! 4. Emit: PyModule -> String (via Emit trait), collected into a GeneratedTree

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use super::ir::codegen::{
    codegen_api, codegen_api_index, codegen_examples, codegen_model_module, codegen_models_index,
};
use super::ir::{Emit, GenerationContext, build_endpoints, synthesize_components};
use super::patch::build_patch;
use super::spec::OpenApiSpec;
use crate::config::GeneratorConfig;
use crate::error::GenError;

/// Every output file of one run, keyed by path relative to the output root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedTree {
    files: BTreeMap<PathBuf, String>,
}

impl GeneratedTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; a later insert at the same path replaces the earlier one.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: String) {
        self.files.insert(path.into(), contents);
    }

    /// Contents of the file at `path`.
    pub fn get(&self, path: impl Into<PathBuf>) -> Option<&str> {
        self.files.get(&path.into()).map(String::as_str)
    }

    /// Files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &String)> {
        self.files.iter()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Generate the Python client tree from an OpenAPI JSON string.
pub fn generate(openapi_json: &str, config: &GeneratorConfig) -> Result<GeneratedTree, GenError> {
    // Parse OpenAPI spec
    let spec = OpenApiSpec::from_json(openapi_json)?;

    // Fresh state per run, so repeated calls produce identical output
    let mut ctx = GenerationContext::new(&spec, config)?;

    let definitions = synthesize_components(&spec, &mut ctx)?;
    let endpoints = build_endpoints(&spec, &mut ctx)?;

    let package = PathBuf::from(&ctx.package);
    let mut tree = GeneratedTree::new();

    for (entry, definition) in &definitions {
        let path = package.join("models").join(format!("{}.py", entry.module));
        debug!(schema = %entry.raw_name, path = %path.display(), "Emitting model.");
        tree.insert(path, codegen_model_module(definition, &ctx).emit());
    }
    tree.insert(
        package.join("models").join("__init__.py"),
        codegen_models_index(ctx.components()).emit(),
    );

    let api = codegen_api(&endpoints, &ctx);
    for module in &api.modules {
        tree.insert(
            package.join("api").join(format!("{}.py", module.module)),
            module.code.emit(),
        );
    }
    tree.insert(package.join("api").join("__init__.py"), codegen_api_index(&api).emit());
    tree.insert(
        package.join("tests").join("test_examples.py"),
        codegen_examples(&endpoints, &api, &ctx).emit(),
    );

    let patch = build_patch(&endpoints, &api, &ctx, config)?;
    tree.insert(format!("{}.patch.json", ctx.package), patch);

    info!(
        models = definitions.len(),
        endpoints = endpoints.len(),
        stubs = api.failed.len(),
        files = tree.len(),
        "Generated Python client."
    );
    Ok(tree)
}
