//! RFC 6902 JSON Patch carrying the generated examples back into the document.
//!
//! Every operation gets an `x-python` object with its example call and the
//! install line. `/info/x-python` describes the client package. Nothing under
//! `/components` is ever touched.

use serde::Serialize;
use serde_json::{Value, json};

use super::ir::GenerationContext;
use super::ir::api::EndpointDescriptor;
use super::ir::codegen::{ApiCode, example_snippet};
use super::ir::context::escape_segment;
use crate::config::GeneratorConfig;
use crate::error::GenError;

/// One `add` operation of the patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOperation {
    /// Always `add`.
    pub op: String,
    /// JSON Pointer into the document.
    pub path: String,
    /// The `x-python` object.
    pub value: Value,
}

impl PatchOperation {
    fn add(path: String, value: Value) -> Self {
        Self {
            op: "add".to_string(),
            path,
            value,
        }
    }

    fn sort_key(&self) -> (&str, &str, String) {
        (&self.path, &self.op, self.value.to_string())
    }
}

/// Patch operations for every rendered endpoint plus the info block, sorted.
pub fn patch_operations(
    endpoints: &[EndpointDescriptor],
    api: &ApiCode,
    ctx: &GenerationContext,
    config: &GeneratorConfig,
) -> Vec<PatchOperation> {
    let install = config.install_line();
    let mut ops = vec![PatchOperation::add(
        "/info/x-python".to_string(),
        json!({
            "client": format!("from {}.client import Client", ctx.package),
            "install": install,
        }),
    )];

    for endpoint in endpoints {
        if api.failed.contains(&endpoint.function) {
            continue;
        }
        let Some(example) = example_snippet(endpoint, api, ctx) else {
            continue;
        };
        ops.push(PatchOperation::add(
            format!(
                "/paths/{}/{}/x-python",
                escape_segment(&endpoint.path),
                endpoint.method.key()
            ),
            json!({
                "example": example,
                "install": install,
            }),
        ));
    }

    ops.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    ops
}

/// The patch document, pretty-printed with a trailing newline.
pub fn build_patch(
    endpoints: &[EndpointDescriptor],
    api: &ApiCode,
    ctx: &GenerationContext,
    config: &GeneratorConfig,
) -> Result<String, GenError> {
    let ops = patch_operations(endpoints, api, ctx, config);
    let mut out = serde_json::to_string_pretty(&ops)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::ir::build_endpoints;
    use crate::openapi::ir::codegen::codegen_api;
    use crate::openapi::spec::OpenApiSpec;

    const SPEC: &str = r##"{
        "openapi": "3.0.3",
        "info": {"title": "Pets", "version": "1.0"},
        "paths": {
            "/pets/{id}": {
                "get": {
                    "operationId": "getPet",
                    "tags": ["pets"],
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}}
                }
            },
            "/a~b": {
                "post": {
                    "operationId": "tilde",
                    "responses": {"204": {"description": "none"}}
                }
            }
        },
        "components": {"schemas": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}}
    }"##;

    fn operations() -> Vec<PatchOperation> {
        let spec = OpenApiSpec::from_json(SPEC).unwrap();
        let config = GeneratorConfig {
            package_name: "pets".to_string(),
            ..GeneratorConfig::default()
        };
        let mut ctx = GenerationContext::new(&spec, &config).unwrap();
        let endpoints = build_endpoints(&spec, &mut ctx).unwrap();
        let api = codegen_api(&endpoints, &ctx);
        patch_operations(&endpoints, &api, &ctx, &config)
    }

    #[test]
    fn test_patch_paths_are_sorted_and_escaped() {
        let paths: Vec<String> = operations().into_iter().map(|op| op.path).collect();
        assert_eq!(
            paths,
            [
                "/info/x-python",
                "/paths/~1a~0b/post/x-python",
                "/paths/~1pets~1{id}/get/x-python",
            ]
        );
    }

    #[test]
    fn test_patch_never_touches_components() {
        assert!(operations().iter().all(|op| !op.path.starts_with("/components")));
    }

    #[test]
    fn test_patch_carries_example_and_install() {
        let ops = operations();
        let get = ops.iter().find(|op| op.path.contains("pets")).unwrap();
        assert_eq!(get.op, "add");
        assert_eq!(get.value["install"], "pip install pets");
        let example = get.value["example"].as_str().unwrap();
        assert!(example.contains("from pets.api.pets import PetsAPI\n"));
        assert!(example.contains("def example_get_pet():\n"));
        assert!(example.contains("result: Pet = api.get_pet(id=10)\n"));
    }
}
