//! Code generation from IR to Python modules.
//!
//! This module turns synthesized type definitions and endpoint descriptors
//! into [`PyModule`]s: one models file per component, the tag API classes,
//! the package indexes and the examples test file.
//!
//! The generated modules can then be emitted to strings via the `Emit` trait.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tera::Context;
use tracing::warn;

use super::api::{EndpointDescriptor, ParamDescriptor, ParamLocation};
use super::context::{ComponentEntry, GenerationContext};
use super::emit::{Emit, docstring};
use super::naming::{PY_KEYWORDS, camel_to_snake, escape_py_string};
use super::templates::{self, METHOD_TEMPLATE, PAGINATED_TEMPLATE, WEBSOCKET_TEMPLATE};
use super::types::{
    FieldDef, ImportSet, PyExpr, PyFunction, PyImport, PyItem, PyModule, PyType, TypeDefKind,
    TypeDefinition,
};
use crate::error::GenError;

/// Signature lines longer than this are split one parameter per line.
const LINE_WIDTH: usize = 88;

/// One generated API class.
#[derive(Debug, Clone)]
pub struct ApiModule {
    /// Snake-case module name under `api/`.
    pub module: String,
    /// `<PascalTag>API`
    pub class_name: String,
    /// The module source.
    pub code: PyModule,
}

/// Every API class plus the functions that fell back to stubs.
#[derive(Debug, Clone, Default)]
pub struct ApiCode {
    /// One module per tag, sorted by module name.
    pub modules: Vec<ApiModule>,
    /// Function names rendered as stubs.
    pub failed: HashSet<String>,
}

impl ApiCode {
    /// Module and class that own an endpoint.
    pub fn owner(&self, ctx: &GenerationContext, endpoint: &EndpointDescriptor) -> Option<&ApiModule> {
        let module = tag_module(ctx, &endpoint.tag);
        self.modules.iter().find(|m| m.module == module)
    }
}

// =============================================================================
// Models
// =============================================================================

/// Generate the models file of one component.
pub fn codegen_model_module(def: &TypeDefinition, ctx: &GenerationContext) -> PyModule {
    let mut imports = ImportSet::new();
    imports.add(&PyImport::from("__future__", "annotations"));

    let order = def.emission_order();
    for local in &order {
        imports.bind_local(&local.name);
    }

    let mut typing: BTreeSet<&'static str> = BTreeSet::new();
    let mut pydantic: BTreeSet<&'static str> = BTreeSet::new();
    let mut annotations: Vec<&PyType> = Vec::new();
    for local in &order {
        annotations.extend(local.annotations());
        match &local.kind {
            TypeDefKind::Object { fields } => {
                pydantic.insert("BaseModel");
                pydantic.insert("ConfigDict");
                if fields.iter().any(|f: &FieldDef| f.alias.is_some()) {
                    pydantic.insert("Field");
                }
            }
            TypeDefKind::Enum { .. } => {
                imports.add(&PyImport::from("enum", "Enum"));
            }
            TypeDefKind::TaggedUnion { variants, .. } => {
                pydantic.insert("RootModel");
                if variants.len() > 1 {
                    typing.insert("Annotated");
                    typing.insert("Union");
                    pydantic.insert("Field");
                }
            }
            TypeDefKind::Wrapper { variants } | TypeDefKind::UntaggedUnion { variants } => {
                pydantic.insert("RootModel");
                if variants.len() > 1 {
                    typing.insert("Union");
                }
            }
            TypeDefKind::Alias { .. } => {
                pydantic.insert("RootModel");
            }
        }
    }

    for ty in &annotations {
        ty.typing_names(&mut typing);
        if ty.uses_datetime() {
            imports.add(&PyImport::Module("datetime".to_string()));
        }
        if ty.uses_base64() {
            imports.add(&PyImport::from(format!("{}.types", ctx.package), "Base64Data"));
        }
    }
    for name in typing {
        imports.add(&PyImport::from("typing", name));
    }
    for name in pydantic {
        imports.add(&PyImport::from("pydantic", name));
    }

    let mut refs: Vec<&str> = Vec::new();
    for ty in &annotations {
        ty.named_refs(&mut refs);
    }
    for name in refs {
        match ctx.component_module(name) {
            Some(module) => {
                imports.add(&PyImport::from(format!(".{module}"), name));
            }
            None if order.iter().any(|d| d.name == name) => {}
            None => warn!(name = %name, owner = %def.name, "Reference to an unknown class."),
        }
    }

    PyModule {
        doc: None,
        imports,
        items: vec![PyItem::Type(def.clone())],
    }
}

/// `models/__init__.py`: re-export every component, sorted by name.
pub fn codegen_models_index(components: &[ComponentEntry]) -> PyModule {
    let mut entries: Vec<&ComponentEntry> = components.iter().collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut imports = ImportSet::new();
    for entry in &entries {
        imports.add(&PyImport::from(format!(".{}", entry.module), &entry.name));
    }
    let names = entries.iter().map(|e| e.name.as_str());
    PyModule {
        doc: None,
        imports,
        items: vec![dunder_all(names)],
    }
}

fn dunder_all<'a>(names: impl Iterator<Item = &'a str>) -> PyItem {
    let list = PyExpr::List(names.map(PyExpr::str).collect());
    PyItem::Raw(format!("__all__ = {}", list.emit_wrapped(0, "__all__ = ".len())))
}

// =============================================================================
// API classes
// =============================================================================

/// Python module that holds the class for a tag.
pub fn tag_module(ctx: &GenerationContext, tag: &str) -> String {
    let mut module = ctx.casing.snake(tag);
    if module.is_empty() {
        module.push_str("default");
    }
    if module.starts_with(|c: char| c.is_ascii_digit()) {
        module.insert(0, '_');
    }
    if PY_KEYWORDS.contains(module.as_str()) {
        module.push('_');
    }
    module
}

fn tag_class(ctx: &GenerationContext, tag: &str) -> String {
    let mut name = ctx.casing.pascal(tag);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    format!("{name}API")
}

/// Generate one API class per tag, in tag order.
pub fn codegen_api(endpoints: &[EndpointDescriptor], ctx: &GenerationContext) -> ApiCode {
    let mut by_module: BTreeMap<String, (String, String, Vec<&EndpointDescriptor>)> =
        BTreeMap::new();
    for endpoint in endpoints {
        by_module
            .entry(tag_module(ctx, &endpoint.tag))
            .or_insert_with(|| (endpoint.tag.clone(), tag_class(ctx, &endpoint.tag), Vec::new()))
            .2
            .push(endpoint);
    }

    let mut code = ApiCode::default();
    for (module, (tag, class_name, members)) in by_module {
        let mut imports = ImportSet::new();
        imports.bind_local(&class_name);
        imports.add(&PyImport::from(format!("{}.client", ctx.package), "Client"));

        let mut methods = Vec::with_capacity(members.len());
        for endpoint in members {
            let mut types = endpoint.signature_types();
            if endpoint.websocket {
                imports.add(&PyImport::from(format!("{}.types", ctx.package), "WebSocket"));
            }
            match render_method(endpoint) {
                Ok(rendered) => {
                    if !endpoint.websocket {
                        imports.add(&PyImport::from("pydantic", "TypeAdapter"));
                        if endpoint.pagination.is_some() {
                            imports.add(&PyImport::from("typing", "Iterator"));
                        }
                    }
                    methods.push(rendered);
                }
                Err(err) => {
                    let reason = match &err {
                        GenError::EndpointBody { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    warn!(
                        function = %endpoint.function,
                        path = %endpoint.path,
                        reason = %reason,
                        "Endpoint generation failed, emitting a stub."
                    );
                    // The stub keeps the plain signature, without the page item type.
                    if endpoint.pagination.is_some() {
                        types.pop();
                    }
                    code.failed.insert(endpoint.function.clone());
                    methods.push(stub_method(endpoint, &reason));
                }
            }
            for ty in types {
                add_type_imports(&mut imports, ty, ctx);
            }
        }

        let mut class = format!("class {class_name}:\n");
        class.push_str(&docstring(&format!("Operations tagged `{tag}`."), 1));
        class.push('\n');
        class.push_str("    def __init__(self, client: Client) -> None:\n");
        class.push_str("        self._client = client\n");
        for method in methods {
            class.push('\n');
            class.push_str(&method);
        }

        code.modules.push(ApiModule {
            module,
            class_name,
            code: PyModule {
                doc: None,
                imports,
                items: vec![PyItem::Raw(class)],
            },
        });
    }
    code
}

/// `api/__init__.py`: re-export every tag class.
pub fn codegen_api_index(api: &ApiCode) -> PyModule {
    let mut imports = ImportSet::new();
    for module in &api.modules {
        imports.add(&PyImport::from(format!(".{}", module.module), &module.class_name));
    }
    let mut names: Vec<&str> = api.modules.iter().map(|m| m.class_name.as_str()).collect();
    names.sort_unstable();
    PyModule {
        doc: None,
        imports,
        items: vec![dunder_all(names.into_iter())],
    }
}

/// Imports an annotation needs outside the models package.
fn add_type_imports(imports: &mut ImportSet, ty: &PyType, ctx: &GenerationContext) {
    let mut typing = BTreeSet::new();
    ty.typing_names(&mut typing);
    for name in typing {
        imports.add(&PyImport::from("typing", name));
    }
    if ty.uses_datetime() {
        imports.add(&PyImport::Module("datetime".to_string()));
    }
    if ty.uses_base64() {
        imports.add(&PyImport::from(format!("{}.types", ctx.package), "Base64Data"));
    }
    let mut refs = Vec::new();
    ty.named_refs(&mut refs);
    for name in refs {
        imports.add(&PyImport::from(format!("{}.models", ctx.package), name));
    }
}

// =============================================================================
// Methods
// =============================================================================

fn signature_parts(endpoint: &EndpointDescriptor, skip: Option<&str>) -> Vec<String> {
    let mut parts = vec!["self".to_string()];
    let keep = |p: &&ParamDescriptor| Some(p.name.as_str()) != skip;
    for param in endpoint.required_params().filter(keep) {
        parts.push(format!("{}: {}", param.name, param.ty.emit()));
    }
    if let Some(body) = &endpoint.body {
        if body.required {
            parts.push(format!("body: {}", body.ty.emit()));
        } else {
            parts.push(format!("body: {} = None", body.ty.emit()));
        }
    }
    for param in endpoint.optional_params().filter(keep) {
        parts.push(format!("{}: {} = None", param.name, param.ty.emit()));
    }
    parts
}

/// Parameter list between the parentheses of `def <name>(...) -> <result>:`.
fn signature(name: &str, parts: &[String], result: &str) -> String {
    let flat = parts.join(", ");
    let line = format!("    def {name}({flat}) -> {result}:");
    if line.len() <= LINE_WIDTH {
        return flat;
    }
    let mut out = "\n".to_string();
    for part in parts {
        out.push_str(&format!("        {part},\n"));
    }
    out.push_str("    ");
    out
}

fn method_doc(endpoint: &EndpointDescriptor) -> String {
    let mut text: Vec<&str> = Vec::new();
    if let Some(summary) = endpoint.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push(summary.trim());
    }
    if let Some(description) = endpoint.description.as_deref().filter(|s| !s.trim().is_empty()) {
        if text.first() != Some(&description.trim()) {
            text.push(description.trim());
        }
    }
    if endpoint.deprecated {
        text.push("Deprecated.");
    }
    if text.is_empty() {
        String::new()
    } else {
        docstring(&text.join("\n\n"), 2)
    }
}

enum UrlPart<'a> {
    Static(String),
    Param(&'a ParamDescriptor),
}

/// URL expression: a plain string, or an f-string over path parameters.
fn url_expr(endpoint: &EndpointDescriptor) -> Result<String, GenError> {
    let path_params: Vec<&ParamDescriptor> = endpoint
        .params
        .iter()
        .filter(|p| p.location == ParamLocation::Path)
        .collect();

    let mut template = Vec::new();
    let mut current = String::new();
    let mut placeholder = String::new();
    let mut in_param = false;
    for c in endpoint.path.chars() {
        if c == '{' && !in_param {
            if !current.is_empty() {
                template.push(UrlPart::Static(std::mem::take(&mut current)));
            }
            in_param = true;
            placeholder.clear();
        } else if c == '}' && in_param {
            let param = find_matching_param(&placeholder, &path_params).ok_or_else(|| {
                GenError::EndpointBody {
                    function: endpoint.function.clone(),
                    reason: format!("no path parameter matches placeholder '{{{placeholder}}}'"),
                }
            })?;
            template.push(UrlPart::Param(param));
            in_param = false;
        } else if in_param {
            placeholder.push(c);
        } else {
            current.push(c);
        }
    }
    if in_param {
        return Err(GenError::EndpointBody {
            function: endpoint.function.clone(),
            reason: format!("unterminated placeholder in path '{}'", endpoint.path),
        });
    }
    if !current.is_empty() {
        template.push(UrlPart::Static(current));
    }

    let templated = template.iter().any(|part| matches!(part, UrlPart::Param(_)));
    let mut out = String::new();
    for part in &template {
        match part {
            UrlPart::Static(text) if templated => {
                out.push_str(&escape_py_string(text).replace('{', "{{").replace('}', "}}"));
            }
            UrlPart::Static(text) => out.push_str(&escape_py_string(text)),
            UrlPart::Param(param) => {
                out.push('{');
                out.push_str(&param.name);
                if param.root_model {
                    out.push_str(".root");
                }
                out.push('}');
            }
        }
    }
    Ok(if templated {
        format!("f\"{out}\"")
    } else {
        format!("\"{out}\"")
    })
}

/// Parameter filling a path placeholder.
fn find_matching_param<'a>(
    placeholder: &str,
    params: &[&'a ParamDescriptor],
) -> Option<&'a ParamDescriptor> {
    // Try exact match on wire name first
    if let Some(p) = params.iter().find(|p| p.wire_name == placeholder) {
        return Some(p);
    }

    // Try snake_case equivalence (handles "itemId" matching "item_id")
    let placeholder_snake = camel_to_snake(placeholder);
    params
        .iter()
        .find(|p| camel_to_snake(&p.wire_name) == placeholder_snake)
        .copied()
}

/// `{"wire": name, ...}` for one parameter location, or `None`.
fn params_dict(endpoint: &EndpointDescriptor, location: ParamLocation) -> String {
    let entries: Vec<String> = endpoint
        .params
        .iter()
        .filter(|p| p.location == location)
        .map(|p| format!("\"{}\": {}", escape_py_string(&p.wire_name), p.name))
        .collect();
    if entries.is_empty() {
        "None".to_string()
    } else {
        format!("{{{}}}", entries.join(", "))
    }
}

/// Render one client method from its template.
pub fn render_method(endpoint: &EndpointDescriptor) -> Result<String, GenError> {
    let failed = |reason: String| GenError::EndpointBody {
        function: endpoint.function.clone(),
        reason,
    };

    let result = endpoint.result_type.emit();
    let parts = signature_parts(endpoint, None);
    let returns = if endpoint.websocket {
        format!("WebSocket[{result}]")
    } else {
        result.clone()
    };

    let mut context = Context::new();
    context.insert("name", &endpoint.function);
    context.insert("signature", &signature(&endpoint.function, &parts, &returns));
    context.insert("result", &result);
    context.insert("doc", &method_doc(endpoint));
    context.insert("url", &url_expr(endpoint)?);
    context.insert("method", endpoint.method.as_str());
    context.insert("params", &params_dict(endpoint, ParamLocation::Query));
    context.insert("headers", &params_dict(endpoint, ParamLocation::Header));
    context.insert(
        "body",
        if endpoint.body.is_some() { "body" } else { "None" },
    );
    let content_type = endpoint
        .body
        .as_ref()
        .map(|b| format!("\"{}\"", b.content_type.mime()))
        .unwrap_or_else(|| "None".to_string());
    context.insert("content_type", &content_type);

    if endpoint.websocket {
        return templates::render(WEBSOCKET_TEMPLATE, &context).map_err(failed);
    }

    let mut rendered = templates::render(METHOD_TEMPLATE, &context).map_err(failed)?;
    if let Some(pagination) = &endpoint.pagination {
        let token = endpoint
            .param(ParamLocation::Query, "page_token")
            .ok_or_else(|| failed("paginated endpoint has no page_token query parameter".to_string()))?;
        let item = pagination.item_type.emit();
        let all_parts = signature_parts(endpoint, Some(&token.name));
        let mut call_args: Vec<String> = endpoint
            .params
            .iter()
            .filter(|p| p.name != token.name)
            .map(|p| format!("{0}={0}", p.name))
            .collect();
        if endpoint.body.is_some() {
            call_args.push("body=body".to_string());
        }
        call_args.push(format!("{}=page_token", token.name));

        let all_name = format!("{}_all", endpoint.function);
        context.insert(
            "all_signature",
            &signature(&all_name, &all_parts, &format!("Iterator[{item}]")),
        );
        context.insert("item", &item);
        context.insert("call_args", &call_args.join(", "));
        rendered.push('\n');
        rendered.push_str(&templates::render(PAGINATED_TEMPLATE, &context).map_err(failed)?);
    }
    Ok(rendered)
}

/// Method that keeps the signature but raises at call time.
fn stub_method(endpoint: &EndpointDescriptor, reason: &str) -> String {
    let result = endpoint.result_type.emit();
    let returns = if endpoint.websocket {
        format!("WebSocket[{result}]")
    } else {
        result
    };
    let parts = signature_parts(endpoint, None);
    let reason = reason.replace(['\n', '\r'], " ");
    format!(
        "    def {name}({signature}) -> {returns}:\n        # generation failed: {reason}\n        raise NotImplementedError(\"{escaped}\")\n",
        name = endpoint.function,
        signature = signature(&endpoint.function, &parts, &returns),
        escaped = escape_py_string(&endpoint.function),
    )
}

// =============================================================================
// Examples
// =============================================================================

/// Imports and body lines of the example call for one endpoint.
fn example_body(
    endpoint: &EndpointDescriptor,
    owner: &ApiModule,
    ctx: &GenerationContext,
    imports: &mut ImportSet,
) -> Vec<String> {
    imports.add(&PyImport::from(format!("{}.client", ctx.package), "Client"));
    imports.add(&PyImport::from(
        format!("{}.api.{}", ctx.package, owner.module),
        &owner.class_name,
    ));
    imports.extend(&endpoint.example_imports);
    add_type_imports(imports, &endpoint.result_type, ctx);

    let mut result = endpoint.result_type.emit();
    if endpoint.websocket {
        imports.add(&PyImport::from(format!("{}.types", ctx.package), "WebSocket"));
        result = format!("WebSocket[{result}]");
    }

    let call = PyExpr::Call {
        func: format!("api.{}", endpoint.function),
        args: Vec::new(),
        kwargs: endpoint.example_args(),
    };
    let prefix = format!("result: {result} = ");
    vec![
        format!("api = {}(Client())", owner.class_name),
        format!("{prefix}{}", call.emit_wrapped(1, 4 + prefix.len())),
        "print(result)".to_string(),
    ]
}

/// `tests/test_examples.py`: one test per endpoint that rendered.
pub fn codegen_examples(
    endpoints: &[EndpointDescriptor],
    api: &ApiCode,
    ctx: &GenerationContext,
) -> PyModule {
    let mut module = PyModule {
        doc: Some("Example calls for every generated endpoint.".to_string()),
        ..PyModule::default()
    };
    for endpoint in endpoints {
        if api.failed.contains(&endpoint.function) {
            continue;
        }
        let Some(owner) = api.owner(ctx, endpoint) else {
            continue;
        };
        let body = example_body(endpoint, owner, ctx, &mut module.imports);
        module.items.push(PyItem::Function(PyFunction {
            name: format!("test_{}", endpoint.function),
            params: Vec::new(),
            return_type: None,
            doc: None,
            body,
        }));
    }
    module
}

/// Standalone example for one endpoint, as embedded in the JSON patch.
pub fn example_snippet(
    endpoint: &EndpointDescriptor,
    api: &ApiCode,
    ctx: &GenerationContext,
) -> Option<String> {
    let owner = api.owner(ctx, endpoint)?;
    let mut module = PyModule::default();
    let body = example_body(endpoint, owner, ctx, &mut module.imports);
    module.items.push(PyItem::Function(PyFunction {
        name: format!("example_{}", endpoint.function),
        params: Vec::new(),
        return_type: None,
        doc: None,
        body,
    }));
    Some(module.emit())
}
