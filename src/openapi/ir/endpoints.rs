//! Endpoint descriptor building.
//!
//! Walks paths in sorted order and methods in lexical order, so the example
//! RNG is consumed in the same sequence on every run.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::api::{
    BodyContentType, BodyDescriptor, EndpointDescriptor, HttpMethod, PaginationDescriptor,
    ParamDescriptor, ParamLocation,
};
use super::context::{GenerationContext, escape_segment};
use super::example::{self, ExampleValue};
use super::naming::{PY_KEYWORDS, sanitize_identifier};
use super::resolve::Resolver;
use super::types::{PyExpr, PyImport, PyType};
use crate::error::GenError;
use crate::openapi::spec::{OpenApiSpec, Operation, Parameter, PathItem, RequestBody, Schema};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Build descriptors for every operation in the document.
pub fn build_endpoints(
    spec: &OpenApiSpec,
    ctx: &mut GenerationContext,
) -> Result<Vec<EndpointDescriptor>, GenError> {
    let resolver = Resolver::new(spec);
    let mut endpoints = Vec::new();
    let mut functions: HashMap<String, String> = HashMap::new();

    // Sort paths for deterministic output
    let mut paths: Vec<_> = spec.paths.iter().collect();
    paths.sort_by_key(|(path, _)| *path);

    for (path, item) in paths {
        for (method_key, op) in item.operations() {
            let Some(method) = HttpMethod::from_key(method_key) else {
                continue;
            };
            let endpoint = build_endpoint(&resolver, ctx, path, method, item, op)?;
            let site = format!("{} {path}", method.as_str());
            if let Some(first) = functions.insert(endpoint.function.clone(), site.clone()) {
                return Err(GenError::DuplicateOperation {
                    function: endpoint.function,
                    first,
                    second: site,
                });
            }
            endpoints.push(endpoint);
        }
    }
    Ok(endpoints)
}

fn operation_location(path: &str, method: HttpMethod) -> String {
    format!("#/paths/{}/{}", escape_segment(path), method.key())
}

/// Method name from the operationId, or from method and path when it is missing.
fn function_name(ctx: &GenerationContext, path: &str, method: HttpMethod, op: &Operation) -> (String, String) {
    let operation_id = op
        .operation_id
        .clone()
        .unwrap_or_else(|| format!("{} {path}", method.key()));
    let mut function = ctx.casing.snake(&operation_id);
    if function.starts_with(|c: char| c.is_ascii_digit()) {
        function.insert(0, '_');
    }
    if PY_KEYWORDS.contains(function.as_str()) {
        function.push('_');
    }
    (function, operation_id)
}

fn build_endpoint(
    resolver: &Resolver<'_>,
    ctx: &mut GenerationContext,
    path: &str,
    method: HttpMethod,
    item: &PathItem,
    op: &Operation,
) -> Result<EndpointDescriptor, GenError> {
    let location = operation_location(path, method);
    let (function, operation_id) = function_name(ctx, path, method, op);
    let websocket = op.x_dropshot_websocket.is_some();

    let merged = merge_parameters(resolver, item, op)?;
    let request_body = op
        .request_body
        .as_ref()
        .map(|body| resolver.request_body(body))
        .transpose()?;

    let mut used: HashSet<String> = HashSet::from(["self".to_string()]);
    if request_body.is_some() {
        used.insert("body".to_string());
    }

    let mut example_imports: Vec<PyImport> = Vec::new();
    let mut params = Vec::with_capacity(merged.len());
    for (param_location, param) in merged {
        let schema_location = format!("{location}/parameters/{}", escape_segment(&param.name));
        let required = param.required || param_location == ParamLocation::Path;
        let example = param_example(param.schema.as_ref(), &schema_location, ctx, resolver)?;
        if required {
            extend_unique(&mut example_imports, &example.imports);
        }
        let mut name = sanitize_identifier(&ctx.casing, &param.name);
        if used.contains(&name) {
            name = format!("{name}_{}", param_location.as_str());
        }
        used.insert(name.clone());
        let root_model = matches!(&example.ty, PyType::Named(class) if ctx.is_root_model(class));
        params.push(ParamDescriptor {
            name,
            wire_name: param.name.clone(),
            location: param_location,
            required,
            root_model,
            ty: if required { example.ty } else { example.ty.optional() },
            example: example.literal,
            description: param.description.clone(),
        });
    }
    // Path parameters first, then the rest of the required ones, then optional.
    params.sort_by_key(|p| match (p.location, p.required) {
        (ParamLocation::Path, _) => 0,
        (_, true) => 1,
        (_, false) => 2,
    });

    let body = match request_body {
        Some(body) => request_body_descriptor(body, &format!("{location}/requestBody"), ctx, resolver)?,
        None => None,
    };
    if let Some((_, Some(example))) = &body {
        extend_unique(&mut example_imports, &example.imports);
    }
    let body = body.map(|(descriptor, _)| descriptor);

    let mut success_types: Vec<PyType> = Vec::new();
    let mut success_without_body = false;
    let mut first_success_schema: Option<(&Schema, String)> = None;
    for (code, response) in &op.responses {
        let is_success = code.starts_with('2') || (websocket && code == "default");
        if !is_success {
            continue;
        }
        let response = resolver.response(response)?;
        let media = response
            .content
            .get(JSON_MEDIA_TYPE)
            .or_else(|| response.content.values().find(|m| m.schema.is_some()));
        let Some(schema) = media.and_then(|m| m.schema.as_ref()) else {
            success_without_body = true;
            continue;
        };
        let response_location = format!("{location}/responses/{}", escape_segment(code));
        let (ty, _) = example::annotation(schema, &response_location, ctx, resolver)?;
        if first_success_schema.is_none() {
            first_success_schema = Some((schema, response_location));
        }
        if ty == PyType::Named(ctx.error_type.clone()) {
            continue;
        }
        if !success_types.contains(&ty) {
            success_types.push(ty);
        }
    }

    let result_type = {
        let union = PyType::union(success_types.clone());
        if success_without_body || success_types.is_empty() {
            union.optional()
        } else {
            union
        }
    };

    let pagination = if op.x_dropshot_pagination.is_some() {
        let item_type = match first_success_schema {
            Some((schema, response_location)) => {
                page_item_type(schema, &response_location, ctx, resolver)?
            }
            None => PyType::Any,
        };
        Some(PaginationDescriptor { item_type })
    } else {
        None
    };

    debug!(
        function = %function,
        method = method.as_str(),
        path = %path,
        params = params.len(),
        "Built endpoint descriptor."
    );

    Ok(EndpointDescriptor {
        function,
        operation_id,
        tag: op.tags.first().cloned().unwrap_or_else(|| "default".to_string()),
        path: path.to_string(),
        method,
        summary: op.summary.clone(),
        description: op.description.clone(),
        deprecated: op.deprecated,
        params,
        body,
        success_types,
        result_type,
        pagination,
        websocket,
        example_imports,
    })
}

/// Path-level parameters overridden by operation-level ones on (name, location).
/// Cookie parameters are dropped.
fn merge_parameters<'a>(
    resolver: &Resolver<'a>,
    item: &'a PathItem,
    op: &'a Operation,
) -> Result<Vec<(ParamLocation, &'a Parameter)>, GenError> {
    let mut merged: Vec<(ParamLocation, &'a Parameter)> = Vec::new();
    for param in item.parameters.iter().chain(op.parameters.iter()) {
        let param = resolver.parameter(param)?;
        let Some(location) = ParamLocation::parse(&param.location) else {
            debug!(name = %param.name, location = %param.location, "Skipping parameter.");
            continue;
        };
        if let Some(slot) = merged
            .iter_mut()
            .find(|(l, p)| *l == location && p.name == param.name)
        {
            slot.1 = param;
        } else {
            merged.push((location, param));
        }
    }
    Ok(merged)
}

fn param_example(
    schema: Option<&Schema>,
    location: &str,
    ctx: &mut GenerationContext,
    resolver: &Resolver<'_>,
) -> Result<ExampleValue, GenError> {
    match schema {
        Some(schema) => example::synth(schema, location, ctx, resolver),
        None => Ok(ExampleValue {
            ty: PyType::Str,
            literal: PyExpr::str("<string>"),
            imports: Vec::new(),
        }),
    }
}

fn request_body_descriptor(
    body: &RequestBody,
    location: &str,
    ctx: &mut GenerationContext,
    resolver: &Resolver<'_>,
) -> Result<Option<(BodyDescriptor, Option<ExampleValue>)>, GenError> {
    let chosen = BodyContentType::PRECEDENCE.iter().find_map(|content_type| {
        body.content
            .iter()
            .find(|(media_type, _)| content_type.matches(media_type))
            .map(|(media_type, media)| (*content_type, media_type, media))
    });
    let Some((content_type, media_type, media)) = chosen else {
        debug!(
            media_types = ?body.content.keys().collect::<Vec<_>>(),
            "No supported request body media type."
        );
        return Ok(None);
    };

    let schema_location = format!("{location}/content/{}/schema", escape_segment(media_type));
    let (ty, example) = match (content_type, media.schema.as_ref()) {
        (BodyContentType::Text, _) => (PyType::Str, None),
        (BodyContentType::OctetStream, _) => (PyType::Bytes, None),
        (_, Some(schema)) => {
            let example = example::synth(schema, &schema_location, ctx, resolver)?;
            (example.ty.clone(), Some(example))
        }
        (_, None) => (PyType::Dict(Box::new(PyType::Any)), None),
    };
    let literal = match (&example, content_type) {
        (Some(example), _) => example.literal.clone(),
        (None, BodyContentType::Text) => PyExpr::str("<string>"),
        (None, BodyContentType::OctetStream) => PyExpr::Bytes("<bytes>".to_string()),
        (None, _) => PyExpr::Dict(Vec::new()),
    };
    let ty = if body.required { ty } else { ty.optional() };
    Ok(Some((
        BodyDescriptor {
            content_type,
            required: body.required,
            ty,
            example: literal,
        },
        example,
    )))
}

/// Element type of a page's `items` array.
fn page_item_type(
    schema: &Schema,
    location: &str,
    ctx: &mut GenerationContext,
    resolver: &Resolver<'_>,
) -> Result<PyType, GenError> {
    let (_, page) = resolver.resolve_deep(schema)?;
    let Some(items) = page.properties.as_ref().and_then(|props| props.get("items")) else {
        return Ok(PyType::Any);
    };
    let (ty, _) = example::annotation(items, &format!("{location}/properties/items"), ctx, resolver)?;
    Ok(match ty {
        PyType::List(inner) => *inner,
        PyType::Optional(inner) => match *inner {
            PyType::List(inner) => *inner,
            _ => PyType::Any,
        },
        _ => PyType::Any,
    })
}

fn extend_unique(into: &mut Vec<PyImport>, imports: &[PyImport]) {
    for import in imports {
        if !into.contains(import) {
            into.push(import.clone());
        }
    }
}
