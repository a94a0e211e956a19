//! `$ref` resolution against the document's components.
//!
//! Only local pointers into `#/components/{schemas,responses,parameters,requestBodies}`
//! are supported. Anything else is fatal.

use indexmap::IndexMap;

use crate::error::GenError;
use crate::openapi::spec::{
    Components, OpenApiSpec, Parameter, RefOr, RequestBody, Response, Schema,
};

const SCHEMAS_PREFIX: &str = "#/components/schemas/";
const RESPONSES_PREFIX: &str = "#/components/responses/";
const PARAMETERS_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODIES_PREFIX: &str = "#/components/requestBodies/";

/// A resolved component schema.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSchema<'a> {
    /// Key as written under `components.schemas`.
    pub raw_name: &'a str,
    /// The schema node.
    pub schema: &'a Schema,
}

/// Read-only view over the document's reusable definitions.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    components: Option<&'a Components>,
}

impl<'a> Resolver<'a> {
    /// Resolver over the document's `components`.
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
        }
    }

    /// Resolve a schema pointer. The referenced node is returned as written,
    /// so a component that is itself a `$ref` stays an alias.
    pub fn resolve(&self, reference: &str) -> Result<ResolvedSchema<'a>, GenError> {
        let key = pointer_key(reference, SCHEMAS_PREFIX)?;
        let schemas = self.components.map(|c| &c.schemas);
        let (raw_name, schema) = lookup(schemas, &key, reference)?;
        Ok(ResolvedSchema { raw_name, schema })
    }

    /// Follow `$ref` chains and single-member `allOf` until an inline node is reached.
    ///
    /// Returns the name of the last component passed through, if any.
    pub fn resolve_deep(
        &self,
        schema: &'a Schema,
    ) -> Result<(Option<&'a str>, &'a Schema), GenError> {
        let mut current = flatten(schema);
        let mut name = None;
        // A chain longer than the component count must contain a cycle.
        let limit = self.components.map_or(0, |c| c.schemas.len()) + 1;
        for _ in 0..=limit {
            let Some(reference) = &current.ref_path else {
                return Ok((name, current));
            };
            let resolved = self.resolve(reference)?;
            name = Some(resolved.raw_name);
            current = flatten(resolved.schema);
        }
        Err(GenError::unresolved(
            current.ref_path.as_deref().unwrap_or_default(),
            "reference cycle without an inline schema",
        ))
    }

    /// Inline response, or the one under `#/components/responses`.
    pub fn response(&self, item: &'a RefOr<Response>) -> Result<&'a Response, GenError> {
        match item {
            RefOr::Item(response) => Ok(response),
            RefOr::Ref { reference } => {
                let key = pointer_key(reference, RESPONSES_PREFIX)?;
                lookup(self.components.map(|c| &c.responses), &key, reference).map(|(_, r)| r)
            }
        }
    }

    /// Inline parameter, or the one under `#/components/parameters`.
    pub fn parameter(&self, item: &'a RefOr<Parameter>) -> Result<&'a Parameter, GenError> {
        match item {
            RefOr::Item(parameter) => Ok(parameter),
            RefOr::Ref { reference } => {
                let key = pointer_key(reference, PARAMETERS_PREFIX)?;
                lookup(self.components.map(|c| &c.parameters), &key, reference).map(|(_, p)| p)
            }
        }
    }

    /// Inline request body, or the one under `#/components/requestBodies`.
    pub fn request_body(
        &self,
        item: &'a RefOr<RequestBody>,
    ) -> Result<&'a RequestBody, GenError> {
        match item {
            RefOr::Item(body) => Ok(body),
            RefOr::Ref { reference } => {
                let key = pointer_key(reference, REQUEST_BODIES_PREFIX)?;
                lookup(self.components.map(|c| &c.request_bodies), &key, reference)
                    .map(|(_, b)| b)
            }
        }
    }
}

/// Treat `{"allOf": [X]}` as `X`, repeatedly.
pub fn flatten(schema: &Schema) -> &Schema {
    let mut current = schema;
    while let Some([single]) = current.all_of.as_deref() {
        current = single;
    }
    current
}

fn pointer_key(reference: &str, prefix: &str) -> Result<String, GenError> {
    let Some(raw) = reference.strip_prefix(prefix) else {
        return Err(GenError::unresolved(
            reference,
            format!("only pointers starting with '{prefix}' are supported here"),
        ));
    };
    if raw.is_empty() || raw.contains('/') {
        return Err(GenError::unresolved(
            reference,
            "pointer must name a single component",
        ));
    }
    Ok(raw.replace("~1", "/").replace("~0", "~"))
}

fn lookup<'a, T>(
    map: Option<&'a IndexMap<String, T>>,
    key: &str,
    reference: &str,
) -> Result<(&'a str, &'a T), GenError> {
    map.and_then(|m| m.get_key_value(key))
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| GenError::unresolved(reference, "no such component"))
}
