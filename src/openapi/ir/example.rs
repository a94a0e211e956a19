//! Example values for endpoint documentation and generated tests.
//!
//! One literal per schema. Unions draw a single branch from the run's seeded
//! RNG, so the same document and seed always yield the same examples.
//! Classes are referenced only through the names the type synthesizer
//! registered; anything it did not name renders as plain Python data.

use rand::Rng;

use super::classify::{Classified, Primitive, ShapeKind, StringFormat, WrapperBranch, classify};
use super::context::{GenerationContext, component_location, property_location};
use super::naming::field_identifier;
use super::resolve::Resolver;
use super::typegen::{enum_literal, enum_members, primitive_type};
use super::types::{PyExpr, PyImport, PyLiteral, PyType};
use crate::error::GenError;
use crate::openapi::spec::{EnumValue, Schema};

const STRING_PLACEHOLDER: &str = "<string>";
const BYTES_PLACEHOLDER: &str = "<bytes>";
/// Largest `minItems` an example array is replicated to.
const MAX_EXAMPLE_ITEMS: u64 = 1000;

/// A synthesized example: its annotation, the literal, and what the literal needs imported.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleValue {
    /// Annotation of the example.
    pub ty: PyType,
    /// The example expression.
    pub literal: PyExpr,
    /// Imports the literal needs, in first-use order.
    pub imports: Vec<PyImport>,
}

/// Annotation and example for the schema at `location`.
pub fn synth(
    schema: &Schema,
    location: &str,
    ctx: &mut GenerationContext,
    resolver: &Resolver<'_>,
) -> Result<ExampleValue, GenError> {
    let mut synth = ExampleSynthesizer::new(resolver, ctx);
    let ty = synth.type_of(schema, location)?;
    let literal = synth
        .value(schema, location, None)?
        .unwrap_or(PyExpr::Literal(PyLiteral::None));
    Ok(ExampleValue {
        ty,
        literal,
        imports: synth.imports,
    })
}

/// Annotation only, with the imports it needs. Consumes no randomness.
pub fn annotation(
    schema: &Schema,
    location: &str,
    ctx: &mut GenerationContext,
    resolver: &Resolver<'_>,
) -> Result<(PyType, Vec<PyImport>), GenError> {
    let mut synth = ExampleSynthesizer::new(resolver, ctx);
    let ty = synth.type_of(schema, location)?;
    Ok((ty, synth.imports))
}

struct ExampleSynthesizer<'r, 's, 'c> {
    resolver: &'r Resolver<'s>,
    ctx: &'c mut GenerationContext,
    /// Components currently being expanded, for cutting `$ref` cycles.
    stack: Vec<String>,
    imports: Vec<PyImport>,
}

impl<'r, 's, 'c> ExampleSynthesizer<'r, 's, 'c> {
    fn new(resolver: &'r Resolver<'s>, ctx: &'c mut GenerationContext) -> Self {
        Self {
            resolver,
            ctx,
            stack: Vec::new(),
            imports: Vec::new(),
        }
    }

    fn import(&mut self, import: PyImport) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    fn import_component(&mut self, name: &str) {
        let module = format!("{}.models", self.ctx.package);
        self.import(PyImport::from(module, name));
    }

    /// Class registered for an inline schema, imported from its owner's module.
    fn registered(&mut self, location: &str) -> Option<String> {
        let found = self.ctx.synthesized_at(location)?.clone();
        let module = self.ctx.models_module(&found.module);
        self.import(PyImport::from(module, &found.name));
        Some(found.name)
    }

    fn note_type_imports(&mut self, ty: &PyType) {
        if ty.uses_datetime() {
            self.import(PyImport::Module("datetime".to_string()));
        }
        if ty.uses_base64() {
            let module = format!("{}.types", self.ctx.package);
            self.import(PyImport::from(module, "Base64Data"));
        }
    }

    fn type_of(&mut self, schema: &Schema, location: &str) -> Result<PyType, GenError> {
        let classified = classify(schema, location)?;
        let ty = match &classified.kind {
            ShapeKind::RefAlias(reference) => {
                let resolved = self.resolver.resolve(reference)?;
                let name = self
                    .ctx
                    .component(resolved.raw_name)
                    .map(|c| c.name.clone())
                    .ok_or_else(|| GenError::unresolved(*reference, "component was not admitted"))?;
                self.import_component(&name);
                PyType::Named(name)
            }
            ShapeKind::Primitive(primitive) => primitive_type(primitive),
            ShapeKind::ArrayOf(items) => PyType::List(Box::new(match items {
                Some(items) => self.type_of(items, &format!("{}/items", classified.location))?,
                None => PyType::Any,
            })),
            ShapeKind::MapOf(values) => PyType::Dict(Box::new(match values {
                Some(values) => self.type_of(
                    values,
                    &format!("{}/additionalProperties", classified.location),
                )?,
                None => PyType::Any,
            })),
            ShapeKind::Object(_) => match self.registered(&classified.location) {
                Some(name) => PyType::Named(name),
                None => PyType::Dict(Box::new(PyType::Any)),
            },
            ShapeKind::EnumSimple(values) => match self.registered(&classified.location) {
                Some(name) => PyType::Named(name),
                None => unnamed_enum_type(values.iter().map(enum_literal)),
            },
            ShapeKind::EnumWithDocs(members) => match self.registered(&classified.location) {
                Some(name) => PyType::Named(name),
                None => unnamed_enum_type(members.iter().map(|m| enum_literal(m.value))),
            },
            ShapeKind::NestedSingleFieldWrapper(_)
            | ShapeKind::TaggedUnion { .. }
            | ShapeKind::UntaggedUnion { .. } => match self.registered(&classified.location) {
                Some(name) => PyType::Named(name),
                None => PyType::Any,
            },
        };
        self.note_type_imports(&ty);
        Ok(if classified.nullable { ty.optional() } else { ty })
    }

    /// Example literal. `None` means a `$ref` cycle was cut here.
    ///
    /// `named` carries the component class when the node is a component body.
    fn value(
        &mut self,
        schema: &Schema,
        location: &str,
        named: Option<&str>,
    ) -> Result<Option<PyExpr>, GenError> {
        let classified = classify(schema, location)?;
        let expr = match &classified.kind {
            ShapeKind::RefAlias(reference) => return self.reference(reference, named),
            ShapeKind::Primitive(primitive) => wrap(named, self.primitive(primitive)),
            ShapeKind::EnumSimple(values) => {
                let name = named
                    .map(str::to_string)
                    .or_else(|| self.registered(&classified.location));
                self.enum_value(name, values.iter().map(|v| (v, None)))
            }
            ShapeKind::EnumWithDocs(members) => {
                let name = named
                    .map(str::to_string)
                    .or_else(|| self.registered(&classified.location));
                self.enum_value(name, members.iter().map(|m| (m.value, m.description)))
            }
            ShapeKind::Object(node) => {
                let name = named
                    .map(str::to_string)
                    .or_else(|| self.registered(&classified.location));
                self.object(node, &classified.location, name, None)?
            }
            ShapeKind::ArrayOf(items) => {
                let element = match items {
                    Some(items) => {
                        self.value(items, &format!("{}/items", classified.location), None)?
                    }
                    None => Some(PyExpr::Dict(Vec::new())),
                };
                let literal = match element {
                    Some(element) => {
                        let count = match classified.node.min_items {
                            Some(n) if n > MAX_EXAMPLE_ITEMS => {
                                return Err(GenError::unknown_shape(
                                    &classified.location,
                                    format!("minItems {n} exceeds {MAX_EXAMPLE_ITEMS}"),
                                ));
                            }
                            Some(n) if n > 1 => usize::try_from(n).unwrap_or(1),
                            _ => 1,
                        };
                        PyExpr::List(vec![element; count])
                    }
                    None => PyExpr::List(Vec::new()),
                };
                wrap(named, literal)
            }
            ShapeKind::MapOf(values) => {
                let value = match values {
                    Some(values) => self.value(
                        values,
                        &format!("{}/additionalProperties", classified.location),
                        None,
                    )?,
                    None => Some(PyExpr::Dict(Vec::new())),
                };
                let literal = match value {
                    Some(value) => PyExpr::Dict(vec![(PyExpr::str(STRING_PLACEHOLDER), value)]),
                    None => PyExpr::Dict(Vec::new()),
                };
                wrap(named, literal)
            }
            ShapeKind::NestedSingleFieldWrapper(branches) => {
                let pick = self.ctx.rng().gen_range(0..branches.len());
                let Some(inner) = self.wrapper_branch(&classified, branches[pick])? else {
                    return Ok(None);
                };
                self.union_wrap(named, &classified.location, inner)
            }
            ShapeKind::TaggedUnion {
                tag,
                keyword,
                branches,
                ..
            } => {
                let pick = self.ctx.rng().gen_range(0..branches.len());
                let (index, branch) = branches[pick];
                let branch_location = format!("{}/{keyword}/{index}", classified.location);
                let variant = self.registered(&branch_location);
                let inner = self.object(branch, &branch_location, variant, Some(*tag))?;
                self.union_wrap(named, &classified.location, inner)
            }
            ShapeKind::UntaggedUnion { keyword, branches } => {
                let pick = self.ctx.rng().gen_range(0..branches.len());
                let (index, branch) = branches[pick];
                let branch_location = format!("{}/{keyword}/{index}", classified.location);
                let Some(inner) = self.value(branch, &branch_location, None)? else {
                    return Ok(None);
                };
                self.union_wrap(named, &classified.location, inner)
            }
        };
        Ok(Some(expr))
    }

    fn reference(&mut self, reference: &str, named: Option<&str>) -> Result<Option<PyExpr>, GenError> {
        let resolved = self.resolver.resolve(reference)?;
        if self.stack.iter().any(|r| r == resolved.raw_name) {
            return Ok(None);
        }
        let name = self
            .ctx
            .component(resolved.raw_name)
            .map(|c| c.name.clone())
            .ok_or_else(|| GenError::unresolved(reference, "component was not admitted"))?;
        self.import_component(&name);

        self.stack.push(resolved.raw_name.to_string());
        let inner = self.value(
            resolved.schema,
            &component_location(resolved.raw_name),
            Some(&name),
        );
        self.stack.pop();
        Ok(inner?.map(|expr| wrap(named, expr)))
    }

    fn primitive(&mut self, primitive: &Primitive) -> PyExpr {
        match primitive {
            Primitive::String(format) => match format {
                Some(StringFormat::Uuid) => PyExpr::str("<uuid>"),
                Some(StringFormat::Email) => PyExpr::str("<email>"),
                Some(StringFormat::Uri) => PyExpr::str("<uri>"),
                Some(StringFormat::Date) => {
                    self.import(PyImport::Module("datetime".to_string()));
                    PyExpr::Raw("datetime.date.today()".to_string())
                }
                Some(StringFormat::DateTime) => {
                    self.import(PyImport::Module("datetime".to_string()));
                    PyExpr::Raw("datetime.datetime.now()".to_string())
                }
                Some(StringFormat::Byte) => {
                    let module = format!("{}.types", self.ctx.package);
                    self.import(PyImport::from(module, "Base64Data"));
                    PyExpr::call("Base64Data", vec![PyExpr::Bytes(BYTES_PLACEHOLDER.to_string())])
                }
                Some(StringFormat::Binary) => PyExpr::Bytes(BYTES_PLACEHOLDER.to_string()),
                Some(StringFormat::Other(_)) | None => PyExpr::str(STRING_PLACEHOLDER),
            },
            Primitive::Integer => PyExpr::Literal(PyLiteral::Int(10)),
            Primitive::Number => PyExpr::Literal(PyLiteral::Float(3.14)),
            Primitive::Boolean => PyExpr::Literal(PyLiteral::Bool(false)),
            Primitive::Null => PyExpr::Literal(PyLiteral::None),
            Primitive::Any => PyExpr::Dict(Vec::new()),
        }
    }

    /// First member, as `Name.MEMBER` or the bare value.
    fn enum_value<'v>(
        &self,
        name: Option<String>,
        values: impl IntoIterator<Item = (&'v EnumValue, Option<&'v str>)>,
    ) -> PyExpr {
        let members = enum_members(&self.ctx.casing, values);
        match (name, members.into_iter().next()) {
            (Some(base), Some(first)) => PyExpr::Attr {
                base,
                attr: first.name,
            },
            (None, Some(first)) => PyExpr::Literal(first.value),
            (_, None) => PyExpr::Literal(PyLiteral::None),
        }
    }

    /// Keyword arguments for a class, or a dict keyed by wire names.
    ///
    /// Nullable properties are left out, and so is the discriminant of a
    /// class variant, since the class pins it.
    fn object(
        &mut self,
        node: &Schema,
        location: &str,
        name: Option<String>,
        tag: Option<&str>,
    ) -> Result<PyExpr, GenError> {
        let mut kwargs: Vec<(String, PyExpr)> = Vec::new();
        let mut entries: Vec<(PyExpr, PyExpr)> = Vec::new();
        for (property, schema) in node.properties.iter().flatten() {
            let property_location = property_location(location, property);
            if tag == Some(property.as_str()) {
                if name.is_none() {
                    let literal = schema_tag_literal(schema);
                    entries.push((PyExpr::str(property.clone()), literal));
                }
                continue;
            }
            if classify(schema, &property_location)?.nullable {
                continue;
            }
            let Some(value) = self.value(schema, &property_location, None)? else {
                continue;
            };
            if name.is_some() {
                kwargs.push((field_identifier(&self.ctx.casing, property).0, value));
            } else {
                entries.push((PyExpr::str(property.clone()), value));
            }
        }
        Ok(match name {
            Some(func) => PyExpr::Call {
                func,
                args: Vec::new(),
                kwargs,
            },
            None => PyExpr::Dict(entries),
        })
    }

    fn wrapper_branch(
        &mut self,
        classified: &Classified<'_>,
        branch: WrapperBranch<'_>,
    ) -> Result<Option<PyExpr>, GenError> {
        let keyword = classified
            .node
            .union_branches()
            .map_or("oneOf", |(keyword, _)| keyword);
        match branch {
            WrapperBranch::Field {
                index,
                property,
                schema,
            } => {
                let variant_location = format!("{}/{keyword}/{index}", classified.location);
                let variant = self.registered(&variant_location);
                let Some(inner) =
                    self.value(schema, &property_location(&variant_location, property), None)?
                else {
                    return Ok(None);
                };
                Ok(Some(match variant {
                    Some(func) => PyExpr::Call {
                        func,
                        args: Vec::new(),
                        kwargs: vec![(field_identifier(&self.ctx.casing, property).0, inner)],
                    },
                    None => PyExpr::Dict(vec![(PyExpr::str(property), inner)]),
                }))
            }
            WrapperBranch::Unit { value, .. } => Ok(Some(PyExpr::Literal(enum_literal(value)))),
        }
    }

    /// Wrap a chosen branch in the union's root model when the union has a class.
    fn union_wrap(
        &mut self,
        named: Option<&str>,
        location: &str,
        inner: PyExpr,
    ) -> PyExpr {
        let name = named
            .map(str::to_string)
            .or_else(|| self.registered(location));
        match name {
            Some(func) => PyExpr::call(func, vec![inner]),
            None => inner,
        }
    }
}

fn wrap(named: Option<&str>, inner: PyExpr) -> PyExpr {
    match named {
        Some(name) => PyExpr::call(name, vec![inner]),
        None => inner,
    }
}

fn schema_tag_literal(schema: &Schema) -> PyExpr {
    super::resolve::flatten(schema)
        .single_enum_value()
        .map_or(PyExpr::Literal(PyLiteral::None), |v| PyExpr::Literal(enum_literal(v)))
}

fn unnamed_enum_type(values: impl Iterator<Item = PyLiteral>) -> PyType {
    let values: Vec<PyLiteral> = values.collect();
    if values.iter().all(|v| matches!(v, PyLiteral::Str(_) | PyLiteral::None)) {
        PyType::Str
    } else if values.iter().all(|v| matches!(v, PyLiteral::Int(_) | PyLiteral::None)) {
        PyType::Int
    } else {
        PyType::Any
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::openapi::ir::emit::Emit;
    use crate::openapi::ir::typegen::synthesize_components;
    use crate::openapi::spec::OpenApiSpec;

    fn parse(schemas: &str) -> OpenApiSpec {
        OpenApiSpec::from_json(&format!(
            r#"{{"openapi":"3.0.3","paths":{{}},"components":{{"schemas":{schemas}}}}}"#
        ))
        .unwrap()
    }

    fn context(spec: &OpenApiSpec) -> GenerationContext {
        let mut ctx = GenerationContext::new(spec, &GeneratorConfig::default()).unwrap();
        synthesize_components(spec, &mut ctx).unwrap();
        ctx
    }

    fn example_for(spec: &OpenApiSpec, ctx: &mut GenerationContext, json: &str) -> ExampleValue {
        let schema: Schema = serde_json::from_str(json).unwrap();
        synth(&schema, "#/paths/test", ctx, &Resolver::new(spec)).unwrap()
    }

    #[test]
    fn test_placeholders() {
        let spec = parse("{}");
        let mut ctx = context(&spec);
        let cases = [
            (r#"{"type":"string"}"#, "\"<string>\""),
            (r#"{"type":"string","format":"uuid"}"#, "\"<uuid>\""),
            (r#"{"type":"string","format":"email"}"#, "\"<email>\""),
            (r#"{"type":"string","format":"date-time"}"#, "datetime.datetime.now()"),
            (r#"{"type":"string","format":"date"}"#, "datetime.date.today()"),
            (r#"{"type":"string","format":"byte"}"#, "Base64Data(b\"<bytes>\")"),
            (r#"{"type":"string","format":"binary"}"#, "b\"<bytes>\""),
            (r#"{"type":"integer"}"#, "10"),
            (r#"{"type":"number"}"#, "3.14"),
            (r#"{"type":"boolean"}"#, "False"),
            (r#"{}"#, "{}"),
            (r#"{"type":"string","enum":["b","a"]}"#, "\"b\""),
        ];
        for (schema, expected) in cases {
            assert_eq!(example_for(&spec, &mut ctx, schema).literal.emit(), expected, "{schema}");
        }
    }

    #[test]
    fn test_named_uuid_is_wrapped() {
        let spec = parse(r#"{"Uuid":{"type":"string","format":"uuid"}}"#);
        let mut ctx = context(&spec);
        let ex = example_for(&spec, &mut ctx, r##"{"$ref":"#/components/schemas/Uuid"}"##);
        assert_eq!(ex.literal.emit(), "Uuid(\"<uuid>\")");
        assert_eq!(ex.ty, PyType::Named("Uuid".into()));
        assert_eq!(ex.imports, vec![PyImport::from("client.models", "Uuid")]);
    }

    #[test]
    fn test_array_min_items() {
        let spec = parse(r#"{"Foo":{"type":"object","properties":{"n":{"type":"integer"}}}}"#);
        let mut ctx = context(&spec);
        let three = example_for(
            &spec,
            &mut ctx,
            r##"{"type":"array","minItems":3,"items":{"$ref":"#/components/schemas/Foo"}}"##,
        );
        assert_eq!(three.literal.emit(), "[Foo(n=10), Foo(n=10), Foo(n=10)]");
        let one = example_for(
            &spec,
            &mut ctx,
            r##"{"type":"array","minItems":1,"items":{"$ref":"#/components/schemas/Foo"}}"##,
        );
        assert_eq!(one.literal.emit(), "[Foo(n=10)]");
        let absent =
            example_for(&spec, &mut ctx, r##"{"type":"array","items":{"$ref":"#/components/schemas/Foo"}}"##);
        assert_eq!(absent.literal.emit(), "[Foo(n=10)]");
    }

    #[test]
    fn test_huge_min_items_is_rejected() {
        let spec = parse("{}");
        let mut ctx = context(&spec);
        let schema: Schema = serde_json::from_str(
            r#"{"type":"array","minItems":4294967296,"items":{"type":"integer"}}"#,
        )
        .unwrap();
        let err = synth(&schema, "#/paths/test", &mut ctx, &Resolver::new(&spec)).unwrap_err();
        assert!(matches!(err, GenError::UnknownShape { .. }), "{err:?}");
    }

    #[test]
    fn test_object_skips_nullable_and_uses_registered_names() {
        let spec = parse(
            r#"{"Widget":{"type":"object","properties":{
                "name":{"type":"string"},
                "note":{"type":"string","nullable":true},
                "kind":{"type":"string","enum":["big","small"]},
                "content-type":{"type":"string"}
            }}}"#,
        );
        let mut ctx = context(&spec);
        let ex = example_for(&spec, &mut ctx, r##"{"$ref":"#/components/schemas/Widget"}"##);
        assert_eq!(
            ex.literal.emit(),
            "Widget(name=\"<string>\", kind=WidgetKind.BIG, content_type=\"<string>\")"
        );
        assert!(ex.imports.contains(&PyImport::from("client.models.widget", "WidgetKind")));
    }

    #[test]
    fn test_tagged_union_wraps_variant() {
        let spec = parse(
            r#"{"Shape":{"oneOf":[
                {"type":"object","properties":{"type":{"type":"string","enum":["circle"]},"radius":{"type":"number"}}},
                {"type":"object","properties":{"type":{"type":"string","enum":["square"]},"side":{"type":"number"}}}
            ]}}"#,
        );
        let mut ctx = context(&spec);
        let ex = example_for(&spec, &mut ctx, r##"{"$ref":"#/components/schemas/Shape"}"##);
        let rendered = ex.literal.emit();
        assert!(
            rendered == "Shape(OptionCircle(radius=3.14))"
                || rendered == "Shape(OptionSquare(side=3.14))",
            "{rendered}"
        );
    }

    #[test]
    fn test_union_pick_is_deterministic() {
        let schemas = r#"{"Pick":{"oneOf":[
            {"type":"object","properties":{"a":{"type":"integer"}}},
            {"type":"object","properties":{"b":{"type":"string"}}},
            {"type":"object","properties":{"c":{"type":"boolean"}}}
        ]}}"#;
        let draw = || {
            let spec = parse(schemas);
            let mut ctx = context(&spec);
            (0..5)
                .map(|_| {
                    example_for(&spec, &mut ctx, r##"{"$ref":"#/components/schemas/Pick"}"##)
                        .literal
                        .emit()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn test_reference_cycle_is_cut() {
        let spec = parse(
            r##"{"Node":{"type":"object","properties":{
                "name":{"type":"string"},
                "parent":{"$ref":"#/components/schemas/Node"},
                "children":{"type":"array","items":{"$ref":"#/components/schemas/Node"}}
            }}}"##,
        );
        let mut ctx = context(&spec);
        let ex = example_for(&spec, &mut ctx, r##"{"$ref":"#/components/schemas/Node"}"##);
        assert_eq!(ex.literal.emit(), "Node(name=\"<string>\", children=[])");
    }

    #[test]
    fn test_unregistered_object_is_dict() {
        let spec = parse("{}");
        let mut ctx = context(&spec);
        let ex = example_for(
            &spec,
            &mut ctx,
            r#"{"type":"object","properties":{"x-id":{"type":"integer"}}}"#,
        );
        assert_eq!(ex.literal.emit(), "{\"x-id\": 10}");
        assert_eq!(ex.ty, PyType::Dict(Box::new(PyType::Any)));
    }
}
