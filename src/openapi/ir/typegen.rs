//! Type synthesis: classified schemas to Python class definitions.
//!
//! Each component becomes one [`TypeDefinition`]. Inline enums, objects and
//! unions found below it get a claimed name, are registered in the
//! [`GenerationContext`] under their location pointer, and are owned by the
//! component so they land in the same file.

use serde_json::Value;

use super::classify::{Classified, Primitive, ShapeKind, StringFormat, WrapperBranch, classify};
use super::context::{ComponentEntry, GenerationContext, component_location, property_location};
use super::naming::{Casing, enum_member_name, field_identifier};
use super::resolve::{Resolver, flatten};
use super::types::{
    EnumMember, FieldDef, FieldDefault, PyExpr, PyLiteral, PyType, TypeDefKind, TypeDefinition,
    UnionVariant,
};
use crate::error::GenError;
use crate::openapi::spec::{EnumValue, OpenApiSpec, Schema};

/// Python annotation of a scalar shape.
pub fn primitive_type(primitive: &Primitive) -> PyType {
    match primitive {
        Primitive::String(Some(StringFormat::DateTime)) => PyType::DateTime,
        Primitive::String(Some(StringFormat::Date)) => PyType::Date,
        Primitive::String(Some(StringFormat::Byte)) => PyType::Base64,
        Primitive::String(Some(StringFormat::Binary)) => PyType::Bytes,
        Primitive::String(_) => PyType::Str,
        Primitive::Integer => PyType::Int,
        Primitive::Number => PyType::Float,
        Primitive::Boolean => PyType::Bool,
        Primitive::Null => PyType::NoneType,
        Primitive::Any => PyType::Any,
    }
}

/// Python literal for an enum value.
pub fn enum_literal(value: &EnumValue) -> PyLiteral {
    match value {
        EnumValue::String(s) => PyLiteral::Str(s.clone()),
        EnumValue::Integer(i) => PyLiteral::Int(*i),
        EnumValue::Float(f) => PyLiteral::Float(*f),
        EnumValue::Bool(b) => PyLiteral::Bool(*b),
        EnumValue::Null => PyLiteral::None,
    }
}

/// Enum members in declaration order. `null` values are not members; a
/// repeated member name gets a `_2`, `_3`, ... suffix.
pub fn enum_members<'v>(
    casing: &Casing,
    values: impl IntoIterator<Item = (&'v EnumValue, Option<&'v str>)>,
) -> Vec<EnumMember> {
    let mut members: Vec<EnumMember> = Vec::new();
    for (value, description) in values {
        if matches!(value, EnumValue::Null) {
            continue;
        }
        let base = enum_member_name(casing, &value.as_name_source());
        let mut name = base.clone();
        let mut n = 2usize;
        while members.iter().any(|m| m.name == name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        members.push(EnumMember {
            name,
            value: enum_literal(value),
            description: description.map(str::to_string),
        });
    }
    members
}

fn literal_matches(literal: &PyLiteral, value: &Value) -> bool {
    match (literal, value) {
        (PyLiteral::Str(s), Value::String(v)) => s == v,
        (PyLiteral::Int(i), Value::Number(n)) => n.as_i64() == Some(*i),
        (PyLiteral::Float(f), Value::Number(n)) => n.as_f64() == Some(*f),
        (PyLiteral::Bool(b), Value::Bool(v)) => b == v,
        _ => false,
    }
}

fn description_of(schema: &Schema) -> Option<String> {
    schema
        .description
        .clone()
        .or_else(|| flatten(schema).description.clone())
}

/// Builds class definitions for one component at a time.
#[derive(Debug)]
pub struct TypeSynthesizer<'s, 'c> {
    resolver: Resolver<'s>,
    ctx: &'c mut GenerationContext,
    /// Module of the component being synthesized; owns every nested class.
    module: String,
}

impl<'s, 'c> TypeSynthesizer<'s, 'c> {
    /// Synthesizer writing names and the nested-type registry into `ctx`.
    pub fn new(resolver: Resolver<'s>, ctx: &'c mut GenerationContext) -> Self {
        Self {
            resolver,
            ctx,
            module: String::new(),
        }
    }

    /// Definition for one admitted component, nested classes included.
    pub fn synthesize(
        &mut self,
        entry: &ComponentEntry,
        schema: &'s Schema,
    ) -> Result<TypeDefinition, GenError> {
        self.module.clone_from(&entry.module);
        let location = component_location(&entry.raw_name);
        let classified = classify(schema, &location)?;

        let mut def = match &classified.kind {
            ShapeKind::Primitive(_)
            | ShapeKind::ArrayOf(_)
            | ShapeKind::MapOf(_)
            | ShapeKind::RefAlias(_) => {
                let hint = if matches!(classified.kind, ShapeKind::ArrayOf(_)) {
                    format!("{}Item", entry.name)
                } else {
                    entry.name.clone()
                };
                let mut nested = Vec::new();
                let target = self.classified_annotation(&classified, &hint, &mut nested)?;
                let mut def = TypeDefinition::new(&entry.name, TypeDefKind::Alias { target });
                def.nested = nested;
                def
            }
            _ => self.definition(&entry.name, &classified)?,
        };
        def.description = description_of(schema);
        Ok(def)
    }

    /// Annotation for the schema at `location`, creating a nested class when
    /// the shape needs one.
    fn annotation(
        &mut self,
        schema: &'s Schema,
        location: &str,
        hint: &str,
        nested: &mut Vec<TypeDefinition>,
    ) -> Result<PyType, GenError> {
        let classified = classify(schema, location)?;
        self.classified_annotation(&classified, hint, nested)
    }

    fn classified_annotation(
        &mut self,
        classified: &Classified<'s>,
        hint: &str,
        nested: &mut Vec<TypeDefinition>,
    ) -> Result<PyType, GenError> {
        let ty = match &classified.kind {
            ShapeKind::RefAlias(reference) => PyType::Named(self.component_name(reference)?),
            ShapeKind::Primitive(primitive) => primitive_type(primitive),
            ShapeKind::ArrayOf(items) => {
                let item = match items {
                    Some(items) => self.annotation(
                        items,
                        &format!("{}/items", classified.location),
                        hint,
                        nested,
                    )?,
                    None => PyType::Any,
                };
                PyType::List(Box::new(item))
            }
            ShapeKind::MapOf(values) => {
                let value = match values {
                    Some(values) => self.annotation(
                        values,
                        &format!("{}/additionalProperties", classified.location),
                        &format!("{hint}Value"),
                        nested,
                    )?,
                    None => PyType::Any,
                };
                PyType::Dict(Box::new(value))
            }
            _ => {
                let name = self.ctx.claim(hint);
                self.ctx.register(&classified.location, &name, &self.module);
                let mut def = self.definition(&name, classified)?;
                def.description = classified.node.description.clone();
                nested.push(def);
                PyType::Named(name)
            }
        };
        Ok(if classified.nullable { ty.optional() } else { ty })
    }

    fn component_name(&self, reference: &str) -> Result<String, GenError> {
        let resolved = self.resolver.resolve(reference)?;
        self.ctx
            .component(resolved.raw_name)
            .map(|c| c.name.clone())
            .ok_or_else(|| GenError::unresolved(reference, "component was not admitted"))
    }

    fn definition(
        &mut self,
        name: &str,
        classified: &Classified<'s>,
    ) -> Result<TypeDefinition, GenError> {
        let keyword = classified
            .node
            .union_branches()
            .map_or("oneOf", |(keyword, _)| keyword);
        match &classified.kind {
            ShapeKind::Object(node) => {
                let node: &'s Schema = node;
                let mut nested = Vec::new();
                let mut fields = Vec::new();
                for (property, schema) in node.properties.iter().flatten() {
                    fields.push(self.field(
                        name,
                        node,
                        &classified.location,
                        property,
                        schema,
                        &mut nested,
                    )?);
                }
                let mut def = TypeDefinition::new(name, TypeDefKind::Object { fields });
                def.nested = nested;
                Ok(def)
            }
            ShapeKind::EnumSimple(values) => Ok(TypeDefinition::new(
                name,
                TypeDefKind::Enum {
                    members: enum_members(&self.ctx.casing, values.iter().map(|v| (v, None))),
                },
            )),
            ShapeKind::EnumWithDocs(members) => Ok(TypeDefinition::new(
                name,
                TypeDefKind::Enum {
                    members: enum_members(
                        &self.ctx.casing,
                        members.iter().map(|m| (m.value, m.description)),
                    ),
                },
            )),
            ShapeKind::NestedSingleFieldWrapper(branches) => {
                self.wrapper(name, &classified.location, keyword, branches)
            }
            ShapeKind::TaggedUnion {
                tag,
                content,
                keyword,
                branches,
            } => self.tagged(name, &classified.location, tag, *content, keyword, branches),
            ShapeKind::UntaggedUnion { keyword, branches } => {
                self.untagged(name, &classified.location, keyword, branches)
            }
            ShapeKind::Primitive(_)
            | ShapeKind::ArrayOf(_)
            | ShapeKind::MapOf(_)
            | ShapeKind::RefAlias(_) => {
                let mut nested = Vec::new();
                let target = self.classified_annotation(classified, name, &mut nested)?;
                let mut def = TypeDefinition::new(name, TypeDefKind::Alias { target });
                def.nested = nested;
                Ok(def)
            }
        }
    }

    fn field(
        &mut self,
        owner: &str,
        node: &'s Schema,
        location: &str,
        property: &str,
        schema: &'s Schema,
        nested: &mut Vec<TypeDefinition>,
    ) -> Result<FieldDef, GenError> {
        let hint = format!("{owner}{}", self.ctx.casing.pascal(property));
        let ty = self.annotation(schema, &property_location(location, property), &hint, nested)?;
        Ok(self.finish_field(property, schema, ty, node.is_required(property)))
    }

    fn finish_field(
        &self,
        property: &str,
        schema: &'s Schema,
        ty: PyType,
        required: bool,
    ) -> FieldDef {
        let (name, alias) = field_identifier(&self.ctx.casing, property);
        let explicit = flatten(schema)
            .default
            .as_ref()
            .or(schema.default.as_ref())
            .filter(|v| !v.is_null())
            .and_then(|value| self.default_expr(value, schema, &ty));
        let nullable = ty.is_optional();
        let (ty, default) = match explicit {
            Some(expr) if required => (ty, FieldDefault::Value(expr)),
            Some(expr) => (ty.optional(), FieldDefault::Value(expr)),
            None if required && !nullable => (ty, FieldDefault::Required),
            None => (ty.optional(), FieldDefault::Null),
        };
        FieldDef {
            name,
            alias,
            ty,
            default,
            description: description_of(schema),
        }
    }

    /// A schema `default` as a Python expression. Only scalars and enum
    /// members are rendered.
    fn default_expr(&self, value: &Value, schema: &'s Schema, ty: &PyType) -> Option<PyExpr> {
        let base = match ty {
            PyType::Optional(inner) => inner.as_ref(),
            other => other,
        };
        match (base, value) {
            (PyType::Str, Value::String(s)) => Some(PyExpr::str(s.clone())),
            (PyType::Int, Value::Number(n)) => n.as_i64().map(|i| PyExpr::Literal(PyLiteral::Int(i))),
            (PyType::Float, Value::Number(n)) => {
                n.as_f64().map(|f| PyExpr::Literal(PyLiteral::Float(f)))
            }
            (PyType::Bool, Value::Bool(b)) => Some(PyExpr::Literal(PyLiteral::Bool(*b))),
            (PyType::Named(name), _) => {
                let (_, node) = self.resolver.resolve_deep(schema).ok()?;
                let values = node.enum_values.as_deref()?;
                enum_members(&self.ctx.casing, values.iter().map(|v| (v, None)))
                    .into_iter()
                    .find(|m| literal_matches(&m.value, value))
                    .map(|m| PyExpr::Attr {
                        base: name.clone(),
                        attr: m.name,
                    })
            }
            _ => None,
        }
    }

    fn wrapper(
        &mut self,
        name: &str,
        location: &str,
        keyword: &str,
        branches: &[WrapperBranch<'s>],
    ) -> Result<TypeDefinition, GenError> {
        let mut nested = Vec::new();
        let mut variants = Vec::with_capacity(branches.len());
        for branch in branches {
            match *branch {
                WrapperBranch::Field {
                    index,
                    property,
                    schema,
                } => {
                    let variant_location = format!("{location}/{keyword}/{index}");
                    let property_pascal = self.ctx.casing.pascal(property);
                    let variant_name = self.ctx.claim(&format!("Option{property_pascal}"));
                    self.ctx.register(&variant_location, &variant_name, &self.module);

                    let mut variant_nested = Vec::new();
                    let ty = self.annotation(
                        schema,
                        &property_location(&variant_location, property),
                        &format!("{property_pascal}Data"),
                        &mut variant_nested,
                    )?;
                    let field = self.finish_field(property, schema, ty, true);
                    let mut variant =
                        TypeDefinition::new(&variant_name, TypeDefKind::Object { fields: vec![field] });
                    variant.nested = variant_nested;
                    nested.push(variant);
                    variants.push(PyType::Named(variant_name));
                }
                WrapperBranch::Unit { value, .. } => {
                    variants.push(PyType::Literal(vec![enum_literal(value)]));
                }
            }
        }
        let mut def = TypeDefinition::new(name, TypeDefKind::Wrapper { variants });
        def.nested = nested;
        Ok(def)
    }

    fn tagged(
        &mut self,
        name: &str,
        location: &str,
        tag: &str,
        content: Option<&str>,
        keyword: &str,
        branches: &[(usize, &'s Schema)],
    ) -> Result<TypeDefinition, GenError> {
        let (tag_field, tag_alias) = field_identifier(&self.ctx.casing, tag);
        let mut variants = Vec::with_capacity(branches.len());

        for &(index, branch) in branches {
            let variant_location = format!("{location}/{keyword}/{index}");
            let tag_value = branch
                .properties
                .as_ref()
                .and_then(|props| props.get(tag))
                .and_then(|prop| flatten(prop).single_enum_value())
                .ok_or_else(|| {
                    GenError::unknown_shape(&variant_location, format!("no value for tag '{tag}'"))
                })?;
            let tag_pascal = self.ctx.casing.pascal(&tag_value.as_name_source());
            let tag_literal = enum_literal(tag_value);
            let variant_name = self.ctx.claim(&format!("Option{tag_pascal}"));
            self.ctx.register(&variant_location, &variant_name, &self.module);

            let mut variant_nested = Vec::new();
            let mut payload = None;
            let mut fields = Vec::new();
            for (property, schema) in branch.properties.iter().flatten() {
                if property == tag {
                    fields.push(FieldDef {
                        name: tag_field.clone(),
                        alias: tag_alias.clone(),
                        ty: PyType::Literal(vec![tag_literal.clone()]),
                        default: FieldDefault::Fixed(tag_literal.clone()),
                        description: None,
                    });
                } else if content == Some(property.as_str()) {
                    let mut owned = Vec::new();
                    let ty = self.annotation(
                        schema,
                        &property_location(&variant_location, property),
                        &format!("{tag_pascal}Data"),
                        &mut owned,
                    )?;
                    payload = owned.pop();
                    variant_nested.append(&mut owned);
                    fields.push(self.finish_field(property, schema, ty, branch.is_required(property)));
                } else {
                    fields.push(self.field(
                        &variant_name,
                        branch,
                        &variant_location,
                        property,
                        schema,
                        &mut variant_nested,
                    )?);
                }
            }

            let mut definition = TypeDefinition::new(&variant_name, TypeDefKind::Object { fields });
            definition.nested = variant_nested;
            definition.description.clone_from(&branch.description);
            variants.push(UnionVariant {
                tag_value: tag_literal,
                definition,
                payload,
            });
        }

        Ok(TypeDefinition::new(
            name,
            TypeDefKind::TaggedUnion {
                tag: tag_field,
                content: content.map(str::to_string),
                variants,
            },
        ))
    }

    fn untagged(
        &mut self,
        name: &str,
        location: &str,
        keyword: &str,
        branches: &[(usize, &'s Schema)],
    ) -> Result<TypeDefinition, GenError> {
        let mut nested = Vec::new();
        let mut variants: Vec<PyType> = Vec::with_capacity(branches.len());
        for &(index, branch) in branches {
            let first_property = branch
                .properties
                .as_ref()
                .and_then(|props| props.keys().next())
                .filter(|_| branch.ref_path.is_none());
            let hint = match first_property {
                Some(property) => format!("Option{}", self.ctx.casing.pascal(property)),
                None => format!("{name}Variant{index}"),
            };
            let ty = self.annotation(branch, &format!("{location}/{keyword}/{index}"), &hint, &mut nested)?;
            if !variants.contains(&ty) {
                variants.push(ty);
            }
        }
        let mut def = TypeDefinition::new(name, TypeDefKind::UntaggedUnion { variants });
        def.nested = nested;
        Ok(def)
    }
}

/// Synthesize every admitted component, in declaration order.
pub fn synthesize_components(
    spec: &OpenApiSpec,
    ctx: &mut GenerationContext,
) -> Result<Vec<(ComponentEntry, TypeDefinition)>, GenError> {
    let resolver = Resolver::new(spec);
    let entries = ctx.components().to_vec();
    let Some(schemas) = spec.schemas() else {
        return Ok(Vec::new());
    };
    let mut synthesizer = TypeSynthesizer::new(resolver, ctx);
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(schema) = schemas.get(&entry.raw_name) else {
            continue;
        };
        let def = synthesizer.synthesize(&entry, schema)?;
        out.push((entry, def));
    }
    for (_, def) in &out {
        if !matches!(def.kind, TypeDefKind::Object { .. } | TypeDefKind::Enum { .. }) {
            ctx.mark_root_model(&def.name);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::openapi::ir::emit::Emit;

    fn synthesize(schemas: &str) -> (Vec<(ComponentEntry, TypeDefinition)>, GenerationContext) {
        let spec = OpenApiSpec::from_json(&format!(
            r#"{{"openapi":"3.0.3","paths":{{}},"components":{{"schemas":{schemas}}}}}"#
        ))
        .unwrap();
        let mut ctx = GenerationContext::new(&spec, &GeneratorConfig::default()).unwrap();
        let defs = synthesize_components(&spec, &mut ctx).unwrap();
        (defs, ctx)
    }

    fn render(def: &TypeDefinition) -> String {
        def.emission_order()
            .iter()
            .map(|d| d.emit())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_enum_members() {
        let (defs, _) =
            synthesize(r#"{"Status":{"type":"string","enum":["pending","completed","failed"]}}"#);
        let TypeDefKind::Enum { members } = &defs[0].1.kind else {
            panic!("expected enum");
        };
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["PENDING", "COMPLETED", "FAILED"]);
        let py = render(&defs[0].1);
        assert!(py.contains("COMPLETED = \"completed\""));
        assert!(py.contains("return str(self.value)"));
    }

    #[test]
    fn test_enum_member_collisions_and_numbers() {
        let (defs, _) = synthesize(r#"{"Odd":{"type":"string","enum":["a-b","a_b","1","9",null]}}"#);
        let TypeDefKind::Enum { members } = &defs[0].1.kind else {
            panic!("expected enum");
        };
        let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["A_B", "A_B_2", "ONE", "VAL_9"]);
    }

    #[test]
    fn test_object_fields_and_nested_names() {
        let (defs, ctx) = synthesize(
            r#"{"Widget":{"type":"object","required":["id"],"properties":{
                "id":{"type":"string","format":"uuid"},
                "type":{"type":"string","enum":["a","b"],"default":"b"},
                "content-type":{"type":"string"},
                "tags":{"type":"array","items":{"type":"object","properties":{"k":{"type":"string"}}}},
                "labels":{"type":"object","additionalProperties":{"type":"string","enum":["x"]}},
                "created":{"type":"string","format":"date-time","nullable":true}
            }}}"#,
        );
        let def = &defs[0].1;
        let nested: Vec<&str> = def.nested.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(nested, ["WidgetType", "WidgetTags", "WidgetLabelsValue"]);
        assert_eq!(
            ctx.synthesized_at("#/components/schemas/Widget/properties/tags/items")
                .unwrap()
                .name,
            "WidgetTags"
        );

        let py = render(def);
        assert!(py.contains("    id: str\n"));
        assert!(py.contains("    type: Optional[WidgetType] = WidgetType.B\n"));
        assert!(py.contains(
            "    content_type: Optional[str] = Field(default=None, alias=\"content-type\")\n"
        ));
        assert!(py.contains("    tags: Optional[List[WidgetTags]] = None\n"));
        assert!(py.contains("    labels: Optional[Dict[str, WidgetLabelsValue]] = None\n"));
        assert!(py.contains("    created: Optional[datetime.datetime] = None\n"));
    }

    #[test]
    fn test_tag_and_content_union() {
        let (defs, ctx) = synthesize(
            r#"{"Shape":{"oneOf":[
                {"type":"object","required":["type","value"],"properties":{
                    "type":{"type":"string","enum":["circle"]},
                    "value":{"type":"object","properties":{"radius":{"type":"number"}}}}},
                {"type":"object","required":["type","value"],"properties":{
                    "type":{"type":"string","enum":["square"]},
                    "value":{"type":"object","properties":{"side":{"type":"number"}}}}}
            ]}}"#,
        );
        let def = &defs[0].1;
        let TypeDefKind::TaggedUnion {
            tag,
            content,
            variants,
        } = &def.kind
        else {
            panic!("expected tagged union");
        };
        assert_eq!(tag, "type");
        assert_eq!(content.as_deref(), Some("value"));
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].definition.name, "OptionCircle");
        assert_eq!(variants[0].payload.as_ref().unwrap().name, "CircleData");
        assert_eq!(variants[1].payload.as_ref().unwrap().name, "SquareData");
        assert_eq!(
            ctx.synthesized_at("#/components/schemas/Shape/oneOf/1").unwrap().name,
            "OptionSquare"
        );

        let py = render(def);
        assert!(py.contains("class OptionCircle(BaseModel):\n    type: Literal[\"circle\"] = \"circle\"\n"));
        assert!(py.contains("    value: SquareData\n"));
        assert!(py.contains("Field(discriminator=\"type\")"));
    }

    #[test]
    fn test_wrapper_variants() {
        let (defs, _) = synthesize(
            r#"{"PathCommand":{"oneOf":[
                {"type":"object","required":["move_to"],"properties":{"move_to":{"type":"object","properties":{"x":{"type":"number"}}}}},
                {"type":"string","enum":["close"]}
            ]}}"#,
        );
        let def = &defs[0].1;
        let TypeDefKind::Wrapper { variants } = &def.kind else {
            panic!("expected wrapper");
        };
        assert_eq!(variants[0], PyType::Named("OptionMoveTo".into()));
        assert_eq!(variants[1], PyType::Literal(vec![PyLiteral::Str("close".into())]));
        assert_eq!(def.nested[0].nested[0].name, "MoveToData");
        assert!(render(def).contains("    root: Union[OptionMoveTo, Literal[\"close\"]]\n"));
    }

    #[test]
    fn test_untagged_union_names_branches() {
        let (defs, _) = synthesize(
            r##"{"Other":{"type":"string"},
                "Mixed":{"anyOf":[
                    {"$ref":"#/components/schemas/Other"},
                    {"type":"object","properties":{"count":{"type":"integer"}}},
                    {"type":"string","enum":["x","y"]}
                ]}}"##,
        );
        let def = &defs[1].1;
        let TypeDefKind::UntaggedUnion { variants } = &def.kind else {
            panic!("expected untagged union");
        };
        assert_eq!(
            variants,
            &vec![
                PyType::Named("Other".into()),
                PyType::Named("OptionCount".into()),
                PyType::Named("MixedVariant2".into()),
            ]
        );
    }

    #[test]
    fn test_name_collisions_are_numbered() {
        let (defs, _) = synthesize(
            r#"{"WidgetType":{"type":"string"},
                "Widget":{"type":"object","properties":{"type":{"type":"string","enum":["a"]}}}}"#,
        );
        assert_eq!(defs[1].1.nested[0].name, "WidgetType2");
    }

    #[test]
    fn test_aliases() {
        let (defs, _) = synthesize(
            r##"{"Id":{"type":"string","format":"uuid","description":"An id."},
                "Ids":{"type":"array","items":{"$ref":"#/components/schemas/Id"}},
                "Blob":{"type":"string","format":"byte"}}"##,
        );
        assert_eq!(
            defs[0].1.emit(),
            "class Id(RootModel):\n    \"\"\"An id.\"\"\"\n\n    root: str\n"
        );
        assert!(defs[1].1.emit().contains("root: List[Id]"));
        assert!(defs[2].1.emit().contains("root: Base64Data"));
    }

    #[test]
    fn test_unresolved_reference_is_fatal() {
        let spec = OpenApiSpec::from_json(
            r##"{"openapi":"3.0.3","paths":{},"components":{"schemas":{
                "Broken":{"type":"object","properties":{"x":{"$ref":"#/definitions/Nope"}}}}}}"##,
        )
        .unwrap();
        let mut ctx = GenerationContext::new(&spec, &GeneratorConfig::default()).unwrap();
        let err = synthesize_components(&spec, &mut ctx).unwrap_err();
        assert!(matches!(err, GenError::UnresolvedReference { .. }), "got {err:?}");
    }
}
