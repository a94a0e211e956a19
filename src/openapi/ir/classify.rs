//! Shape classification.
//!
//! `classify` maps one schema node to exactly one [`ShapeKind`]. Union
//! patterns are tried in a fixed order and each pattern must hold for every
//! branch:
//!
//! 1. nested single-field wrapper
//! 2. enum with per-member docs
//! 3. tagged union (tag-only or tag + content)
//! 4. untagged union
//!
//! An ambiguous discriminant downgrades to the untagged form instead of failing.

use tracing::debug;

use super::resolve::flatten;
use crate::error::GenError;
use crate::openapi::spec::{AdditionalProperties, EnumValue, Schema};

/// String `format` values with dedicated handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    /// `uuid`
    Uuid,
    /// `date-time`
    DateTime,
    /// `date`
    Date,
    /// `byte`, base64 text
    Byte,
    /// `binary`, raw bytes
    Binary,
    /// `email`
    Email,
    /// `uri` or `url`
    Uri,
    /// Any other format, kept verbatim.
    Other(String),
}

impl StringFormat {
    fn parse(format: &str) -> Self {
        match format {
            "uuid" => Self::Uuid,
            "date-time" => Self::DateTime,
            "date" => Self::Date,
            "byte" => Self::Byte,
            "binary" => Self::Binary,
            "email" => Self::Email,
            "uri" | "url" => Self::Uri,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Scalar shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// `type: string`, with its format if any.
    String(Option<StringFormat>),
    /// `type: integer`
    Integer,
    /// `type: number`
    Number,
    /// `type: boolean`
    Boolean,
    /// `type: null`
    Null,
    /// No constraints at all.
    Any,
}

/// One branch of a nested single-field wrapper.
#[derive(Debug, Clone, Copy)]
pub enum WrapperBranch<'a> {
    /// `{type: object, properties: {name: schema}}`
    Field {
        /// Position in the union.
        index: usize,
        /// The single property name.
        property: &'a str,
        /// The property's schema.
        schema: &'a Schema,
    },
    /// `{type: string, enum: [value]}`
    Unit {
        /// Position in the union.
        index: usize,
        /// The single enum value.
        value: &'a EnumValue,
    },
}

/// One member of an enum assembled from documented single-value branches.
#[derive(Debug, Clone, Copy)]
pub struct DocumentedMember<'a> {
    /// The member's value.
    pub value: &'a EnumValue,
    /// The branch description.
    pub description: Option<&'a str>,
}

/// The canonical shape of a schema node.
#[derive(Debug, Clone)]
pub enum ShapeKind<'a> {
    /// A scalar.
    Primitive(Primitive),
    /// `enum` without per-member docs.
    EnumSimple(&'a [EnumValue]),
    /// A union of single-value enums, each carrying a description.
    EnumWithDocs(Vec<DocumentedMember<'a>>),
    /// An object with named properties.
    Object(&'a Schema),
    /// Every branch is a single-property object or a single-value enum.
    NestedSingleFieldWrapper(Vec<WrapperBranch<'a>>),
    /// Every branch carries the same single-valued discriminant.
    TaggedUnion {
        /// Discriminant property.
        tag: &'a str,
        /// Payload property, when every branch has exactly tag + content.
        content: Option<&'a str>,
        /// Union keyword the branches came from (`oneOf` or `anyOf`).
        keyword: &'static str,
        /// Branch positions and schemas.
        branches: Vec<(usize, &'a Schema)>,
    },
    /// Any other union.
    UntaggedUnion {
        /// Union keyword the branches came from (`oneOf` or `anyOf`).
        keyword: &'static str,
        /// Branch positions and schemas.
        branches: Vec<(usize, &'a Schema)>,
    },
    /// `type: array`, with its item schema.
    ArrayOf(Option<&'a Schema>),
    /// An object with only `additionalProperties`.
    MapOf(Option<&'a Schema>),
    /// A bare `$ref`.
    RefAlias(&'a str),
}

/// Classification result.
#[derive(Debug, Clone)]
pub struct Classified<'a> {
    /// The shape.
    pub kind: ShapeKind<'a>,
    /// The node also admits `null`.
    pub nullable: bool,
    /// The node actually classified, after `allOf` flattening and null-branch stripping.
    pub node: &'a Schema,
    /// Location pointer of `node`; differs from the input when a nullable union collapsed.
    pub location: String,
}

/// Classify a schema node. `location` is only used in error messages.
pub fn classify<'a>(schema: &'a Schema, location: &str) -> Result<Classified<'a>, GenError> {
    let node = flatten(schema);
    let nullable = node.is_nullable();

    if let Some(all_of) = &node.all_of {
        return Err(GenError::unknown_shape(
            location,
            format!("allOf with {} members is not supported", all_of.len()),
        ));
    }

    if let Some(reference) = &node.ref_path {
        return Ok(Classified {
            kind: ShapeKind::RefAlias(reference),
            nullable,
            node,
            location: location.to_string(),
        });
    }

    if let Some((keyword, branches)) = node.union_branches() {
        let indexed: Vec<(usize, &Schema)> = branches
            .iter()
            .enumerate()
            .filter(|(_, b)| !flatten(b).is_null_type())
            .map(|(i, b)| (i, flatten(b)))
            .collect();
        let had_null = indexed.len() != branches.len();

        if indexed.is_empty() {
            return Ok(Classified {
                kind: ShapeKind::Primitive(Primitive::Null),
                nullable: true,
                node,
                location: location.to_string(),
            });
        }
        if indexed.len() == 1 && (had_null || branches.len() == 1) {
            let (i, only) = indexed[0];
            let inner = classify(only, &format!("{location}/{keyword}/{i}"))?;
            return Ok(Classified {
                nullable: inner.nullable || had_null || nullable,
                ..inner
            });
        }
        return Ok(Classified {
            kind: classify_union(keyword, indexed),
            nullable: nullable || had_null,
            node,
            location: location.to_string(),
        });
    }

    if let Some(values) = node.enum_values.as_deref().filter(|v| !v.is_empty()) {
        return Ok(Classified {
            kind: ShapeKind::EnumSimple(values),
            nullable,
            node,
            location: location.to_string(),
        });
    }

    if let Some(value) = &node.const_value {
        return Ok(Classified {
            kind: ShapeKind::EnumSimple(std::slice::from_ref(value)),
            nullable,
            node,
            location: location.to_string(),
        });
    }

    let declared = node.primary_type().map_err(|types| {
        GenError::unknown_shape(location, format!("multiple non-null types {types:?}"))
    })?;

    let kind = match declared {
        Some("string") => ShapeKind::Primitive(Primitive::String(
            node.format.as_deref().map(StringFormat::parse),
        )),
        Some("integer") => ShapeKind::Primitive(Primitive::Integer),
        Some("number") => ShapeKind::Primitive(Primitive::Number),
        Some("boolean") => ShapeKind::Primitive(Primitive::Boolean),
        Some("null") => ShapeKind::Primitive(Primitive::Null),
        Some("array") => ShapeKind::ArrayOf(node.items.as_deref()),
        Some("object") => object_shape(node),
        None if node.properties.is_some() || node.additional_properties.is_some() => {
            object_shape(node)
        }
        None if node.items.is_some() => ShapeKind::ArrayOf(node.items.as_deref()),
        None => ShapeKind::Primitive(Primitive::Any),
        Some(other) => {
            return Err(GenError::unknown_shape(
                location,
                format!("unsupported type '{other}'"),
            ));
        }
    };

    Ok(Classified {
        kind,
        nullable,
        node,
        location: location.to_string(),
    })
}

fn object_shape(node: &Schema) -> ShapeKind<'_> {
    if node.properties.as_ref().is_some_and(|p| !p.is_empty()) {
        return ShapeKind::Object(node);
    }
    match &node.additional_properties {
        Some(AdditionalProperties::Schema(value)) => ShapeKind::MapOf(Some(value)),
        _ => ShapeKind::MapOf(None),
    }
}

fn classify_union<'a>(keyword: &'static str, branches: Vec<(usize, &'a Schema)>) -> ShapeKind<'a> {
    let schemas: Vec<&Schema> = branches.iter().map(|(_, b)| *b).collect();

    if let Some(wrapper) = wrapper_branches(&branches) {
        return ShapeKind::NestedSingleFieldWrapper(wrapper);
    }

    if let Some(members) = documented_members(&schemas) {
        return ShapeKind::EnumWithDocs(members);
    }

    match discriminant(&schemas) {
        Ok(Some(tag)) => ShapeKind::TaggedUnion {
            tag,
            content: content_field(&schemas, tag),
            keyword,
            branches,
        },
        Ok(None) => ShapeKind::UntaggedUnion { keyword, branches },
        Err(err) => {
            debug!(error = %err, "Falling back to an untagged union.");
            ShapeKind::UntaggedUnion { keyword, branches }
        }
    }
}

fn is_type(schema: &Schema, expected: &str) -> bool {
    matches!(schema.primary_type(), Ok(Some(t)) if t == expected)
}

fn wrapper_branches<'a>(branches: &[(usize, &'a Schema)]) -> Option<Vec<WrapperBranch<'a>>> {
    let mut out = Vec::with_capacity(branches.len());
    let mut has_object = false;
    for &(index, branch) in branches {
        if branch.ref_path.is_some() {
            return None;
        }
        if is_type(branch, "object") {
            let props = branch.properties.as_ref()?;
            if props.len() != 1 {
                return None;
            }
            let (property, schema) = props.iter().next()?;
            has_object = true;
            out.push(WrapperBranch::Field {
                index,
                property,
                schema,
            });
        } else if is_type(branch, "string") {
            match branch.enum_values.as_deref() {
                Some([value]) => out.push(WrapperBranch::Unit { index, value }),
                _ => return None,
            }
        } else {
            return None;
        }
    }
    has_object.then_some(out)
}

fn documented_members<'a>(branches: &[&'a Schema]) -> Option<Vec<DocumentedMember<'a>>> {
    branches
        .iter()
        .map(|branch| {
            if !is_type(branch, "string") || branch.ref_path.is_some() {
                return None;
            }
            match branch.enum_values.as_deref() {
                Some([value]) => Some(DocumentedMember {
                    value,
                    description: branch.description.as_deref(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// The discriminant property shared by every branch, if there is one.
///
/// Returns the property name iff it is present with a single-valued enum in
/// every branch and is the same name across all branches.
pub fn detect_tag(branches: &[&Schema]) -> Option<String> {
    discriminant(branches).ok().flatten().map(str::to_string)
}

/// Candidates come from the first branch in declaration order. A candidate
/// that some branch lacks, or whose values repeat, makes the union ambiguous.
fn discriminant<'a>(branches: &[&'a Schema]) -> Result<Option<&'a str>, GenError> {
    let Some(first) = branches.first() else {
        return Ok(None);
    };
    let Some(first_props) = &first.properties else {
        return Ok(None);
    };
    let candidates: Vec<&str> = first_props
        .iter()
        .filter(|(_, prop)| flatten(prop).single_enum_value().is_some())
        .map(|(name, _)| name.as_str())
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    let mut last_problem = String::new();
    'candidates: for candidate in candidates {
        let mut seen: Vec<&EnumValue> = Vec::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            let value = branch
                .properties
                .as_ref()
                .and_then(|props| props.get(candidate))
                .and_then(|prop| flatten(prop).single_enum_value());
            match value {
                Some(value) if !seen.contains(&value) => seen.push(value),
                Some(_) => {
                    last_problem = format!("branch {i} repeats a value of '{candidate}'");
                    continue 'candidates;
                }
                None => {
                    last_problem =
                        format!("branch {i} has no single-valued '{candidate}' property");
                    continue 'candidates;
                }
            }
        }
        return Ok(Some(candidate));
    }

    Err(GenError::AmbiguousUnionTag {
        reason: last_problem,
    })
}

/// The single non-tag property present in every branch, if exactly one exists.
fn content_field<'a>(branches: &[&'a Schema], tag: &str) -> Option<&'a str> {
    let first = branches.first()?.properties.as_ref()?;
    let mut shared = first
        .keys()
        .filter(|name| name.as_str() != tag)
        .filter(|name| {
            branches.iter().all(|b| {
                b.properties
                    .as_ref()
                    .is_some_and(|props| props.contains_key(name.as_str()))
            })
        });
    let content = shared.next()?;
    shared.next().is_none().then_some(content.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    fn kind_name(kind: &ShapeKind<'_>) -> &'static str {
        match kind {
            ShapeKind::Primitive(_) => "Primitive",
            ShapeKind::EnumSimple(_) => "EnumSimple",
            ShapeKind::EnumWithDocs(_) => "EnumWithDocs",
            ShapeKind::Object(_) => "Object",
            ShapeKind::NestedSingleFieldWrapper(_) => "NestedSingleFieldWrapper",
            ShapeKind::TaggedUnion { .. } => "TaggedUnion",
            ShapeKind::UntaggedUnion { .. } => "UntaggedUnion",
            ShapeKind::ArrayOf(_) => "ArrayOf",
            ShapeKind::MapOf(_) => "MapOf",
            ShapeKind::RefAlias(_) => "RefAlias",
        }
    }

    fn classify_json(json: &str) -> String {
        let s = schema(json);
        kind_name(&classify(&s, "#/test").unwrap().kind).to_string()
    }

    #[test]
    fn test_simple_shapes() {
        assert_eq!(classify_json(r#"{"type":"string"}"#), "Primitive");
        assert_eq!(classify_json(r#"{"type":"string","enum":["a","b"]}"#), "EnumSimple");
        assert_eq!(
            classify_json(r#"{"type":"object","properties":{"a":{"type":"string"}}}"#),
            "Object"
        );
        assert_eq!(classify_json(r#"{"type":"array","items":{"type":"integer"}}"#), "ArrayOf");
        assert_eq!(
            classify_json(r#"{"type":"object","additionalProperties":{"type":"integer"}}"#),
            "MapOf"
        );
        assert_eq!(classify_json(r##"{"$ref":"#/components/schemas/Foo"}"##), "RefAlias");
        assert_eq!(classify_json(r#"{"description":"anything"}"#), "Primitive");
    }

    #[test]
    fn test_string_formats() {
        let s = schema(r#"{"type":"string","format":"date-time"}"#);
        assert!(matches!(
            classify(&s, "#").unwrap().kind,
            ShapeKind::Primitive(Primitive::String(Some(StringFormat::DateTime)))
        ));
    }

    #[test]
    fn test_single_all_of_flattened() {
        assert_eq!(
            classify_json(r##"{"allOf":[{"$ref":"#/components/schemas/Foo"}]}"##),
            "RefAlias"
        );
    }

    #[test]
    fn test_multi_all_of_is_unknown() {
        let s = schema(r#"{"allOf":[{"type":"string"},{"type":"object"}]}"#);
        let err = classify(&s, "#/components/schemas/Mixed").unwrap_err();
        assert!(matches!(err, GenError::UnknownShape { .. }), "got {err:?}");
        assert!(err.to_string().contains("#/components/schemas/Mixed"));
    }

    #[test]
    fn test_unsupported_type_is_unknown() {
        let s = schema(r#"{"type":"file"}"#);
        assert!(matches!(
            classify(&s, "#").unwrap_err(),
            GenError::UnknownShape { .. }
        ));
        let s = schema(r#"{"type":["string","integer"]}"#);
        assert!(classify(&s, "#").is_err());
    }

    #[test]
    fn test_nullable_union_collapses() {
        let s = schema(r##"{"anyOf":[{"$ref":"#/components/schemas/Foo"},{"type":"null"}]}"##);
        let classified = classify(&s, "#").unwrap();
        assert!(classified.nullable);
        assert!(matches!(classified.kind, ShapeKind::RefAlias("#/components/schemas/Foo")));
    }

    #[test]
    fn test_tag_plus_content_union() {
        let s = schema(
            r#"{"oneOf":[
                {"type":"object","properties":{"type":{"type":"string","enum":["circle"]},"value":{"type":"object","properties":{"radius":{"type":"number"}}}},"required":["type","value"]},
                {"type":"object","properties":{"type":{"type":"string","enum":["label"]},"value":{"type":"string"}},"required":["type","value"]}
            ]}"#,
        );
        match classify(&s, "#").unwrap().kind {
            ShapeKind::TaggedUnion {
                tag,
                content,
                branches,
                ..
            } => {
                assert_eq!(tag, "type");
                assert_eq!(content, Some("value"));
                assert_eq!(branches.len(), 2);
            }
            other => panic!("expected tagged union, got {other:?}"),
        }
    }

    #[test]
    fn test_tag_only_union() {
        let s = schema(
            r#"{"oneOf":[
                {"type":"object","properties":{"kind":{"type":"string","enum":["a"]},"x":{"type":"integer"}}},
                {"type":"object","properties":{"kind":{"type":"string","enum":["b"]},"y":{"type":"integer"},"z":{"type":"integer"}}}
            ]}"#,
        );
        match classify(&s, "#").unwrap().kind {
            ShapeKind::TaggedUnion { tag, content, .. } => {
                assert_eq!(tag, "kind");
                assert_eq!(content, None);
            }
            other => panic!("expected tagged union, got {other:?}"),
        }
    }

    #[test]
    fn test_wrapper_beats_tagged_union() {
        // Each branch has exactly one property, which is also a single-valued enum.
        let s = schema(
            r#"{"oneOf":[
                {"type":"object","properties":{"type":{"type":"string","enum":["a"]}}},
                {"type":"object","properties":{"type":{"type":"string","enum":["b"]}}}
            ]}"#,
        );
        let branches: Vec<&Schema> = s.one_of.as_ref().unwrap().iter().collect();
        assert_eq!(detect_tag(&branches), Some("type".to_string()));
        assert_eq!(
            kind_name(&classify(&s, "#").unwrap().kind),
            "NestedSingleFieldWrapper"
        );
    }

    #[test]
    fn test_wrapper_with_unit_branches() {
        let s = schema(
            r#"{"oneOf":[
                {"type":"object","properties":{"move_to":{"type":"object","properties":{"x":{"type":"number"}}}}},
                {"type":"string","enum":["start_path"]}
            ]}"#,
        );
        match classify(&s, "#").unwrap().kind {
            ShapeKind::NestedSingleFieldWrapper(branches) => {
                assert!(matches!(branches[0], WrapperBranch::Field { property: "move_to", .. }));
                assert!(matches!(branches[1], WrapperBranch::Unit { index: 1, .. }));
            }
            other => panic!("expected wrapper, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_with_docs() {
        let s = schema(
            r#"{"oneOf":[
                {"type":"string","enum":["mm"],"description":"Millimeters."},
                {"type":"string","enum":["in"],"description":"Inches."}
            ]}"#,
        );
        match classify(&s, "#").unwrap().kind {
            ShapeKind::EnumWithDocs(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[1].description, Some("Inches."));
            }
            other => panic!("expected enum with docs, got {other:?}"),
        }
    }

    #[test]
    fn test_one_bad_branch_invalidates_pattern() {
        // Third branch has two properties, so no wrapper; its tag has two values, so ambiguous.
        let s = schema(
            r#"{"oneOf":[
                {"type":"object","properties":{"type":{"type":"string","enum":["a"]}}},
                {"type":"object","properties":{"type":{"type":"string","enum":["b"]}}},
                {"type":"object","properties":{"type":{"type":"string","enum":["c","d"]},"x":{"type":"string"}}}
            ]}"#,
        );
        assert_eq!(kind_name(&classify(&s, "#").unwrap().kind), "UntaggedUnion");
    }

    #[test]
    fn test_detect_tag_soundness() {
        let agree = schema(
            r#"{"oneOf":[
                {"properties":{"t":{"enum":["a"]},"n":{"type":"integer"}}},
                {"properties":{"t":{"const":"b"}}}
            ]}"#,
        );
        let branches: Vec<&Schema> = agree.one_of.as_ref().unwrap().iter().collect();
        assert_eq!(detect_tag(&branches), Some("t".to_string()));

        let missing = schema(
            r#"{"oneOf":[
                {"properties":{"t":{"enum":["a"]}}},
                {"properties":{"u":{"enum":["b"]}}}
            ]}"#,
        );
        let branches: Vec<&Schema> = missing.one_of.as_ref().unwrap().iter().collect();
        assert_eq!(detect_tag(&branches), None);

        let repeated = schema(
            r#"{"oneOf":[
                {"properties":{"t":{"enum":["a"]}}},
                {"properties":{"t":{"enum":["a"]}}}
            ]}"#,
        );
        let branches: Vec<&Schema> = repeated.one_of.as_ref().unwrap().iter().collect();
        assert_eq!(detect_tag(&branches), None);

        let no_candidates = schema(r#"{"oneOf":[{"properties":{"x":{"type":"string"}}}]}"#);
        let branches: Vec<&Schema> = no_candidates.one_of.as_ref().unwrap().iter().collect();
        assert_eq!(detect_tag(&branches), None);
    }

    #[test]
    fn test_ref_branch_makes_union_untagged() {
        let s = schema(
            r##"{"oneOf":[
                {"$ref":"#/components/schemas/A"},
                {"type":"object","properties":{"type":{"enum":["b"]},"x":{"type":"string"}}}
            ]}"##,
        );
        assert_eq!(kind_name(&classify(&s, "#").unwrap().kind), "UntaggedUnion");
    }
}
