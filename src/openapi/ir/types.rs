//! Python IR types for code generation.
//!
//! This module defines the Python representation the synthesizers produce:
//! - PyType: type annotations (primitives, containers, unions, literals)
//! - PyExpr: expressions used for defaults and example values
//! - TypeDefinition: one generated class with the nested classes it owns
//! - ImportSet: per-file import deduplication

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Python literal values
#[derive(Debug, Clone, PartialEq)]
pub enum PyLiteral {
    /// `"..."`
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
}

/// Python type annotation
#[derive(Debug, Clone, PartialEq)]
pub enum PyType {
    /// `str`
    Str,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `bool`
    Bool,
    /// `bytes`
    Bytes,
    /// `Any`
    Any,
    /// `None` in a return position
    NoneType,
    /// `datetime.datetime`
    DateTime,
    /// `datetime.date`
    Date,
    /// Support type for base64 payloads
    Base64,
    /// Generated class
    Named(String),
    /// `List[T]`
    List(Box<PyType>),
    /// `Dict[str, T]`
    Dict(Box<PyType>),
    /// `Optional[T]`
    Optional(Box<PyType>),
    /// `Union[...]`; a single member renders bare
    Union(Vec<PyType>),
    /// `Literal[...]`
    Literal(Vec<PyLiteral>),
}

impl PyType {
    /// Wrap in `Optional`, unless already optional.
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) | Self::Any | Self::NoneType => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Build a union, dropping duplicates and collapsing one member.
    pub fn union(types: Vec<PyType>) -> Self {
        let mut members: Vec<PyType> = Vec::with_capacity(types.len());
        for ty in types {
            if !members.contains(&ty) {
                members.push(ty);
            }
        }
        if members.len() == 1 {
            return members.remove(0);
        }
        Self::Union(members)
    }

    /// Whether this is `Optional[...]`.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }

    /// Generated class names referenced anywhere in this type.
    pub fn named_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Named(name) => out.push(name),
            Self::List(inner) | Self::Dict(inner) | Self::Optional(inner) => inner.named_refs(out),
            Self::Union(members) => members.iter().for_each(|m| m.named_refs(out)),
            _ => {}
        }
    }

    /// `typing` names this annotation needs.
    pub fn typing_names(&self, out: &mut BTreeSet<&'static str>) {
        match self {
            Self::Any => {
                out.insert("Any");
            }
            Self::List(inner) => {
                out.insert("List");
                inner.typing_names(out);
            }
            Self::Dict(inner) => {
                out.insert("Dict");
                inner.typing_names(out);
            }
            Self::Optional(inner) => {
                out.insert("Optional");
                inner.typing_names(out);
            }
            Self::Union(members) => {
                if members.len() > 1 {
                    out.insert("Union");
                }
                members.iter().for_each(|m| m.typing_names(out));
            }
            Self::Literal(_) => {
                out.insert("Literal");
            }
            _ => {}
        }
    }

    /// Whether the `datetime` module is needed.
    pub fn uses_datetime(&self) -> bool {
        match self {
            Self::DateTime | Self::Date => true,
            Self::List(inner) | Self::Dict(inner) | Self::Optional(inner) => inner.uses_datetime(),
            Self::Union(members) => members.iter().any(Self::uses_datetime),
            _ => false,
        }
    }

    /// Whether the base64 support type is needed.
    pub fn uses_base64(&self) -> bool {
        match self {
            Self::Base64 => true,
            Self::List(inner) | Self::Dict(inner) | Self::Optional(inner) => inner.uses_base64(),
            Self::Union(members) => members.iter().any(Self::uses_base64),
            _ => false,
        }
    }
}

/// Python expression
#[derive(Debug, Clone, PartialEq)]
pub enum PyExpr {
    /// A literal value.
    Literal(PyLiteral),
    /// Byte string: b"..."
    Bytes(String),
    /// Pre-rendered code: datetime.datetime.now()
    Raw(String),
    /// Attribute access on a name: Status.PENDING
    Attr {
        /// Object name.
        base: String,
        /// Attribute name.
        attr: String,
    },
    /// Call with positional and keyword arguments
    Call {
        /// Callee, as written.
        func: String,
        /// Positional arguments.
        args: Vec<PyExpr>,
        /// Keyword arguments, in order.
        kwargs: Vec<(String, PyExpr)>,
    },
    /// `[...]`
    List(Vec<PyExpr>),
    /// `{key: value, ...}`
    Dict(Vec<(PyExpr, PyExpr)>),
}

impl PyExpr {
    /// String literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::Literal(PyLiteral::Str(value.into()))
    }

    /// Call with positional arguments only.
    pub fn call(func: impl Into<String>, args: Vec<PyExpr>) -> Self {
        Self::Call {
            func: func.into(),
            args,
            kwargs: Vec::new(),
        }
    }
}

/// Default of a model field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// No default: the field must be supplied.
    Required,
    /// `= None`
    Null,
    /// `= <expr>` taken from the schema's `default`
    Value(PyExpr),
    /// Discriminant pinned to one value: `Literal["x"] = "x"`
    Fixed(PyLiteral),
}

/// One field of a generated model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Python attribute name.
    pub name: String,
    /// JSON key when it differs from `name`.
    pub alias: Option<String>,
    /// Annotation.
    pub ty: PyType,
    /// Default value, if any.
    pub default: FieldDefault,
    /// Emitted as an attribute docstring.
    pub description: Option<String>,
}

/// One member of a generated enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// SCREAMING_SNAKE member name.
    pub name: String,
    /// Raw enum value.
    pub value: PyLiteral,
    /// Emitted as an attribute docstring.
    pub description: Option<String>,
}

/// One variant of a tagged union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    /// Raw discriminant value.
    pub tag_value: PyLiteral,
    /// The variant model; its discriminant field is `FieldDefault::Fixed`.
    pub definition: TypeDefinition,
    /// Payload model for tag+content unions with an inline object payload.
    pub payload: Option<TypeDefinition>,
}

/// Kind of a generated class.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// pydantic `BaseModel`
    Object {
        /// Fields in declaration order.
        fields: Vec<FieldDef>,
    },
    /// `(str, Enum)` or plain `Enum`
    Enum {
        /// Members in declaration order.
        members: Vec<EnumMember>,
    },
    /// `RootModel` over single-field variant models and literal units
    Wrapper {
        /// One annotation per branch.
        variants: Vec<PyType>,
    },
    /// `RootModel` over an annotated discriminated union
    TaggedUnion {
        /// Discriminant field name.
        tag: String,
        /// Payload field name for tag + content unions.
        content: Option<String>,
        /// One model per branch.
        variants: Vec<UnionVariant>,
    },
    /// `RootModel` over a plain union
    UntaggedUnion {
        /// One annotation per branch.
        variants: Vec<PyType>,
    },
    /// `RootModel` over any other annotation
    Alias {
        /// The wrapped annotation.
        target: PyType,
    },
}

/// A generated class plus the nested classes it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// Class name.
    pub name: String,
    /// Emitted as the class docstring.
    pub description: Option<String>,
    /// What kind of class this is.
    pub kind: TypeDefKind,
    /// Inline classes this one refers to, emitted before it in the same file.
    pub nested: Vec<TypeDefinition>,
}

impl TypeDefinition {
    /// A definition with no description and no nested classes.
    pub fn new(name: impl Into<String>, kind: TypeDefKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            nested: Vec::new(),
        }
    }

    /// This definition and everything it owns, dependencies first.
    pub fn emission_order(&self) -> Vec<&TypeDefinition> {
        let mut out = Vec::new();
        self.collect_order(&mut out);
        out
    }

    fn collect_order<'a>(&'a self, out: &mut Vec<&'a TypeDefinition>) {
        for nested in &self.nested {
            nested.collect_order(out);
        }
        if let TypeDefKind::TaggedUnion { variants, .. } = &self.kind {
            for variant in variants {
                if let Some(payload) = &variant.payload {
                    payload.collect_order(out);
                }
                variant.definition.collect_order(out);
            }
        }
        out.push(self);
    }

    /// Annotations appearing directly in this class (not in owned classes).
    pub fn annotations(&self) -> Vec<&PyType> {
        match &self.kind {
            TypeDefKind::Object { fields } => fields.iter().map(|f| &f.ty).collect(),
            TypeDefKind::Wrapper { variants } | TypeDefKind::UntaggedUnion { variants } => {
                variants.iter().collect()
            }
            TypeDefKind::Alias { target } => vec![target],
            TypeDefKind::Enum { .. } | TypeDefKind::TaggedUnion { .. } => Vec::new(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct PyParam {
    /// Parameter name.
    pub name: String,
    /// Annotation, if any.
    pub ty: Option<PyType>,
    /// Default value, if any.
    pub default: Option<PyExpr>,
}

/// Free function, as used by the examples file.
#[derive(Debug, Clone, PartialEq)]
pub struct PyFunction {
    /// Function name.
    pub name: String,
    /// Parameters in order.
    pub params: Vec<PyParam>,
    /// Return annotation, if any.
    pub return_type: Option<PyType>,
    /// Docstring text.
    pub doc: Option<String>,
    /// Body lines without indentation.
    pub body: Vec<String>,
}

/// Top-level item of a generated file.
#[derive(Debug, Clone, PartialEq)]
pub enum PyItem {
    /// A class and the classes it owns.
    Type(TypeDefinition),
    /// A free function.
    Function(PyFunction),
    /// Already-rendered source, e.g. a templated client class.
    Raw(String),
}

/// One generated Python file.
#[derive(Debug, Clone, Default)]
pub struct PyModule {
    /// Module docstring.
    pub doc: Option<String>,
    /// Import block.
    pub imports: ImportSet,
    /// Top-level items in order.
    pub items: Vec<PyItem>,
}

/// A single import line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PyImport {
    /// `import module`
    Module(String),
    /// `from module import name`
    From {
        /// Dotted module path.
        module: String,
        /// Imported name.
        name: String,
    },
}

impl PyImport {
    /// `from module import name`
    pub fn from(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::From {
            module: module.into(),
            name: name.into(),
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::Module(module) => module,
            Self::From { name, .. } => name,
        }
    }
}

/// Imports of one output file.
///
/// Keyed by the bound name: once a name is imported from any module it is
/// never imported again.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    seen: HashSet<String>,
    modules: BTreeSet<String>,
    from: BTreeMap<String, BTreeSet<String>>,
}

impl ImportSet {
    /// An empty import block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import; returns false when its name was already bound.
    pub fn add(&mut self, import: &PyImport) -> bool {
        if !self.seen.insert(import.key().to_string()) {
            return false;
        }
        match import {
            PyImport::Module(module) => {
                self.modules.insert(module.clone());
            }
            PyImport::From { module, name } => {
                self.from
                    .entry(module.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }
        true
    }

    /// Add several imports.
    pub fn extend<'a>(&mut self, imports: impl IntoIterator<Item = &'a PyImport>) {
        for import in imports {
            self.add(import);
        }
    }

    /// Mark a name as bound locally so nothing imports over it.
    pub fn bind_local(&mut self, name: &str) {
        self.seen.insert(name.to_string());
    }

    /// Whether nothing is imported.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.from.is_empty()
    }

    pub(crate) fn modules(&self) -> impl Iterator<Item = &String> {
        self.modules.iter()
    }

    pub(crate) fn from_imports(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.from.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_union_dedupes_and_collapses() {
        assert_eq!(PyType::union(vec![PyType::Str, PyType::Str]), PyType::Str);
        assert_eq!(
            PyType::union(vec![PyType::Str, PyType::Int, PyType::Str]),
            PyType::Union(vec![PyType::Str, PyType::Int])
        );
    }

    #[test]
    fn test_optional_is_not_nested() {
        let once = PyType::Str.optional();
        assert_eq!(once.clone().optional(), once);
    }

    #[test]
    fn test_import_set_dedupes_by_name() {
        let mut imports = ImportSet::new();
        assert!(imports.add(&PyImport::from("acme.models.user", "User")));
        assert!(!imports.add(&PyImport::from("acme.models", "User")));
        assert!(imports.add(&PyImport::Module("datetime".to_string())));
        assert!(!imports.add(&PyImport::Module("datetime".to_string())));
        let from: Vec<_> = imports.from_imports().collect();
        assert_eq!(from.len(), 1);
        assert_eq!(from[0].0, "acme.models.user");
    }

    #[test]
    fn test_local_names_block_imports() {
        let mut imports = ImportSet::new();
        imports.bind_local("OptionCircle");
        assert!(!imports.add(&PyImport::from("acme.models.shape", "OptionCircle")));
        assert!(imports.is_empty());
    }

    #[test]
    fn test_emission_order_puts_owned_classes_first() {
        let payload = TypeDefinition::new("CircleData", TypeDefKind::Object { fields: vec![] });
        let variant = TypeDefinition::new("OptionCircle", TypeDefKind::Object { fields: vec![] });
        let mut union = TypeDefinition::new(
            "Shape",
            TypeDefKind::TaggedUnion {
                tag: "type".to_string(),
                content: Some("value".to_string()),
                variants: vec![UnionVariant {
                    tag_value: PyLiteral::Str("circle".to_string()),
                    definition: variant,
                    payload: Some(payload),
                }],
            },
        );
        union
            .nested
            .push(TypeDefinition::new("ShapeColor", TypeDefKind::Enum { members: vec![] }));
        let names: Vec<&str> = union.emission_order().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["ShapeColor", "CircleData", "OptionCircle", "Shape"]);
    }
}
