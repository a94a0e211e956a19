//! Python source emission from IR.
//!
//! Every IR node implements [`Emit`]. Layout follows what `ruff format`
//! would leave alone: four-space indentation, two blank lines between
//! top-level definitions, imports grouped stdlib / third-party / local.

use super::naming::{escape_docstring, escape_py_string};
use super::types::{
    EnumMember, FieldDef, FieldDefault, ImportSet, PyExpr, PyFunction, PyItem, PyLiteral,
    PyModule, PyParam, PyType, TypeDefKind, TypeDefinition,
};

/// Emit trait for converting IR nodes to Python source.
pub trait Emit {
    /// Render as Python source.
    fn emit(&self) -> String;
}

const INDENT: &str = "    ";
const LINE_WIDTH: usize = 88;

const STDLIB_MODULES: &[&str] = &["collections.abc", "datetime", "enum", "typing"];
const THIRD_PARTY_MODULES: &[&str] = &["pydantic"];

fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// Render a docstring at the given indentation level, including the trailing newline.
pub fn docstring(text: &str, level: usize) -> String {
    let pad = indent(level);
    let text = escape_docstring(text);
    if text.contains('\n') {
        let mut out = format!("{pad}\"\"\"");
        for (i, line) in text.lines().enumerate() {
            if i > 0 && !line.trim().is_empty() {
                out.push_str(&pad);
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str("\"\"\"\n");
        out
    } else {
        format!("{pad}\"\"\"{text}\"\"\"\n")
    }
}

// =============================================================================
// Literals and Types
// =============================================================================

impl Emit for PyLiteral {
    fn emit(&self) -> String {
        match self {
            PyLiteral::Str(s) => format!("\"{}\"", escape_py_string(s)),
            PyLiteral::Int(i) => i.to_string(),
            PyLiteral::Float(f) => {
                let rendered = f.to_string();
                if rendered.contains(['.', 'e', 'E', 'n', 'i']) {
                    rendered
                } else {
                    format!("{rendered}.0")
                }
            }
            PyLiteral::Bool(true) => "True".to_string(),
            PyLiteral::Bool(false) => "False".to_string(),
            PyLiteral::None => "None".to_string(),
        }
    }
}

impl Emit for PyType {
    fn emit(&self) -> String {
        match self {
            PyType::Str => "str".to_string(),
            PyType::Int => "int".to_string(),
            PyType::Float => "float".to_string(),
            PyType::Bool => "bool".to_string(),
            PyType::Bytes => "bytes".to_string(),
            PyType::Any => "Any".to_string(),
            PyType::NoneType => "None".to_string(),
            PyType::DateTime => "datetime.datetime".to_string(),
            PyType::Date => "datetime.date".to_string(),
            PyType::Base64 => "Base64Data".to_string(),
            PyType::Named(name) => name.clone(),
            PyType::List(inner) => format!("List[{}]", inner.emit()),
            PyType::Dict(inner) => format!("Dict[str, {}]", inner.emit()),
            PyType::Optional(inner) => format!("Optional[{}]", inner.emit()),
            PyType::Union(members) => match members.as_slice() {
                [] => "None".to_string(),
                [single] => single.emit(),
                _ => format!(
                    "Union[{}]",
                    members.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
                ),
            },
            PyType::Literal(values) => format!(
                "Literal[{}]",
                values.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for PyExpr {
    fn emit(&self) -> String {
        match self {
            PyExpr::Literal(lit) => lit.emit(),
            PyExpr::Bytes(s) => format!("b\"{}\"", escape_py_string(s)),
            PyExpr::Raw(code) => code.clone(),
            PyExpr::Attr { base, attr } => format!("{base}.{attr}"),
            PyExpr::Call { func, args, kwargs } => {
                let mut parts: Vec<String> = args.iter().map(Emit::emit).collect();
                parts.extend(kwargs.iter().map(|(k, v)| format!("{k}={}", v.emit())));
                format!("{func}({})", parts.join(", "))
            }
            PyExpr::List(items) => format!(
                "[{}]",
                items.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
            ),
            PyExpr::Dict(entries) => format!(
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.emit(), v.emit()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl PyExpr {
    /// Render an expression that starts `column` characters into a line at
    /// indentation `level`, breaking calls and containers that do not fit.
    pub fn emit_wrapped(&self, level: usize, column: usize) -> String {
        let flat = self.emit();
        if column + flat.len() <= LINE_WIDTH {
            return flat;
        }
        let inner = indent(level + 1);
        let close = indent(level);
        match self {
            PyExpr::Call { func, args, kwargs } if !args.is_empty() || !kwargs.is_empty() => {
                let mut out = format!("{func}(\n");
                for arg in args {
                    out.push_str(&format!("{inner}{},\n", arg.emit_wrapped(level + 1, inner.len())));
                }
                for (key, value) in kwargs {
                    let prefix = format!("{key}=");
                    out.push_str(&format!(
                        "{inner}{prefix}{},\n",
                        value.emit_wrapped(level + 1, inner.len() + prefix.len())
                    ));
                }
                out.push_str(&close);
                out.push(')');
                out
            }
            PyExpr::List(items) if !items.is_empty() => {
                let mut out = "[\n".to_string();
                for item in items {
                    out.push_str(&format!("{inner}{},\n", item.emit_wrapped(level + 1, inner.len())));
                }
                out.push_str(&close);
                out.push(']');
                out
            }
            PyExpr::Dict(entries) if !entries.is_empty() => {
                let mut out = "{\n".to_string();
                for (key, value) in entries {
                    let prefix = format!("{}: ", key.emit());
                    out.push_str(&format!(
                        "{inner}{prefix}{},\n",
                        value.emit_wrapped(level + 1, inner.len() + prefix.len())
                    ));
                }
                out.push_str(&close);
                out.push('}');
                out
            }
            _ => flat,
        }
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for FieldDef {
    fn emit(&self) -> String {
        let ty = self.ty.emit();
        let default = match &self.default {
            FieldDefault::Required => None,
            FieldDefault::Null => Some("None".to_string()),
            FieldDefault::Value(expr) => Some(expr.emit()),
            FieldDefault::Fixed(lit) => Some(lit.emit()),
        };
        let assignment = match (&self.alias, default) {
            (None, None) => String::new(),
            (None, Some(value)) => format!(" = {value}"),
            (Some(alias), None) => format!(" = Field(alias=\"{}\")", escape_py_string(alias)),
            (Some(alias), Some(value)) => format!(
                " = Field(default={value}, alias=\"{}\")",
                escape_py_string(alias)
            ),
        };
        let mut out = format!("{}{}: {ty}{assignment}\n", indent(1), self.name);
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&docstring(description, 1));
        }
        out
    }
}

impl Emit for EnumMember {
    fn emit(&self) -> String {
        let mut out = format!("{}{} = {}\n", indent(1), self.name, self.value.emit());
        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&docstring(description, 1));
        }
        out
    }
}

fn root_model(def: &TypeDefinition, annotation: &str) -> String {
    let mut out = format!("class {}(RootModel):\n", def.name);
    if let Some(description) = def.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str(&docstring(description, 1));
        out.push('\n');
    }
    out.push_str(&format!("{}root: {annotation}\n", indent(1)));
    out
}

impl Emit for TypeDefinition {
    /// Emits this class only; owned classes are emitted by the module.
    fn emit(&self) -> String {
        match &self.kind {
            TypeDefKind::Object { fields } => {
                let mut out = format!("class {}(BaseModel):\n", self.name);
                if let Some(description) =
                    self.description.as_deref().filter(|d| !d.trim().is_empty())
                {
                    out.push_str(&docstring(description, 1));
                    out.push('\n');
                }
                for field in fields {
                    out.push_str(&field.emit());
                }
                if !fields.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!(
                    "{}model_config = ConfigDict(populate_by_name=True, protected_namespaces=())\n",
                    indent(1)
                ));
                out
            }
            TypeDefKind::Enum { members } => {
                let string_valued = members
                    .iter()
                    .all(|m| matches!(m.value, PyLiteral::Str(_)));
                let bases = if string_valued { "str, Enum" } else { "Enum" };
                let mut out = format!("class {}({bases}):\n", self.name);
                if let Some(description) =
                    self.description.as_deref().filter(|d| !d.trim().is_empty())
                {
                    out.push_str(&docstring(description, 1));
                    out.push('\n');
                }
                if members.is_empty() {
                    out.push_str(&format!("{}pass\n", indent(1)));
                    return out;
                }
                for member in members {
                    out.push_str(&member.emit());
                }
                out.push('\n');
                out.push_str(&format!("{}def __str__(self) -> str:\n", indent(1)));
                out.push_str(&format!("{}return str(self.value)\n", indent(2)));
                out
            }
            TypeDefKind::TaggedUnion { tag, variants, .. } => {
                let members: Vec<PyType> = variants
                    .iter()
                    .map(|v| PyType::Named(v.definition.name.clone()))
                    .collect();
                let union = PyType::Union(members).emit();
                let annotation = if variants.len() > 1 {
                    format!(
                        "Annotated[{union}, Field(discriminator=\"{}\")]",
                        escape_py_string(tag)
                    )
                } else {
                    union
                };
                root_model(self, &annotation)
            }
            TypeDefKind::Wrapper { variants } | TypeDefKind::UntaggedUnion { variants } => {
                root_model(self, &PyType::Union(variants.clone()).emit())
            }
            TypeDefKind::Alias { target } => root_model(self, &target.emit()),
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Emit for PyParam {
    fn emit(&self) -> String {
        let mut out = self.name.clone();
        if let Some(ty) = &self.ty {
            out.push_str(&format!(": {}", ty.emit()));
        }
        if let Some(default) = &self.default {
            let sep = if self.ty.is_some() { " = " } else { "=" };
            out.push_str(sep);
            out.push_str(&default.emit());
        }
        out
    }
}

impl Emit for PyFunction {
    fn emit(&self) -> String {
        let params = self.params.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
        let ret = self
            .return_type
            .as_ref()
            .map(|t| format!(" -> {}", t.emit()))
            .unwrap_or_default();
        let mut out = format!("def {}({params}){ret}:\n", self.name);
        if let Some(doc) = self.doc.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str(&docstring(doc, 1));
        }
        if self.body.is_empty() {
            out.push_str(&format!("{}pass\n", indent(1)));
        }
        for line in &self.body {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str(&indent(1));
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }
}

// =============================================================================
// Imports
// =============================================================================

fn module_group(module: &str) -> usize {
    if module == "__future__" {
        0
    } else if STDLIB_MODULES.contains(&module) {
        1
    } else if THIRD_PARTY_MODULES.contains(&module) {
        2
    } else {
        3
    }
}

impl Emit for ImportSet {
    fn emit(&self) -> String {
        let mut groups: [Vec<String>; 4] = Default::default();
        for module in self.modules() {
            groups[module_group(module)].push(format!("import {module}"));
        }
        for (module, names) in self.from_imports() {
            let names = names.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            groups[module_group(module)].push(format!("from {module} import {names}"));
        }
        groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(|g| {
                let mut lines = g.clone();
                // `import x` sorts before `from x import y` within a group.
                lines.sort_by_key(|l| (l.starts_with("from "), l.clone()));
                lines.join("\n") + "\n"
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for PyItem {
    fn emit(&self) -> String {
        match self {
            PyItem::Type(def) => def
                .emission_order()
                .iter()
                .map(|d| d.emit())
                .collect::<Vec<_>>()
                .join("\n\n"),
            PyItem::Function(func) => func.emit(),
            PyItem::Raw(code) => code.trim_end().to_string() + "\n",
        }
    }
}

impl Emit for PyModule {
    fn emit(&self) -> String {
        let mut sections: Vec<String> = Vec::new();
        if let Some(doc) = &self.doc {
            sections.push(docstring(doc, 0));
        }
        if !self.imports.is_empty() {
            sections.push(self.imports.emit());
        }
        let mut output = sections.join("\n");
        for item in &self.items {
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(&item.emit());
        }
        if output.is_empty() {
            return String::new();
        }
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::openapi::ir::types::{PyImport, UnionVariant};

    #[test]
    fn test_emit_literal() {
        assert_eq!(PyLiteral::Str("hello".into()).emit(), "\"hello\"");
        assert_eq!(PyLiteral::Str("say \"hi\"".into()).emit(), "\"say \\\"hi\\\"\"");
        assert_eq!(PyLiteral::Float(3.14).emit(), "3.14");
        assert_eq!(PyLiteral::Float(1.0).emit(), "1.0");
        assert_eq!(PyLiteral::Int(42).emit(), "42");
        assert_eq!(PyLiteral::Bool(false).emit(), "False");
        assert_eq!(PyLiteral::None.emit(), "None");
    }

    #[test]
    fn test_emit_types() {
        assert_eq!(PyType::List(Box::new(PyType::Named("Foo".into()))).emit(), "List[Foo]");
        assert_eq!(PyType::Dict(Box::new(PyType::Int)).emit(), "Dict[str, int]");
        assert_eq!(PyType::Str.optional().emit(), "Optional[str]");
        assert_eq!(PyType::Union(vec![]).optional().emit(), "Optional[None]");
        assert_eq!(
            PyType::Union(vec![PyType::Str, PyType::Int]).emit(),
            "Union[str, int]"
        );
        assert_eq!(
            PyType::Literal(vec![PyLiteral::Str("a".into())]).emit(),
            "Literal[\"a\"]"
        );
    }

    #[test]
    fn test_emit_call_expression() {
        let expr = PyExpr::Call {
            func: "Foo".into(),
            args: vec![],
            kwargs: vec![
                ("name".into(), PyExpr::str("<string>")),
                ("tags".into(), PyExpr::List(vec![PyExpr::str("<string>")])),
            ],
        };
        assert_eq!(expr.emit(), "Foo(name=\"<string>\", tags=[\"<string>\"])");
        assert_eq!(expr.emit_wrapped(0, 0), expr.emit());
    }

    #[test]
    fn test_emit_wrapped_breaks_long_calls() {
        let kwargs = (0..6)
            .map(|i| (format!("field_number_{i}"), PyExpr::str("<string>")))
            .collect();
        let expr = PyExpr::Call {
            func: "Foo".into(),
            args: vec![],
            kwargs,
        };
        let wrapped = expr.emit_wrapped(1, 8);
        assert!(wrapped.starts_with("Foo(\n        field_number_0=\"<string>\",\n"));
        assert!(wrapped.ends_with("\n    )"));
    }

    #[test]
    fn test_emit_object_with_alias_and_default() {
        let def = TypeDefinition::new(
            "Widget",
            TypeDefKind::Object {
                fields: vec![
                    FieldDef {
                        name: "content_type".into(),
                        alias: Some("content-type".into()),
                        ty: PyType::Str,
                        default: FieldDefault::Required,
                        description: None,
                    },
                    FieldDef {
                        name: "count".into(),
                        alias: None,
                        ty: PyType::Int.optional(),
                        default: FieldDefault::Value(PyExpr::Literal(PyLiteral::Int(3))),
                        description: Some("How many.".into()),
                    },
                ],
            },
        );
        let py = def.emit();
        assert!(py.starts_with("class Widget(BaseModel):\n"));
        assert!(py.contains("    content_type: str = Field(alias=\"content-type\")\n"));
        assert!(py.contains("    count: Optional[int] = 3\n    \"\"\"How many.\"\"\"\n"));
        assert!(py.contains(
            "    content_type: str = Field(alias=\"content-type\")\n    count: Optional[int] = 3\n"
        ));
        assert!(py.contains("\"\"\"How many.\"\"\"\n\n    model_config = ConfigDict(populate_by_name=True"));
    }

    #[test]
    fn test_emit_enum_renders_raw_value() {
        let def = TypeDefinition::new(
            "Status",
            TypeDefKind::Enum {
                members: vec![EnumMember {
                    name: "PENDING".into(),
                    value: PyLiteral::Str("pending".into()),
                    description: None,
                }],
            },
        );
        let py = def.emit();
        assert!(py.starts_with("class Status(str, Enum):\n"));
        assert!(py.contains("    PENDING = \"pending\"\n"));
        assert!(py.contains("    def __str__(self) -> str:\n        return str(self.value)\n"));
    }

    #[test]
    fn test_emit_tagged_union_root() {
        let variant = |name: &str, tag: &str| UnionVariant {
            tag_value: PyLiteral::Str(tag.into()),
            definition: TypeDefinition::new(name, TypeDefKind::Object { fields: vec![] }),
            payload: None,
        };
        let def = TypeDefinition::new(
            "Shape",
            TypeDefKind::TaggedUnion {
                tag: "type".into(),
                content: None,
                variants: vec![variant("OptionCircle", "circle"), variant("OptionSquare", "square")],
            },
        );
        assert_eq!(
            def.emit(),
            "class Shape(RootModel):\n    root: Annotated[Union[OptionCircle, OptionSquare], Field(discriminator=\"type\")]\n"
        );
    }

    #[test]
    fn test_emit_imports_grouped() {
        let mut imports = ImportSet::new();
        imports.add(&PyImport::from("acme.models.user", "User"));
        imports.add(&PyImport::from("typing", "Optional"));
        imports.add(&PyImport::from("typing", "List"));
        imports.add(&PyImport::from("pydantic", "BaseModel"));
        imports.add(&PyImport::Module("datetime".into()));
        imports.add(&PyImport::from("__future__", "annotations"));
        assert_eq!(
            imports.emit(),
            "from __future__ import annotations\n\nimport datetime\nfrom typing import List, Optional\n\nfrom pydantic import BaseModel\n\nfrom acme.models.user import User\n"
        );
    }

    #[test]
    fn test_emit_function() {
        let func = PyFunction {
            name: "test_ping".into(),
            params: vec![],
            return_type: Some(PyType::NoneType),
            doc: None,
            body: vec!["result = api.ping()".into(), "print(result)".into()],
        };
        assert_eq!(
            func.emit(),
            "def test_ping() -> None:\n    result = api.ping()\n    print(result)\n"
        );
    }

    #[test]
    fn test_multiline_docstring() {
        assert_eq!(docstring("One.\n\nTwo.", 1), "    \"\"\"One.\n\n    Two.\n    \"\"\"\n");
    }
}
