//! Case conversion and identifier sanitization for generated Python.
//!
//! Words are split on separators and camel boundaries; a run of capitals is
//! one acronym token. Spellings in the exception table are matched before any
//! heuristic and keep a fixed Pascal form (`OAuth2`), while their snake form
//! is plain lowercase (`oauth2`).

use std::collections::HashSet;
use std::sync::LazyLock;

/// Spellings that generic splitting would break apart.
pub const BUILTIN_ACRONYMS: &[&str] = &["OAuth2", "IPv4", "IPv6", "GraphQL"];

/// Python keywords (hard and soft) that cannot name a field or parameter as-is.
pub static PY_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield", "match", "case",
    ]
    .into_iter()
    .collect()
});

/// Names that shadow builtins or the method receiver when used as parameters.
pub static PY_SHADOWED_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "type", "self", "format", "filter", "input", "list", "dict", "str", "int", "float",
        "bool", "bytes", "object", "property", "hash", "range", "set", "max", "min",
    ]
    .into_iter()
    .collect()
});

static DEFAULT_CASING: LazyLock<Casing> = LazyLock::new(Casing::default);

/// Case converter carrying the acronym exception table.
#[derive(Debug, Clone)]
pub struct Casing {
    exceptions: Vec<String>,
}

impl Default for Casing {
    fn default() -> Self {
        Self::with_acronyms(&[])
    }
}

impl Casing {
    /// Build a converter with the built-in exceptions plus `extra`.
    pub fn with_acronyms(extra: &[String]) -> Self {
        let mut exceptions: Vec<String> = BUILTIN_ACRONYMS.iter().map(|s| (*s).to_string()).collect();
        for acronym in extra {
            if !acronym.is_empty() && !exceptions.contains(acronym) {
                exceptions.push(acronym.clone());
            }
        }
        // Longest first so `IPv6Prefix` never matches a shorter entry.
        exceptions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { exceptions }
    }

    fn exception_for_word(&self, word: &str) -> Option<&str> {
        self.exceptions
            .iter()
            .find(|e| e.eq_ignore_ascii_case(word))
            .map(String::as_str)
    }

    fn exception_prefix(&self, chars: &[char]) -> Option<usize> {
        self.exceptions.iter().find_map(|e| {
            let len = e.chars().count();
            (chars.len() >= len && chars[..len].iter().copied().eq(e.chars())).then_some(len)
        })
    }

    /// Split an identifier into words.
    pub fn split_words(&self, input: &str) -> Vec<String> {
        let mut words = Vec::new();
        for chunk in input.split(|c: char| !c.is_alphanumeric()) {
            if chunk.is_empty() {
                continue;
            }
            if let Some(exception) = self.exception_for_word(chunk) {
                words.push(exception.to_string());
                continue;
            }
            self.split_camel(chunk, &mut words);
        }
        words
    }

    fn split_camel(&self, chunk: &str, words: &mut Vec<String>) {
        let chars: Vec<char> = chunk.chars().collect();
        let n = chars.len();
        let mut i = 0;
        while i < n {
            if let Some(len) = self.exception_prefix(&chars[i..]) {
                words.push(chars[i..i + len].iter().collect());
                i += len;
                continue;
            }
            let start = i;
            if chars[i].is_uppercase() {
                let mut j = i;
                while j < n && chars[j].is_uppercase() {
                    j += 1;
                }
                if j - i > 1 {
                    // HTTPClient: the last capital starts the next word.
                    let mut end = if j < n && chars[j].is_lowercase() { j - 1 } else { j };
                    if end == j {
                        while end < n && chars[end].is_ascii_digit() {
                            end += 1;
                        }
                    }
                    words.push(chars[start..end].iter().collect());
                    i = end;
                    continue;
                }
                i += 1;
            }
            while i < n && !chars[i].is_uppercase() {
                i += 1;
            }
            words.push(chars[start..i].iter().collect());
        }
    }

    fn snake_word(&self, word: &str) -> String {
        word.to_lowercase()
    }

    fn pascal_word(&self, word: &str) -> String {
        if let Some(exception) = self.exception_for_word(word) {
            return exception.to_string();
        }
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }

    /// `FooBar` / `fooBar` / `foo-bar` -> `foo_bar`.
    pub fn snake(&self, input: &str) -> String {
        self.split_words(input)
            .iter()
            .map(|w| self.snake_word(w))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// `foo_bar` / `fooBar` -> `FooBar`.
    ///
    /// Joining words can create a new acronym run (`a_b` -> `AB`), so the
    /// conversion is repeated until it no longer changes its input.
    pub fn pascal(&self, input: &str) -> String {
        let mut current = self.pascal_once(input);
        for _ in 0..=current.len() {
            let next = self.pascal_once(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn pascal_once(&self, input: &str) -> String {
        self.split_words(input)
            .iter()
            .map(|w| self.pascal_word(w))
            .collect()
    }

    /// `fooBar` -> `FOO_BAR`.
    pub fn screaming_snake(&self, input: &str) -> String {
        self.snake(input).to_uppercase()
    }
}

/// Snake case using the built-in exception table.
pub fn camel_to_snake(input: &str) -> String {
    DEFAULT_CASING.snake(input)
}

/// Pascal case using the built-in exception table.
pub fn to_pascal_case(input: &str) -> String {
    DEFAULT_CASING.pascal(input)
}

/// SCREAMING_SNAKE case using the built-in exception table.
pub fn camel_to_screaming_snake(input: &str) -> String {
    DEFAULT_CASING.screaming_snake(input)
}

/// Check that `name` is a plain ASCII Python identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifier for a function, method or parameter name.
pub fn sanitize_identifier(casing: &Casing, name: &str) -> String {
    let mut ident = casing.snake(name);
    if ident.is_empty() {
        ident = "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PY_KEYWORDS.contains(ident.as_str()) || PY_SHADOWED_NAMES.contains(ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Identifier for a model field plus the wire alias when the two differ.
pub fn field_identifier(casing: &Casing, wire_name: &str) -> (String, Option<String>) {
    if is_valid_identifier(wire_name)
        && !PY_KEYWORDS.contains(wire_name)
        && !wire_name.starts_with("model_")
    {
        return (wire_name.to_string(), None);
    }
    let mut ident = casing.snake(wire_name);
    if ident.is_empty() {
        ident = "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PY_KEYWORDS.contains(ident.as_str()) || ident.starts_with("model_") {
        ident.push('_');
    }
    (ident, Some(wire_name.to_string()))
}

/// Member name for an enum value.
pub fn enum_member_name(casing: &Casing, value: &str) -> String {
    let name = casing.screaming_snake(value);
    if name.is_empty() {
        return "EMPTY".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return match value {
            "1" => "ONE".to_string(),
            "2" => "TWO".to_string(),
            "3" => "THREE".to_string(),
            _ => format!("VAL_{name}"),
        };
    }
    name
}

/// Escape text for a double-quoted Python string literal.
pub fn escape_py_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Make text safe inside a triple-quoted docstring.
pub fn escape_docstring(s: &str) -> String {
    s.trim().replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("FooBar"), "foo_bar");
        assert_eq!(camel_to_snake("fooBar"), "foo_bar");
        assert_eq!(camel_to_snake("foo-bar baz"), "foo_bar_baz");
        assert_eq!(camel_to_snake("HTTPClient"), "http_client");
        assert_eq!(camel_to_snake("APIKey"), "api_key");
        assert_eq!(camel_to_snake("Point2d"), "point2d");
        assert_eq!(camel_to_snake("already_snake_case"), "already_snake_case");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("foo_bar"), "FooBar");
        assert_eq!(to_pascal_case("fooBar"), "FooBar");
        assert_eq!(to_pascal_case("HTTPClient"), "HttpClient");
        assert_eq!(to_pascal_case("FooBar"), "FooBar");
        assert_eq!(to_pascal_case("image/png"), "ImagePng");
        assert_eq!(to_pascal_case("a_b"), "Ab");
    }

    #[test]
    fn test_screaming_snake() {
        assert_eq!(camel_to_screaming_snake("pending"), "PENDING");
        assert_eq!(camel_to_screaming_snake("fooBar"), "FOO_BAR");
        assert_eq!(camel_to_screaming_snake("FOO_BAR"), "FOO_BAR");
    }

    #[test]
    fn test_builtin_exceptions() {
        assert_eq!(camel_to_snake("OAuth2Client"), "oauth2_client");
        assert_eq!(to_pascal_case("oauth2_client"), "OAuth2Client");
        assert_eq!(to_pascal_case("ipv6_prefix"), "IPv6Prefix");
        assert_eq!(camel_to_snake("IPv6Prefix"), "ipv6_prefix");
    }

    #[test]
    fn test_configured_brand_acronym() {
        let casing = Casing::with_acronyms(&["KittyCAD".to_string()]);
        assert_eq!(casing.snake("KittyCADClient"), "kittycad_client");
        assert_eq!(casing.pascal("kittycad_client"), "KittyCADClient");
        assert_eq!(casing.pascal("KittyCAD"), "KittyCAD");
        // Without the entry the brand splits on its capitals.
        assert_eq!(camel_to_snake("KittyCADClient"), "kitty_cad_client");
    }

    #[test]
    fn test_naming_round_trip() {
        let samples = [
            "foo",
            "FooBar",
            "fooBar",
            "foo_bar",
            "HTTPClient",
            "a_b",
            "a_b_c_d",
            "XMLHttpRequest",
            "foo_2",
            "foo2Bar",
            "2fa_code",
            "ABC2def",
            "IPv4Address",
            "ipv4_address",
            "OAuth2",
            "created-at",
            "image/svg+xml",
            "__dunder__",
            "URL",
            "x",
            "X",
            "ÄpfelBirne",
            "",
        ];
        for s in samples {
            let pascal = to_pascal_case(s);
            assert_eq!(
                to_pascal_case(&camel_to_snake(&pascal)),
                pascal,
                "round trip failed for {s:?}"
            );
        }
    }

    #[test]
    fn test_idempotent_on_conformant_input() {
        for s in ["foo_bar", "foo2_bar", "x"] {
            assert_eq!(camel_to_snake(s), s);
        }
        for s in ["FooBar", "HttpClient", "Point2d"] {
            assert_eq!(to_pascal_case(s), s);
        }
        for s in ["FOO_BAR", "PENDING"] {
            assert_eq!(camel_to_screaming_snake(s), s);
        }
    }

    #[test]
    fn test_sanitize_identifier() {
        let casing = Casing::default();
        assert_eq!(sanitize_identifier(&casing, "type"), "type_");
        assert_eq!(sanitize_identifier(&casing, "from"), "from_");
        assert_eq!(sanitize_identifier(&casing, "userId"), "user_id");
        assert_eq!(sanitize_identifier(&casing, "2fa"), "_2fa");
        assert_eq!(sanitize_identifier(&casing, "---"), "value");
        assert_eq!(sanitize_identifier(&casing, "id"), "id");
    }

    #[test]
    fn test_field_identifier() {
        let casing = Casing::default();
        assert_eq!(field_identifier(&casing, "type"), ("type".to_string(), None));
        assert_eq!(
            field_identifier(&casing, "content-type"),
            ("content_type".to_string(), Some("content-type".to_string()))
        );
        assert_eq!(
            field_identifier(&casing, "from"),
            ("from_".to_string(), Some("from".to_string()))
        );
        assert_eq!(
            field_identifier(&casing, "model_id"),
            ("model_id_".to_string(), Some("model_id".to_string()))
        );
    }

    #[test]
    fn test_enum_member_name() {
        let casing = Casing::default();
        assert_eq!(enum_member_name(&casing, "pending"), "PENDING");
        assert_eq!(enum_member_name(&casing, "image/png"), "IMAGE_PNG");
        assert_eq!(enum_member_name(&casing, "1"), "ONE");
        assert_eq!(enum_member_name(&casing, "2"), "TWO");
        assert_eq!(enum_member_name(&casing, "3"), "THREE");
        assert_eq!(enum_member_name(&casing, "4"), "VAL_4");
        assert_eq!(enum_member_name(&casing, "3d_model"), "VAL_3D_MODEL");
        assert_eq!(enum_member_name(&casing, ""), "EMPTY");
    }

    #[test]
    fn test_escape_py_string() {
        assert_eq!(escape_py_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_py_string("a\nb"), "a\\nb");
    }
}
