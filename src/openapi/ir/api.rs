//! Endpoint-level IR.
//!
//! One [`EndpointDescriptor`] per (path, method). Descriptors reference model
//! classes by name only; the classes themselves live in the models package.
//! - ParamDescriptor: path, query and header parameters in signature order
//! - BodyDescriptor: the chosen request body media type
//! - PaginationDescriptor: item type of a paginated listing

use super::types::{PyExpr, PyImport, PyType};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HttpMethod {
    /// DELETE
    Delete,
    /// GET
    Get,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// PATCH
    Patch,
    /// POST
    Post,
    /// PUT
    Put,
}

impl HttpMethod {
    /// Uppercase method name, as passed to the transport.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }

    /// Lowercase key as used under a path item.
    pub fn key(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "delete",
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Patch => "patch",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
        }
    }

    /// Method for a path item key; `None` for non-method keys.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "delete" => HttpMethod::Delete,
            "get" => HttpMethod::Get,
            "head" => HttpMethod::Head,
            "options" => HttpMethod::Options,
            "patch" => HttpMethod::Patch,
            "post" => HttpMethod::Post,
            "put" => HttpMethod::Put,
            _ => return None,
        })
    }
}

/// Parameter location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into the URL.
    Path,
    /// Sent as a query string entry.
    Query,
    /// Sent as a request header.
    Header,
}

impl ParamLocation {
    /// Location for an `in` value; cookies and unknown values are `None`.
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            _ => None,
        }
    }

    /// The `in` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
        }
    }
}

/// Single parameter definition
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    /// Python-safe identifier
    pub name: String,
    /// Original name from spec (for URL building)
    pub wire_name: String,
    /// Where the value is sent.
    pub location: ParamLocation,
    /// Required parameters have no default in the signature.
    pub required: bool,
    /// Annotation; `Optional` when not required
    pub ty: PyType,
    /// The annotation is a `RootModel`, so the URL needs `.root`
    pub root_model: bool,
    /// Example argument for the generated test
    pub example: PyExpr,
    /// Parameter description from the document.
    pub description: Option<String>,
}

/// Request body content type, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyContentType {
    /// `application/json`
    Json,
    /// `text/plain`
    Text,
    /// `application/octet-stream`
    OctetStream,
    /// `application/x-www-form-urlencoded`
    UrlEncoded,
    /// `multipart/form-data`
    Multipart,
}

impl BodyContentType {
    /// Preference order when a body offers several media types.
    pub const PRECEDENCE: [BodyContentType; 5] = [
        BodyContentType::Json,
        BodyContentType::Text,
        BodyContentType::OctetStream,
        BodyContentType::UrlEncoded,
        BodyContentType::Multipart,
    ];

    /// The media type string.
    pub fn mime(&self) -> &'static str {
        match self {
            BodyContentType::Json => "application/json",
            BodyContentType::Text => "text/plain",
            BodyContentType::OctetStream => "application/octet-stream",
            BodyContentType::UrlEncoded => "application/x-www-form-urlencoded",
            BodyContentType::Multipart => "multipart/form-data",
        }
    }

    /// Whether a media type key (possibly with parameters) is this type.
    pub fn matches(&self, media_type: &str) -> bool {
        media_type
            .split(';')
            .next()
            .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(self.mime()))
    }
}

/// Request body
#[derive(Debug, Clone)]
pub struct BodyDescriptor {
    /// Chosen media type.
    pub content_type: BodyContentType,
    /// Whether the body is required.
    pub required: bool,
    /// Annotation of the `body` argument.
    pub ty: PyType,
    /// Example argument for the generated test.
    pub example: PyExpr,
}

/// Pagination marker: the element type of the page's `items` array
#[derive(Debug, Clone)]
pub struct PaginationDescriptor {
    /// Element type yielded by the `_all` iterator.
    pub item_type: PyType,
}

/// Everything needed to render one client method and its example
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    /// Snake-case method name
    pub function: String,
    /// `operationId`, or the name derived from method and path.
    pub operation_id: String,
    /// First tag, or `default`
    pub tag: String,
    /// Path template as written in the document.
    pub path: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Operation summary.
    pub summary: Option<String>,
    /// Operation description.
    pub description: Option<String>,
    /// Operation is marked deprecated.
    pub deprecated: bool,
    /// Path, required, then optional parameters
    pub params: Vec<ParamDescriptor>,
    /// Request body, if any.
    pub body: Option<BodyDescriptor>,
    /// De-duplicated success types, error type excluded
    pub success_types: Vec<PyType>,
    /// Return annotation of the method.
    pub result_type: PyType,
    /// Set for `x-dropshot-pagination` operations.
    pub pagination: Option<PaginationDescriptor>,
    /// Set for `x-dropshot-websocket` operations.
    pub websocket: bool,
    /// Imports the example arguments need
    pub example_imports: Vec<PyImport>,
}

impl EndpointDescriptor {
    /// Parameters without a default.
    pub fn required_params(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter().filter(|p| p.required)
    }

    /// Parameters defaulting to `None`.
    pub fn optional_params(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter().filter(|p| !p.required)
    }

    /// Look up a parameter by location and wire name.
    pub fn param(&self, location: ParamLocation, wire_name: &str) -> Option<&ParamDescriptor> {
        self.params
            .iter()
            .find(|p| p.location == location && p.wire_name == wire_name)
    }

    /// Keyword arguments of the example call: required parameters and the body.
    pub fn example_args(&self) -> Vec<(String, PyExpr)> {
        let mut args: Vec<(String, PyExpr)> = self
            .required_params()
            .map(|p| (p.name.clone(), p.example.clone()))
            .collect();
        if let Some(body) = &self.body {
            args.push(("body".to_string(), body.example.clone()));
        }
        args
    }

    /// Every annotation appearing in the method signature.
    pub fn signature_types(&self) -> Vec<&PyType> {
        let mut types: Vec<&PyType> = self.params.iter().map(|p| &p.ty).collect();
        if let Some(body) = &self.body {
            types.push(&body.ty);
        }
        types.push(&self.result_type);
        if let Some(pagination) = &self.pagination {
            types.push(&pagination.item_type);
        }
        types
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_body_content_type_matches_parameters() {
        assert!(BodyContentType::Json.matches("application/json; charset=utf-8"));
        assert!(BodyContentType::Json.matches("Application/JSON"));
        assert!(!BodyContentType::Json.matches("application/jsonl"));
        assert!(BodyContentType::Multipart.matches("multipart/form-data"));
    }

    #[test]
    fn test_method_keys() {
        assert_eq!(HttpMethod::from_key("patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::from_key("trace"), None);
    }
}
