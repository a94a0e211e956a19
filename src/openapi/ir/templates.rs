//! Tera templates for client methods.
//!
//! Each template renders one method body indented for a class scope. Values
//! are pre-rendered Python fragments; the templates only lay them out, so
//! autoescaping stays off.

use tera::{Context, Tera};

/// Plain request/response method.
pub const METHOD_TEMPLATE: &str = r#"    def {{ name }}({{ signature }}) -> {{ result }}:
{{ doc }}        url = {{ url }}
        response = self._client.request(
            "{{ method }}",
            url,
            params={{ params }},
            headers={{ headers }},
            body={{ body }},
            content_type={{ content_type }},
        )
        return TypeAdapter({{ result }}).validate_python(response)
"#;

/// Iterator over every page of a paginated listing; rendered after the page method.
pub const PAGINATED_TEMPLATE: &str = r#"    def {{ name }}_all({{ all_signature }}) -> Iterator[{{ item }}]:
        """Iterate over every item of `{{ name }}`, following `next_page`."""
        page_token = None
        while True:
            page = self.{{ name }}({{ call_args }})
            if page is None:
                return
            yield from page.items
            if not page.next_page:
                return
            page_token = page.next_page
"#;

/// Websocket upgrade; the transport owns the connection.
pub const WEBSOCKET_TEMPLATE: &str = r#"    def {{ name }}({{ signature }}) -> WebSocket[{{ result }}]:
{{ doc }}        url = {{ url }}
        return self._client.websocket(
            url,
            params={{ params }},
            headers={{ headers }},
            message_type={{ result }},
        )
"#;

/// Render one template with the given context.
pub fn render(template: &str, context: &Context) -> Result<String, String> {
    Tera::one_off(template, context, false).map_err(|err| {
        // Tera hides the useful part of the message in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        message
    })
}
