//! `<style>` element carrying the request's CSP nonce.
//!
//! The nonce attribute is always written first. `type`, `media` and `title`
//! follow when set, then any extra attributes in insertion order. Attribute
//! values are escaped; the body is written as-is since it is CSS.

use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTag {
    type_: Option<String>,
    media: Option<String>,
    title: Option<String>,
    attributes: Vec<(String, String)>,
    body: String,
}

impl StyleTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_(mut self, value: impl Into<String>) -> Self {
        self.type_ = Some(value.into());
        self
    }

    pub fn media(mut self, value: impl Into<String>) -> Self {
        self.media = Some(value.into());
        self
    }

    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    /// Extra attribute. Names are emitted verbatim.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, css: impl Into<String>) -> Self {
        self.body = css.into();
        self
    }

    pub fn render(&self, nonce: Option<&str>) -> String {
        let mut out = String::with_capacity(self.body.len() + 64);
        out.push_str("<style");
        push_attr(&mut out, "nonce", nonce.unwrap_or_default());

        let optional = [
            ("type", &self.type_),
            ("media", &self.media),
            ("title", &self.title),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                push_attr(&mut out, name, value);
            }
        }
        for (name, value) in &self.attributes {
            push_attr(&mut out, name, value);
        }

        out.push('>');
        out.push_str(&self.body);
        out.push_str("</style>");
        out
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
}

/// Escape an HTML attribute value.
pub fn escape_attribute(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_all_attributes_in_order() {
        let nonce = "r4nd0m+n0nce/";
        let html = StyleTag::new()
            .type_("text/css")
            .media("screen")
            .title("main")
            .body("body { color: red; }")
            .render(Some(nonce));

        assert_eq!(
            html,
            format!(
                "<style nonce=\"{}\" type=\"text/css\" media=\"screen\" title=\"main\">body {{ color: red; }}</style>",
                nonce
            )
        );
    }

    #[test]
    fn omits_unset_attributes() {
        let html = StyleTag::new().render(None);
        assert_eq!(html, "<style nonce=\"\"></style>");
    }

    #[test]
    fn dynamic_attributes_follow_known_ones() {
        let html = StyleTag::new()
            .attribute("data-theme", "dark")
            .title("t")
            .render(None);
        assert_eq!(html, "<style nonce=\"\" title=\"t\" data-theme=\"dark\"></style>");
    }

    #[test]
    fn attribute_values_are_escaped_body_is_not() {
        let html = StyleTag::new()
            .title("\"><script>")
            .body("a > b { content: '&'; }")
            .render(None);
        assert!(html.contains("title=\"&quot;&gt;&lt;script&gt;\""));
        assert!(html.ends_with(">a > b { content: '&'; }</style>"));
    }
}
