use std::borrow::Cow;

use crate::html::Html;
use crate::html::Element;
use crate::html::Attributes;

// ————————————————————————————————————————————————————————————————————————————
// ENVIRONMENT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default)]
pub struct Environment<'a> {
    text_mode: TextMode<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode<'a> {
    #[default]
    Escaped,
    /// Inside `style`, `script` and friends the text is written as is, except
    /// for anything that would close the enclosing `tag`.
    Raw { tag: &'a str },
}

impl<'a> Environment<'a> {
    pub fn scope<'b>(&self, tag: &'b str) -> Environment<'b> {
        let text_mode = if crate::html::is_raw_text_tag(tag) {
            TextMode::Raw { tag }
        } else {
            TextMode::Escaped
        };
        Environment { text_mode }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Html {
    pub fn html_string(&self) -> String {
        let mut output = String::new();
        self.write_html(&Environment::default(), &mut output);
        output
    }
    fn write_html(&self, environment: &Environment, output: &mut String) {
        match self {
            Self::Element(element) => element.write_html(output),
            Self::Fragment(nodes) => write_fragment(nodes, environment, output),
            Self::Text(text) => match environment.text_mode {
                TextMode::Raw { tag } => output.push_str(&escape_raw_text(text, tag)),
                TextMode::Escaped => output.push_str(&html_escape::encode_text(text)),
            },
            Self::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            Self::Doctype { name, public_id, system_id } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                if !public_id.is_empty() {
                    output.push_str(" PUBLIC \"");
                    output.push_str(public_id);
                    output.push('"');
                    if !system_id.is_empty() {
                        output.push_str(" \"");
                        output.push_str(system_id);
                        output.push('"');
                    }
                } else if !system_id.is_empty() {
                    output.push_str(" SYSTEM \"");
                    output.push_str(system_id);
                    output.push('"');
                }
                output.push('>');
            }
        }
    }
}

impl Element {
    pub fn html_string(&self) -> String {
        let mut output = String::new();
        self.write_html(&mut output);
        output
    }
    fn write_html(&self, output: &mut String) {
        let environment = Environment::default().scope(&self.tag);
        output.push('<');
        output.push_str(&self.tag);
        write_attributes(&self.attrs, output);
        output.push('>');
        if crate::html::is_void_tag(&self.tag) && self.children.is_empty() {
            return
        }
        write_fragment(&self.children, &environment, output);
        output.push_str("</");
        output.push_str(&self.tag);
        output.push('>');
    }
}

fn write_fragment(nodes: &[Html], environment: &Environment, output: &mut String) {
    for child in nodes {
        child.write_html(environment, output);
    }
}

/// Rewrites every `</tag` (any case) in raw text to `<\/tag`, so the text
/// cannot end its own element early.
pub fn escape_raw_text<'a>(text: &'a str, tag: &str) -> Cow<'a, str> {
    let needle = format!("</{}", tag.to_ascii_lowercase());
    // ASCII lowering keeps byte offsets, so indices carry over to `text`.
    let lowered = text.to_ascii_lowercase();
    if !lowered.contains(&needle) {
        return Cow::Borrowed(text)
    }
    let mut output = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for (index, _) in lowered.match_indices(&needle) {
        output.push_str(&text[last..index]);
        output.push_str("<\\/");
        last = index + 2;
    }
    output.push_str(&text[last..]);
    Cow::Owned(output)
}

fn write_attributes(attributes: &Attributes, output: &mut String) {
    for (key, value) in attributes.iter() {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&html_escape::encode_double_quoted_attribute(value));
        output.push('"');
    }
}

#[cfg(test)]
mod tests {
    use crate::html::ParserMode;
    use super::*;

    fn round_trip(source: &str) -> String {
        Html::parse(source, &ParserMode::Document).unwrap().html.html_string()
    }

    #[test]
    fn plain_document_round_trips() {
        let source = "<html><head></head><body><h1>Hello, World!</h1></body></html>";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn doctype_comments_and_void_tags() {
        let source = r#"<!DOCTYPE html><html><head><meta charset="utf-8"></head><body><!-- note --><p>a<br>b</p><img src="x.png" alt="x"></body></html>"#;
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let element = Element::new("a")
            .with_attr("title", r#"say "hi" & go"#)
            .with_children(vec![Html::Text("1 < 2 & 3".into())]);
        assert_eq!(
            element.html_string(),
            r#"<a title="say &quot;hi&quot; &amp; go">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn doctype_identifiers_round_trip() {
        let source = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"><html><head></head><body></body></html>"#;
        assert_eq!(round_trip(source), source);
        let system_only = Html::Doctype {
            name: "html".into(),
            public_id: String::new(),
            system_id: "about:legacy-compat".into(),
        };
        assert_eq!(system_only.html_string(), r#"<!DOCTYPE html SYSTEM "about:legacy-compat">"#);
    }

    #[test]
    fn template_contents_round_trip() {
        let source = "<html><head></head><body><template><p>kept</p><img src=\"a.png\"></template></body></html>";
        assert_eq!(round_trip(source), source);
    }

    #[test]
    fn raw_text_cannot_close_its_element() {
        let style = Element::new("style")
            .with_children(vec![Html::Text("p{}</STYLE><b>x</b></style >".into())]);
        assert_eq!(style.html_string(), "<style>p{}<\\/STYLE><b>x</b><\\/style ></style>");
        assert_eq!(escape_raw_text("a</b>", "style"), Cow::Borrowed("a</b>"));
    }

    #[test]
    fn raw_text_elements_are_not_escaped() {
        let style = Element::new("style").with_children(vec![Html::Text("a > b { color: red }".into())]);
        assert_eq!(style.html_string(), "<style>a > b { color: red }</style>");
    }
}
