use html5ever::{parse_document, parse_fragment, ParseOpts};
use markup5ever::{LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tendril::TendrilSink;

use crate::html::{Attributes, Element, Html};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed tree plus the recoverable errors the parser ran into.
#[derive(Debug, Clone)]
pub struct ParsedHtml {
    pub html: Html,
    pub errors: Vec<String>,
}

pub fn parse_html_document(source: &str) -> std::io::Result<ParsedHtml> {
    let dom = parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .read_from(&mut source.as_bytes())?;
    let nodes = convert_children(&dom.document);
    Ok(ParsedHtml {
        html: Html::Fragment(nodes),
        errors: collect_errors(&dom),
    })
}

/// Parses `source` as the contents of a `context` element.
pub fn parse_html_fragment(source: &str, context: &str) -> std::io::Result<ParsedHtml> {
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(context));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .from_utf8()
        .read_from(&mut source.as_bytes())?;
    // The fragment parser hangs everything off a synthetic `html` element.
    let root = dom.document.children.borrow().first().cloned();
    let nodes = root
        .map(|root| convert_children(&root))
        .unwrap_or_default();
    Ok(ParsedHtml {
        html: Html::Fragment(nodes),
        errors: collect_errors(&dom),
    })
}

fn collect_errors(dom: &RcDom) -> Vec<String> {
    dom.errors
        .iter()
        .map(|error| error.to_string())
        .collect()
}

fn convert_children(handle: &Handle) -> Vec<Html> {
    handle.children
        .borrow()
        .iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<Html> {
    match &handle.data {
        NodeData::Document => Some(Html::Fragment(convert_children(handle))),
        NodeData::Doctype { name, public_id, system_id } => Some(Html::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }),
        NodeData::Text { contents } => Some(Html::Text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(Html::Comment(contents.to_string())),
        NodeData::Element { name, attrs, template_contents, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| {
                    let key = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    (key, attr.value.to_string())
                })
                .collect::<Attributes>();
            Some(Html::Element(Element {
                tag: name.local.to_string(),
                attrs,
                // Template children live in a separate document fragment.
                children: match template_contents {
                    Some(contents) => convert_children(contents),
                    None => convert_children(handle),
                },
            }))
        }
        NodeData::ProcessingInstruction { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_mode_builds_the_full_skeleton() {
        let parsed = parse_html_document("<p>hi").unwrap();
        let html = parsed.html.children().unwrap()[0].as_element().unwrap();
        assert!(html.has_tag("html"));
        let tags = html.children
            .iter()
            .filter_map(Html::as_element)
            .map(|x| x.tag.as_str())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec!["head", "body"]);
        assert!(!parsed.errors.is_empty(), "a missing doctype is reported");
    }

    #[test]
    fn fragment_mode_returns_only_the_parsed_nodes() {
        let parsed = parse_html_fragment("<b>bold</b> tail", "div").unwrap();
        let nodes = parsed.html.children().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].as_element().unwrap().has_tag("b"));
        assert_eq!(nodes[1], Html::Text(" tail".into()));
    }

    #[test]
    fn tag_soup_is_tolerated() {
        let parsed = parse_html_document("<div><p>unclosed<span>deep</div></i>").unwrap();
        assert_eq!(parsed.html.text_content(), "uncloseddeep");
    }

    #[test]
    fn attribute_order_follows_the_source() {
        let parsed = parse_html_fragment(r#"<a title="t" href="h" id="i">x</a>"#, "div").unwrap();
        let anchor = parsed.html.children().unwrap()[0].as_element().unwrap();
        let keys = anchor.attrs.iter().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, vec!["title", "href", "id"]);
    }
}
