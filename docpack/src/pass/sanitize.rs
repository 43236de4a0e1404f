use crate::error::{ConversionError, Result};
use crate::html::{Element, Html, ParserMode};

use super::system::{Aggregator, State, Warning};

pub const DEFAULT_DISALLOWED_TAGS: &[&str] = &["script", "style"];

/// Parses raw HTML. Invalid markup is repaired by the parser and reported as
/// a single warning; only unreadable input fails.
pub fn parse(source: &str, mode: &ParserMode) -> Result<State<Html>> {
    let parsed = Html::parse(source, mode).map_err(|error| {
        log::error!("Error validating HTML content: {error}");
        ConversionError::MalformedInput(error.to_string())
    })?;
    let mut aggregator = Aggregator::default();
    if !parsed.errors.is_empty() {
        for error in &parsed.errors {
            log::debug!("parse error: {error}");
        }
        aggregator.warn(Warning::parse_errors(&parsed.errors));
    }
    Ok(aggregator.wrap(parsed.html))
}

/// Removes every element whose tag is listed, along with its subtree.
pub fn strip_disallowed_elements<S: AsRef<str>>(html: Html, disallowed: &[S]) -> Html {
    let is_disallowed = |element: &Element| {
        disallowed.iter().any(|tag| element.has_tag(tag))
    };
    match html {
        Html::Element(element) if is_disallowed(&element) => Html::Fragment(Vec::new()),
        html => html.strip(&is_disallowed),
    }
}

impl Html {
    fn strip(self, is_disallowed: &dyn Fn(&Element) -> bool) -> Self {
        match self {
            Self::Element(element) => Self::Element(element.strip(is_disallowed)),
            Self::Fragment(nodes) => Self::Fragment(strip_fragment(nodes, is_disallowed)),
            other => other,
        }
    }
}

impl Element {
    fn strip(self, is_disallowed: &dyn Fn(&Element) -> bool) -> Self {
        let Element { tag, attrs, children } = self;
        let children = strip_fragment(children, is_disallowed);
        Element { tag, attrs, children }
    }
}

fn strip_fragment(nodes: Vec<Html>, is_disallowed: &dyn Fn(&Element) -> bool) -> Vec<Html> {
    nodes
        .into_iter()
        .filter(|node| !node.as_element().is_some_and(is_disallowed))
        .map(|node| node.strip(is_disallowed))
        .collect()
}

/// Parse, then strip.
pub fn sanitize<S: AsRef<str>>(source: &str, mode: &ParserMode, disallowed: &[S]) -> Result<State<Html>> {
    let state = parse(source, mode)?.map(|html| strip_disallowed_elements(html, disallowed));
    log::info!("Simplified HTML content by removing disallowed tags.");
    Ok(state)
}

pub fn serialize(html: &Html) -> String {
    html.html_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::system::WarningKind;

    fn sanitize_document(source: &str) -> State<Html> {
        sanitize(source, &ParserMode::Document, DEFAULT_DISALLOWED_TAGS).unwrap()
    }

    #[test]
    fn removes_script_and_style_tags() {
        let source = "<html><head><style>body { color: red; }</style></head><body><script>alert('Hi');</script><h1>Hello, World!</h1></body></html>";
        let output = serialize(&sanitize_document(source).value);
        assert_eq!(output, "<html><head></head><body><h1>Hello, World!</h1></body></html>");
    }

    #[test]
    fn nested_disallowed_elements_go_with_their_parent() {
        let source = "<div><SCRIPT type=\"text/javascript\">var x = '<style>';</SCRIPT><p>kept</p></div>";
        let state = sanitize(source, &ParserMode::fragment("body"), DEFAULT_DISALLOWED_TAGS).unwrap();
        assert_eq!(serialize(&state.value), "<div><p>kept</p></div>");
    }

    #[test]
    fn stripping_is_idempotent() {
        let source = "<html><body><style>p{}</style><p>a<script>1</script></p><noscript>n</noscript></body></html>";
        let once = sanitize_document(source).value;
        let twice = strip_disallowed_elements(once.clone(), DEFAULT_DISALLOWED_TAGS);
        assert_eq!(once, twice);
    }

    #[test]
    fn a_disallowed_root_becomes_empty() {
        let root = Html::Element(Element::new("script"));
        assert_eq!(strip_disallowed_elements(root, &["script"]), Html::Fragment(Vec::new()));
    }

    #[test]
    fn custom_tag_lists_are_honoured() {
        let state = sanitize("<p>a</p><iframe src=\"x\"></iframe><style>s</style>", &ParserMode::fragment("body"), &["iframe"]).unwrap();
        assert_eq!(serialize(&state.value), "<p>a</p><style>s</style>");
    }

    #[test]
    fn parse_errors_become_a_single_warning() {
        let state = sanitize_document("<p>unclosed <b>bold");
        let parse_warnings = state.aggregator.warnings_of(WarningKind::ParseErrors).count();
        assert_eq!(parse_warnings, 1);
        assert!(serialize(&state.value).contains("<b>bold</b>"));
    }
}
