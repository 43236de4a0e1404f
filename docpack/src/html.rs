use std::fmt;

use serde::Deserialize;

// ————————————————————————————————————————————————————————————————————————————
// DATA MODEL
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Html {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Fragment(Vec<Html>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Attributes,
    pub children: Vec<Html>,
}

/// Element attributes in source order.
///
/// Setting an attribute that is already present overwrites the value in
/// place, so the last write wins and the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl Html {
    pub fn parse(source: &str, mode: &ParserMode) -> std::io::Result<crate::html_parser::ParsedHtml> {
        match mode {
            ParserMode::Document => crate::html_parser::parse_html_document(source),
            ParserMode::Fragment { context } => crate::html_parser::parse_html_fragment(source, context),
        }
    }
    pub fn text_content(&self) -> String {
        match self {
            Self::Element(x) => x.text_content(),
            Self::Text(x) => x.to_owned(),
            Self::Fragment(xs) => fragment_to_text(xs),
            Self::Comment(_) | Self::Doctype { .. } => String::new(),
        }
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element { tag: tag.into(), attrs: Attributes::new(), children: Vec::new() }
    }
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key, value);
        self
    }
    pub fn with_children(mut self, children: Vec<Html>) -> Self {
        self.children = children;
        self
    }
    pub fn has_tag(&self, tag: impl AsRef<str>) -> bool {
        self.tag.eq_ignore_ascii_case(tag.as_ref())
    }
    pub fn text_content(&self) -> String {
        fragment_to_text(&self.children)
    }
}

fn fragment_to_text(nodes: &[Html]) -> String {
    nodes
        .iter()
        .map(|x| x.text_content())
        .collect()
}

// ————————————————————————————————————————————————————————————————————————————
// TREE HANDLES & MUTATION
// ————————————————————————————————————————————————————————————————————————————

/// Addresses a node by the child indices leading to it from the root.
///
/// The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }
    /// Splits the path into the parent path and the index within the parent.
    pub fn split_last(&self) -> Option<(NodePath, usize)> {
        let (last, parent) = self.0.split_last()?;
        Some((NodePath(parent.to_vec()), *last))
    }
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        NodePath(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeMutationError {
    #[error("node at {path} has no parent")]
    NoParent { path: NodePath },
    #[error("no node at {path}")]
    Missing { path: NodePath },
    #[error("node at {path} cannot hold children")]
    NotAContainer { path: NodePath },
}

impl Html {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
    pub fn children(&self) -> Option<&[Html]> {
        match self {
            Self::Element(element) => Some(&element.children),
            Self::Fragment(nodes) => Some(nodes),
            _ => None,
        }
    }
    fn children_mut(&mut self) -> Option<&mut Vec<Html>> {
        match self {
            Self::Element(element) => Some(&mut element.children),
            Self::Fragment(nodes) => Some(nodes),
            _ => None,
        }
    }
    pub fn get(&self, path: &NodePath) -> Option<&Html> {
        path.indices()
            .iter()
            .try_fold(self, |node, index| node.children()?.get(*index))
    }
    fn get_mut(&mut self, path: &NodePath) -> Option<&mut Html> {
        let mut node = self;
        for index in path.indices() {
            node = node.children_mut()?.get_mut(*index)?;
        }
        Some(node)
    }
    /// The sibling list holding the node at `path`, plus its index there.
    fn parent_slot(&mut self, path: &NodePath) -> Result<(&mut Vec<Html>, usize), TreeMutationError> {
        let (parent_path, index) = path
            .split_last()
            .ok_or_else(|| TreeMutationError::NoParent { path: path.clone() })?;
        let parent = self
            .get_mut(&parent_path)
            .ok_or_else(|| TreeMutationError::Missing { path: parent_path.clone() })?;
        let siblings = parent
            .children_mut()
            .ok_or(TreeMutationError::NotAContainer { path: parent_path })?;
        if index >= siblings.len() {
            return Err(TreeMutationError::Missing { path: path.clone() });
        }
        Ok((siblings, index))
    }
    /// Swaps the node at `path` for `node`, keeping its position among its
    /// siblings. Returns the node that was replaced.
    pub fn replace(&mut self, path: &NodePath, node: Html) -> Result<Html, TreeMutationError> {
        let (siblings, index) = self.parent_slot(path)?;
        Ok(std::mem::replace(&mut siblings[index], node))
    }
    /// Removes the node at `path` together with its subtree.
    pub fn detach(&mut self, path: &NodePath) -> Result<Html, TreeMutationError> {
        let (siblings, index) = self.parent_slot(path)?;
        Ok(siblings.remove(index))
    }
    /// Paths of every element matching `predicate`, in document order.
    pub fn select(&self, predicate: impl Fn(&Element) -> bool) -> Vec<NodePath> {
        fn walk(node: &Html, path: NodePath, predicate: &dyn Fn(&Element) -> bool, output: &mut Vec<NodePath>) {
            if let Some(element) = node.as_element() {
                if predicate(element) {
                    output.push(path.clone());
                }
            }
            for (index, child) in node.children().unwrap_or_default().iter().enumerate() {
                walk(child, path.child(index), predicate, output);
            }
        }
        let mut output = Vec::new();
        walk(self, NodePath::root(), &predicate, &mut output);
        output
    }
}

// ————————————————————————————————————————————————————————————————————————————
// HTML API UTILITIES
// ————————————————————————————————————————————————————————————————————————————

pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area" | "base" | "basefont" | "bgsound" | "br" | "col" | "embed" | "frame" | "hr" |
        "img" | "input" | "keygen" | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Elements whose text children are written out without entity escaping.
pub fn is_raw_text_tag(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext" | "noscript"
    )
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserMode {
    #[default]
    Document,
    Fragment { context: String },
}

impl ParserMode {
    pub fn fragment(context: impl AsRef<str>) -> Self {
        Self::Fragment { context: context.as_ref().to_string() }
    }
}
