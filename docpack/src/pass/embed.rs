use std::path::PathBuf;

use crate::error::{ConversionError, Result, Stage};
use crate::html::{Element, Html, NodePath};
use crate::resolve::{resolve, MatchPolicy, Resolution};
use crate::resource::{ResourceFile, ResourceSet};

use super::system::{Aggregator, ExtractedImage, State, Warning};

pub const DEFAULT_PLACEHOLDER: &str = "[Embedded Image: {src}]";

/// Everything a single embedding pass needs to resolve references.
#[derive(Debug, Clone)]
pub struct EmbedScope<'a> {
    pub resources: &'a ResourceSet,
    pub base_directory: PathBuf,
    pub policy: MatchPolicy,
    /// Placeholder text for embedded images; `{src}` is replaced by the
    /// original reference.
    pub placeholder: &'a str,
}

impl<'a> EmbedScope<'a> {
    pub fn new(resources: &'a ResourceSet, policy: MatchPolicy, placeholder: &'a str) -> Self {
        EmbedScope {
            resources,
            base_directory: resources.base_directory(),
            policy,
            placeholder,
        }
    }
    fn resolve(&self, reference: &str) -> Resolution<'a> {
        resolve(reference, self.resources, &self.base_directory, self.policy)
    }
    fn placeholder_for(&self, src: &str) -> String {
        self.placeholder.replace("{src}", src)
    }
}

enum Edit {
    Replace { path: NodePath, node: Html, reference: String },
    Detach { path: NodePath, reference: String },
}

/// Inlines every resolvable `img` and stylesheet `link`, and drops the ones
/// that cannot be resolved.
///
/// Images are collected into the aggregator in document order. Running this
/// again on its own output finds nothing left to do.
pub fn embed_resources(html: Html, scope: &EmbedScope<'_>) -> Result<State<Html>> {
    log::info!("Base directory for resources: {}", scope.base_directory.display());
    for resource in scope.resources {
        log::debug!("Resource file path: {}", resource.path().display());
    }
    let mut aggregator = Aggregator::default();
    let html = embed_images(html, scope, &mut aggregator)?;
    let html = embed_stylesheets(html, scope, &mut aggregator)?;
    log::info!("Processed linked resources in HTML content.");
    Ok(aggregator.wrap(html))
}

fn embed_images(mut html: Html, scope: &EmbedScope<'_>, aggregator: &mut Aggregator) -> Result<Html> {
    let mut edits = Vec::new();
    for path in html.select(|element| element.has_tag("img")) {
        let Some(src) = reference_value(&html, &path, "img", "src", aggregator) else {
            continue
        };
        match scope.resolve(&src) {
            Resolution::Found(resource) => match resource.bytes() {
                Ok([]) => {
                    aggregator.warn(Warning::resource_empty("img", &src, resource.path()));
                    edits.push(Edit::Detach { path, reference: src });
                }
                Ok(bytes) => {
                    log::info!("Embedding image: {}", resource.path().display());
                    aggregator.images.push(ExtractedImage {
                        reference: src.clone(),
                        path: resource.path().to_path_buf(),
                        bytes: bytes.to_vec(),
                    });
                    let node = Html::Text(scope.placeholder_for(&src));
                    edits.push(Edit::Replace { path, node, reference: src });
                }
                Err(error) => {
                    aggregator.warn(Warning::resource_unreadable("img", &src, resource.path(), &error));
                    edits.push(Edit::Detach { path, reference: src });
                }
            },
            Resolution::NotFound { expected } => {
                aggregator.warn(Warning::resource_not_found("img", &src, expected));
                edits.push(Edit::Detach { path, reference: src });
            }
        }
    }
    apply_edits(&mut html, edits, Stage::EmbedImages)?;
    Ok(html)
}

fn embed_stylesheets(mut html: Html, scope: &EmbedScope<'_>, aggregator: &mut Aggregator) -> Result<Html> {
    let mut edits = Vec::new();
    for path in html.select(is_stylesheet_link) {
        let Some(href) = reference_value(&html, &path, "link", "href", aggregator) else {
            continue
        };
        match scope.resolve(&href) {
            Resolution::Found(resource) => match inline_stylesheet(resource) {
                Ok(node) => {
                    log::info!("Inlining stylesheet: {}", resource.path().display());
                    edits.push(Edit::Replace { path, node, reference: href });
                }
                Err(error) => {
                    aggregator.warn(Warning::resource_unreadable("link", &href, resource.path(), &error));
                    edits.push(Edit::Detach { path, reference: href });
                }
            },
            Resolution::NotFound { expected } => {
                aggregator.warn(Warning::resource_not_found("link", &href, expected));
                edits.push(Edit::Detach { path, reference: href });
            }
        }
    }
    apply_edits(&mut html, edits, Stage::EmbedStylesheets)?;
    Ok(html)
}

fn is_stylesheet_link(element: &Element) -> bool {
    element.has_tag("link") && element.attrs.get("rel") == Some("stylesheet")
}

/// The stylesheet as a `style` element. Every `<` becomes the CSS escape
/// `\3c `, which reads the same inside strings and `url()` and cannot open
/// or close markup.
fn inline_stylesheet(resource: &ResourceFile) -> std::io::Result<Html> {
    let source_code = resource.text()?.replace('<', "\\3c ");
    let style = Element::new("style").with_children(vec![Html::Text(source_code)]);
    Ok(Html::Element(style))
}

/// The non-empty reference attribute of the element at `path`. Elements
/// without one are left alone and reported.
fn reference_value(
    html: &Html,
    path: &NodePath,
    tag: &str,
    attribute: &str,
    aggregator: &mut Aggregator,
) -> Option<String> {
    let value = html
        .get(path)
        .and_then(Html::as_element)
        .and_then(|element| element.attrs.get(attribute))
        .filter(|value| !value.is_empty());
    if value.is_none() {
        aggregator.warn(Warning::missing_attribute(tag, attribute));
    }
    value.map(ToOwned::to_owned)
}

/// Applies edits last-to-first so that detaching a node never shifts the
/// path of an edit still pending.
fn apply_edits(html: &mut Html, edits: Vec<Edit>, stage: Stage) -> Result<()> {
    for edit in edits.into_iter().rev() {
        let (outcome, reference) = match edit {
            Edit::Replace { path, node, reference } => (html.replace(&path, node), reference),
            Edit::Detach { path, reference } => (html.detach(&path), reference),
        };
        if let Err(source) = outcome {
            log::error!("tree mutation failed during {stage} for {reference:?}: {source}");
            return Err(ConversionError::InternalTreeMutation { stage, reference, source })
        }
    }
    Ok(())
}
