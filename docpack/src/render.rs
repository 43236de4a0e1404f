//! The document builder the pipeline hands its output to.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphId {
    section: usize,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A standalone HTML file with pictures as data URIs.
    #[default]
    Html,
}

/// The builder rejected content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct AppendError {
    pub reason: String,
}

impl AppendError {
    pub fn new(reason: impl Into<String>) -> Self {
        AppendError { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot write {format:?}: {reason}")]
pub struct SerializeError {
    pub format: OutputFormat,
    pub reason: String,
}

/// Assembles a document from sections, paragraphs, HTML fragments and
/// pictures. Creating a builder is creating a new document.
pub trait DocumentBuilder {
    fn add_section(&mut self) -> SectionId;
    fn add_paragraph(&mut self, section: SectionId) -> ParagraphId;
    fn append_html(&mut self, paragraph: ParagraphId, html: &str) -> Result<(), AppendError>;
    fn append_picture(&mut self, paragraph: ParagraphId, bytes: &[u8]) -> Result<(), AppendError>;
    fn serialize(&self, format: OutputFormat) -> Result<Vec<u8>, SerializeError>;
}

// ————————————————————————————————————————————————————————————————————————————
// HTML BUNDLE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Html(String),
    Picture { mime: &'static str, data: String },
}

#[derive(Debug, Clone, Default)]
struct Section {
    paragraphs: Vec<Vec<Content>>,
}

/// Writes the document as one self-contained HTML file.
#[derive(Debug, Clone, Default)]
pub struct HtmlBundleBuilder {
    title: Option<String>,
    sections: Vec<Section>,
}

impl HtmlBundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    fn paragraph_mut(&mut self, paragraph: ParagraphId) -> Result<&mut Vec<Content>, AppendError> {
        self.sections
            .get_mut(paragraph.section)
            .and_then(|section| section.paragraphs.get_mut(paragraph.index))
            .ok_or_else(|| AppendError::new(format!("unknown paragraph {paragraph:?}")))
    }
}

impl DocumentBuilder for HtmlBundleBuilder {
    fn add_section(&mut self) -> SectionId {
        self.sections.push(Section::default());
        SectionId(self.sections.len() - 1)
    }
    /// A section this builder never issued yields a paragraph id that every
    /// `append_*` call rejects.
    fn add_paragraph(&mut self, section: SectionId) -> ParagraphId {
        let Some(found) = self.sections.get_mut(section.0) else {
            log::warn!("paragraph requested for unknown section {section:?}");
            return ParagraphId { section: section.0, index: usize::MAX }
        };
        found.paragraphs.push(Vec::new());
        ParagraphId { section: section.0, index: found.paragraphs.len() - 1 }
    }
    fn append_html(&mut self, paragraph: ParagraphId, html: &str) -> Result<(), AppendError> {
        if html.contains('\0') {
            return Err(AppendError::new("HTML fragment contains a NUL character"))
        }
        self.paragraph_mut(paragraph)?.push(Content::Html(html.to_string()));
        Ok(())
    }
    fn append_picture(&mut self, paragraph: ParagraphId, bytes: &[u8]) -> Result<(), AppendError> {
        if bytes.is_empty() {
            return Err(AppendError::new("picture has no data"))
        }
        let mime = sniff_image_mime(bytes);
        let data = STANDARD.encode(bytes);
        self.paragraph_mut(paragraph)?.push(Content::Picture { mime, data });
        Ok(())
    }
    fn serialize(&self, format: OutputFormat) -> Result<Vec<u8>, SerializeError> {
        match format {
            OutputFormat::Html => Ok(self.html_document().into_bytes()),
        }
    }
}

impl HtmlBundleBuilder {
    fn html_document(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Document");
        let mut output = String::from("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
        output.push_str("<title>");
        output.push_str(&html_escape::encode_text(title));
        output.push_str("</title></head><body>");
        for section in &self.sections {
            output.push_str("<section>");
            for paragraph in &section.paragraphs {
                output.push_str("<div class=\"paragraph\">");
                for content in paragraph {
                    match content {
                        Content::Html(html) => output.push_str(html),
                        Content::Picture { mime, data } => {
                            output.push_str(&format!("<img src=\"data:{mime};base64,{data}\">"));
                        }
                    }
                }
                output.push_str("</div>");
            }
            output.push_str("</section>");
        }
        output.push_str("</body></html>");
        output
    }
}

/// Guesses an image MIME type from its leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"BM", "image/bmp"),
    ];
    if let Some((_, mime)) = SIGNATURES.iter().find(|(magic, _)| bytes.starts_with(magic)) {
        return *mime
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return "image/webp"
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return "image/svg+xml"
    }
    "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0";

    #[test]
    fn sections_paragraphs_and_pictures_are_written_in_order() {
        let mut builder = HtmlBundleBuilder::new().with_title("Q3 <report>");
        let section = builder.add_section();
        let text = builder.add_paragraph(section);
        builder.append_html(text, "<p>hello</p>").unwrap();
        let picture = builder.add_paragraph(section);
        builder.append_picture(picture, PNG).unwrap();
        let output = String::from_utf8(builder.serialize(OutputFormat::Html).unwrap()).unwrap();
        let expected = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Q3 &lt;report&gt;</title></head><body><section><div class=\"paragraph\"><p>hello</p></div><div class=\"paragraph\"><img src=\"data:image/png;base64,{}\"></div></section></body></html>",
            STANDARD.encode(PNG),
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn nul_characters_are_rejected() {
        let mut builder = HtmlBundleBuilder::new();
        let section = builder.add_section();
        let paragraph = builder.add_paragraph(section);
        assert!(builder.append_html(paragraph, "<p>\0</p>").is_err());
        assert!(builder.append_picture(paragraph, &[]).is_err());
    }

    #[test]
    fn foreign_paragraph_ids_are_rejected() {
        let mut other = HtmlBundleBuilder::new();
        let section = other.add_section();
        let paragraph = other.add_paragraph(section);
        let mut builder = HtmlBundleBuilder::new();
        assert!(builder.append_html(paragraph, "<p>x</p>").is_err());
    }

    #[test]
    fn foreign_section_ids_do_not_panic() {
        let mut other = HtmlBundleBuilder::new();
        other.add_section();
        let foreign = other.add_section();
        let mut builder = HtmlBundleBuilder::new();
        let paragraph = builder.add_paragraph(foreign);
        assert!(builder.append_html(paragraph, "<p>x</p>").is_err());
        assert!(builder.append_picture(paragraph, b"GIF89a").is_err());
        let output = String::from_utf8(builder.serialize(OutputFormat::Html).unwrap()).unwrap();
        assert!(!output.contains("paragraph"));
    }

    #[test]
    fn mime_sniffing() {
        assert_eq!(sniff_image_mime(PNG), "image/png");
        assert_eq!(sniff_image_mime(b"\xff\xd8\xff\xe0rest"), "image/jpeg");
        assert_eq!(sniff_image_mime(b"GIF89a...."), "image/gif");
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_image_mime(b"  <svg xmlns=\"http://www.w3.org/2000/svg\"/>"), "image/svg+xml");
        assert_eq!(sniff_image_mime(b"plain"), "application/octet-stream");
    }
}
