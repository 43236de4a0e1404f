use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Result, Stage};
use crate::html::Html;
use crate::pass::embed::{embed_resources, EmbedScope};
use crate::pass::sanitize::sanitize;
use crate::pass::system::{State, Warning};
use crate::render::{DocumentBuilder, OutputFormat};
use crate::resource::ResourceSet;

/// One HTML document and the files it may reference.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub html_content: String,
    pub resources: ResourceSet,
}

/// The rendered document plus everything that was dropped along the way.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub warnings: Vec<Warning>,
    pub image_count: usize,
}

/// Cooperative cancellation, checked between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
    fn check(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            log::info!("conversion cancelled before the {stage} stage");
            return Err(ConversionError::Cancelled { stage })
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    pub config: ConversionConfig,
    pub format: OutputFormat,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Converter { config, format: OutputFormat::default() }
    }

    /// Validate, sanitize and embed. The returned tree is what gets rendered;
    /// the aggregator holds the extracted images and the warnings.
    pub fn prepare(&self, request: &ConversionRequest, cancel: &CancellationToken) -> Result<State<Html>> {
        cancel.check(Stage::Validate)?;
        if request.html_content.is_empty() {
            log::error!("HTML content cannot be null or empty.");
            return Err(ConversionError::InvalidInput("HTML content cannot be empty".into()))
        }
        log::info!("Resource files count: {}", request.resources.len());

        cancel.check(Stage::Sanitize)?;
        log::info!("Sanitizing HTML content.");
        let sanitized = sanitize(
            &request.html_content,
            &self.config.parser_mode,
            &self.config.disallowed_tags,
        )?;

        cancel.check(Stage::EmbedImages)?;
        log::info!("Processing HTML content for embedded resources.");
        let scope = EmbedScope::new(&request.resources, self.config.policy, &self.config.placeholder);
        sanitized.try_and_then(|html| embed_resources(html, &scope))
    }

    /// Runs the whole pipeline into `builder`. Either the full document comes
    /// back or a single error; never a partial document.
    pub fn convert<B: DocumentBuilder>(
        &self,
        request: &ConversionRequest,
        mut builder: B,
        cancel: &CancellationToken,
    ) -> Result<Conversion> {
        let State { aggregator, value: html } = self.prepare(request, cancel)?;

        cancel.check(Stage::Render)?;
        let section = builder.add_section();
        let paragraph = builder.add_paragraph(section);
        log::info!("Adding HTML content to the document.");
        builder
            .append_html(paragraph, &html.html_string())
            .map_err(|source| {
                log::error!("Error in append_html: {source}");
                ConversionError::RenderingFailed { source }
            })?;
        for image in &aggregator.images {
            let paragraph = builder.add_paragraph(section);
            builder
                .append_picture(paragraph, &image.bytes)
                .map_err(|source| {
                    log::error!("Error appending picture {:?}: {source}", image.reference);
                    ConversionError::RenderingFailed { source }
                })?;
        }
        let bytes = builder.serialize(self.format)?;
        log::info!("Document serialized ({} bytes).", bytes.len());

        Ok(Conversion {
            bytes,
            warnings: aggregator.warnings,
            image_count: aggregator.images.len(),
        })
    }
}
