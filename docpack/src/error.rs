//! Errors that terminate a conversion.
//!
//! Per-reference problems (a missing image, an empty `src`) are not errors;
//! they end up as [`Warning`](crate::pass::system::Warning)s.

use std::fmt;

use thiserror::Error;

use crate::html::TreeMutationError;
use crate::render::{AppendError, SerializeError};

/// Pipeline stage, used to tag fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validate,
    Sanitize,
    EmbedImages,
    EmbedStylesheets,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Sanitize => "sanitize",
            Self::EmbedImages => "embed-images",
            Self::EmbedStylesheets => "embed-stylesheets",
            Self::Render => "render",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed HTML input: {0}")]
    MalformedInput(String),

    #[error("failed to append HTML content to the document")]
    RenderingFailed {
        #[source]
        source: AppendError,
    },

    #[error("tree mutation failed during {stage} for reference {reference:?}")]
    InternalTreeMutation {
        stage: Stage,
        reference: String,
        #[source]
        source: TreeMutationError,
    },

    #[error("conversion cancelled before the {stage} stage")]
    Cancelled { stage: Stage },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] SerializeError),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
