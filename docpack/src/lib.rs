//! Turns an HTML document and the files it references into one
//! self-contained document: disallowed elements are stripped, images are
//! pulled out into pictures, and linked stylesheets are inlined.

pub mod archive;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod html;
pub mod html_parser;
pub mod html_string;
pub mod manifest;
pub mod pass;
pub mod path_utils;
pub mod render;
pub mod resolve;
pub mod resource;

pub use convert::{CancellationToken, Conversion, ConversionRequest, Converter};
pub use error::{ConversionError, Result, Stage};
