//! Tree passes of the conversion pipeline: sanitize, then embed.

pub mod system;
pub mod sanitize;
pub mod embed;
