use serde::{Deserialize, Serialize};

use crate::html::ParserMode;
use crate::pass::embed::DEFAULT_PLACEHOLDER;
use crate::pass::sanitize::DEFAULT_DISALLOWED_TAGS;
use crate::resolve::MatchPolicy;

/// Knobs for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub policy: MatchPolicy,

    #[serde(default)]
    pub parser_mode: ParserMode,

    /// Text that replaces an embedded image; `{src}` expands to the original
    /// reference.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default = "default_disallowed_tags")]
    pub disallowed_tags: Vec<String>,
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

fn default_disallowed_tags() -> Vec<String> {
    DEFAULT_DISALLOWED_TAGS
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            policy: MatchPolicy::default(),
            parser_mode: ParserMode::default(),
            placeholder: default_placeholder(),
            disallowed_tags: default_disallowed_tags(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_gives_defaults() {
        let config: ConversionConfig = toml::from_str("").unwrap();
        assert_eq!(config, ConversionConfig::default());
        assert_eq!(config.disallowed_tags, vec!["script", "style"]);
    }

    #[test]
    fn every_field_can_be_overridden() {
        let config: ConversionConfig = toml::from_str(r#"
            policy = "suffix"
            placeholder = "[image {src}]"
            disallowed_tags = ["script", "style", "iframe"]

            [parser_mode.fragment]
            context = "body"
        "#).unwrap();
        assert_eq!(config.policy, MatchPolicy::Suffix);
        assert_eq!(config.parser_mode, ParserMode::fragment("body"));
        assert_eq!(config.placeholder, "[image {src}]");
        assert_eq!(config.disallowed_tags.len(), 3);
    }
}
