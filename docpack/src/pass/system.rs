use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// The HTML parser recovered from invalid markup.
    ParseErrors,
    /// A reference element without a usable `src`/`href`.
    MissingAttribute,
    ResourceNotFound,
    /// The resource matched but its bytes could not be read.
    ResourceUnreadable,
    /// The resource matched but holds no bytes.
    ResourceEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_path: Option<String>,
}

impl Warning {
    pub fn parse_errors(errors: &[String]) -> Self {
        Warning {
            kind: WarningKind::ParseErrors,
            message: format!("HTML content contains {} parse error(s)", errors.len()),
            reference: None,
            expected_path: None,
        }
    }
    pub fn missing_attribute(tag: &str, attribute: &str) -> Self {
        Warning {
            kind: WarningKind::MissingAttribute,
            message: format!("Skipping <{tag}> tag with missing '{attribute}' attribute"),
            reference: None,
            expected_path: None,
        }
    }
    pub fn resource_not_found(tag: &str, reference: &str, expected: String) -> Self {
        Warning {
            kind: WarningKind::ResourceNotFound,
            message: format!("Resource file for <{tag}> tag not found: {reference}. Expected path: {expected}"),
            reference: Some(reference.to_string()),
            expected_path: Some(expected),
        }
    }
    pub fn resource_unreadable(tag: &str, reference: &str, path: &std::path::Path, error: &std::io::Error) -> Self {
        Warning {
            kind: WarningKind::ResourceUnreadable,
            message: format!("Resource file for <{tag}> tag could not be read: {}: {error}", path.display()),
            reference: Some(reference.to_string()),
            expected_path: Some(path.to_string_lossy().into_owned()),
        }
    }
    pub fn resource_empty(tag: &str, reference: &str, path: &std::path::Path) -> Self {
        Warning {
            kind: WarningKind::ResourceEmpty,
            message: format!("Resource file for <{tag}> tag is empty: {}", path.display()),
            reference: Some(reference.to_string()),
            expected_path: Some(path.to_string_lossy().into_owned()),
        }
    }
}

/// An image pulled out of the tree, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// The original `src` value.
    pub reference: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Side results collected while a pass walks the tree.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    pub warnings: Vec<Warning>,
    pub images: Vec<ExtractedImage>,
}

impl Aggregator {
    pub fn wrap<Value>(self, value: Value) -> State<Value> {
        State { aggregator: self, value }
    }
    /// Records a warning and mirrors it to the log.
    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning.message);
        self.warnings.push(warning);
    }
    pub fn merge(mut self, other: Self) -> Self {
        self.warnings.extend(other.warnings);
        self.images.extend(other.images);
        self
    }
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |warning| warning.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct State<T> {
    pub aggregator: Aggregator,
    pub value: T,
}

impl<T> State<T> {
    pub fn map<Result>(self, apply: impl FnOnce(T) -> Result) -> State<Result> {
        State { aggregator: self.aggregator, value: apply(self.value) }
    }
    /// Runs the next pass, appending its side results after this one's.
    pub fn try_and_then<Result, Error>(
        self,
        apply: impl FnOnce(T) -> std::result::Result<State<Result>, Error>,
    ) -> std::result::Result<State<Result>, Error> {
        let State { aggregator, value } = apply(self.value)?;
        Ok(State {
            aggregator: self.aggregator.merge(aggregator),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_passes_keep_warnings_in_stage_order() {
        let mut aggregator = Aggregator::default();
        aggregator.warn(Warning::missing_attribute("img", "src"));
        let first = aggregator.wrap(1).map(|value| value + 1);
        let second = first.try_and_then(|value| {
            let mut aggregator = Aggregator::default();
            aggregator.warn(Warning::resource_not_found("img", "a.png", "/base/a.png".into()));
            Ok::<_, ()>(aggregator.wrap(value * 10))
        }).unwrap();
        assert_eq!(second.value, 20);
        let kinds = second.aggregator.warnings.iter().map(|x| x.kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![WarningKind::MissingAttribute, WarningKind::ResourceNotFound]);
    }

    #[test]
    fn try_and_then_short_circuits() {
        let result: Result<State<u8>, &str> = Aggregator::default().wrap(1u8).try_and_then(|_| Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[test]
    fn warnings_serialize_without_empty_fields() {
        let json = serde_json::to_string(&Warning::missing_attribute("link", "href")).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"missing-attribute","message":"Skipping <link> tag with missing 'href' attribute"}"#
        );
    }
}
