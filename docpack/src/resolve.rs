use std::borrow::Cow;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::path_utils::{eq_ignore_case, normalize};
use crate::resource::{ResourceFile, ResourceSet};

/// How an HTML reference is matched against the resource files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Join the reference onto the common base directory and compare full
    /// normalized paths.
    #[default]
    ExactPath,
    /// Accept any resource whose path ends with the reference.
    Suffix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a ResourceFile),
    NotFound {
        /// What the lookup was looking for, for diagnostics.
        expected: String,
    },
}

impl<'a> Resolution<'a> {
    pub fn found(&self) -> Option<&'a ResourceFile> {
        match self {
            Self::Found(file) => Some(file),
            Self::NotFound { .. } => None,
        }
    }
}

/// Finds the resource an HTML `src`/`href` value points at.
///
/// The first match in set order wins. A missing resource is an ordinary
/// outcome, not an error.
pub fn resolve<'a>(
    reference: &str,
    resources: &'a ResourceSet,
    base_directory: &Path,
    policy: MatchPolicy,
) -> Resolution<'a> {
    let candidates = reference_candidates(reference);
    for candidate in &candidates {
        let found = match policy {
            MatchPolicy::ExactPath => find_exact(candidate, resources, base_directory),
            MatchPolicy::Suffix => find_suffix(candidate, resources),
        };
        if let Some(file) = found {
            log::debug!("resolved {reference:?} to {:?}", file.path());
            return Resolution::Found(file)
        }
    }
    let expected = match policy {
        MatchPolicy::ExactPath => expected_path(&candidates[0], base_directory),
        MatchPolicy::Suffix => format!("*{}", candidates[0]),
    };
    Resolution::NotFound { expected }
}

/// The full path the exact policy compares against.
pub fn expected_path(reference: &str, base_directory: &Path) -> String {
    normalize(base_directory.join(reference)).to_string_lossy().into_owned()
}

fn find_exact<'a>(reference: &str, resources: &'a ResourceSet, base_directory: &Path) -> Option<&'a ResourceFile> {
    let expected = expected_path(reference, base_directory);
    resources.iter().find(|file| {
        eq_ignore_case(&normalize(file.path()).to_string_lossy(), &expected)
    })
}

fn find_suffix<'a>(reference: &str, resources: &'a ResourceSet) -> Option<&'a ResourceFile> {
    let suffix = unify_separators(reference).to_lowercase();
    resources.iter().find(|file| {
        let path = normalize(file.path());
        unify_separators(&path.to_string_lossy()).to_lowercase().ends_with(&suffix)
    })
}

fn unify_separators(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// The reference without query or fragment, then its percent-decoded form
/// when that differs.
fn reference_candidates(reference: &str) -> Vec<String> {
    let trimmed = reference
        .split(['?', '#'])
        .next()
        .filter(|x| !x.is_empty())
        .unwrap_or(reference);
    let mut candidates = vec![trimmed.to_string()];
    if let Ok(decoded) = percent_encoding::percent_decode_str(trimmed).decode_utf8() {
        if decoded != trimmed {
            candidates.push(decoded.into_owned());
        }
    }
    candidates
}
