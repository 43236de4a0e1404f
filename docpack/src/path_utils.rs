use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Resolves `.`/`..` segments and anchors relative paths at the current
/// working directory.
///
/// Purely lexical: symlinks are not followed and the path does not need to
/// exist.
///
/// ### Example
/// ```
/// use docpack::path_utils::normalize;
/// assert_eq!(normalize("/x/./y/../z.png"), std::path::PathBuf::from("/x/z.png"));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.has_root() {
        return path_clean::clean(path)
    }
    let working_dir = std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from(std::path::MAIN_SEPARATOR_STR));
    path_clean::clean(working_dir.join(path))
}

/// The deepest directory that contains every given file.
///
/// Directory segments are compared case-insensitively. File names never take
/// part, so a single path yields its containing directory. An empty input
/// yields an empty path; rooted inputs always yield a rooted result.
///
/// ### Example
/// ```
/// use docpack::path_utils::common_base_directory;
/// let base = common_base_directory(["/x/y/f1.txt", "/x/y/sub/f2.txt"]);
/// assert_eq!(base, std::path::PathBuf::from("/x/y"));
/// ```
pub fn common_base_directory<I, P>(paths: I) -> PathBuf
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut normalized = paths.into_iter().map(normalize);
    let Some(first) = normalized.next() else {
        return PathBuf::new()
    };
    let rooted = first.has_root();
    let mut common = directory_segments(&first);
    for path in normalized {
        let segments = directory_segments(&path);
        let shared = common
            .iter()
            .zip(segments.iter())
            .take_while(|(left, right)| segments_match(left, right))
            .count();
        common.truncate(shared);
    }
    let mut result = if rooted {
        PathBuf::from(std::path::MAIN_SEPARATOR_STR)
    } else {
        PathBuf::new()
    };
    for segment in common {
        result.push(segment);
    }
    result
}

/// Directory segments of a normalized file path, without the root marker.
fn directory_segments(path: &Path) -> Vec<OsString> {
    path.parent()
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_owned()),
            Component::Normal(segment) => Some(segment.to_owned()),
            Component::RootDir | Component::CurDir | Component::ParentDir => None,
        })
        .collect()
}

pub fn segments_match(left: &OsString, right: &OsString) -> bool {
    left == right || eq_ignore_case(&left.to_string_lossy(), &right.to_string_lossy())
}

pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

/// Expands each entry as a glob pattern, falling back to a literal path when
/// the entry is not a valid pattern.
pub fn resolve_file_path_patterns(patterns: &[String]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    fn resolve_entry_as_glob(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut results = Vec::<PathBuf>::new();
        for entry in glob::glob(pattern)? {
            let path = entry?;
            if path.is_file() {
                results.push(path);
            }
        }
        Ok(results)
    }
    let mut results = Vec::<PathBuf>::new();
    for pattern in patterns {
        match resolve_entry_as_glob(pattern) {
            Ok(paths) => results.extend(paths),
            Err(_) => results.push(PathBuf::from(pattern)),
        }
    }
    Ok(results)
}
