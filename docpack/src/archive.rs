//! Unpacking uploaded `.zip` bundles into an HTML document plus resources.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use zip::ZipArchive;

use crate::resource::ResourceSet;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("{0:?} is not a .zip file")]
    NotAZip(PathBuf),

    #[error("archive {0:?} contains no HTML file")]
    NoHtml(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// The extracted document and every other file that came with it.
#[derive(Debug, Clone)]
pub struct ExtractedUpload {
    pub html_path: PathBuf,
    pub resources: ResourceSet,
}

/// An [`ExtractedUpload`] living in a temporary directory. The directory is
/// removed on drop, so keep this alive until conversion has finished.
#[derive(Debug)]
pub struct TempUpload {
    pub upload: ExtractedUpload,
    dir: TempDir,
}

impl TempUpload {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn has_extension(path: &Path, expected: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| expected.iter().any(|x| ext.eq_ignore_ascii_case(x)))
}

/// Extracts `zip_path` into `dest`. The first HTML file in sorted path order
/// becomes the document; everything else is a resource.
pub fn extract(zip_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<ExtractedUpload, ArchiveError> {
    let zip_path = zip_path.as_ref();
    let dest = dest.as_ref();
    if !has_extension(zip_path, &["zip"]) {
        log::error!("Uploaded file is not a zip: {}", zip_path.display());
        return Err(ArchiveError::NotAZip(zip_path.to_path_buf()))
    }
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    log::info!("Extracting {} entries from {}", archive.len(), zip_path.display());

    let mut extracted = Vec::<PathBuf>::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("skipping archive entry with unsafe name {:?}", entry.name());
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut output = File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
        log::debug!("extracted {}", target.display());
        extracted.push(target);
    }
    extracted.sort();

    let html_index = extracted
        .iter()
        .position(|path| has_extension(path, &["html", "htm"]))
        .ok_or_else(|| {
            log::error!("No HTML file found in the zip archive.");
            ArchiveError::NoHtml(zip_path.to_path_buf())
        })?;
    let html_path = extracted.remove(html_index);
    log::info!("HTML file: {}", html_path.display());
    Ok(ExtractedUpload {
        html_path,
        resources: extracted.into_iter().collect(),
    })
}

/// [`extract`] into a fresh temporary directory.
pub fn extract_to_temp(zip_path: impl AsRef<Path>) -> Result<TempUpload, ArchiveError> {
    let dir = tempfile::Builder::new().prefix("docpack-").tempdir()?;
    let upload = extract(zip_path, dir.path())?;
    Ok(TempUpload { upload, dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn picks_the_first_html_file_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("upload.zip");
        write_zip(&zip_path, &[
            ("site/z.html", b"<p>z</p>"),
            ("site/img/a.png", b"png"),
            ("site/index.HTML", b"<p>index</p>"),
        ]);
        let upload = extract_to_temp(&zip_path).unwrap();
        assert!(upload.upload.html_path.ends_with("site/index.HTML"));
        assert_eq!(std::fs::read_to_string(&upload.upload.html_path).unwrap(), "<p>index</p>");
        let resources: Vec<_> = upload.upload.resources.paths().map(Path::to_path_buf).collect();
        assert_eq!(resources.len(), 2);
        assert!(resources[0].ends_with("site/img/a.png"));
        assert!(resources[1].ends_with("site/z.html"));
    }

    #[test]
    fn temporary_directory_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("upload.zip");
        write_zip(&zip_path, &[("index.html", b"<p></p>")]);
        let upload = extract_to_temp(&zip_path).unwrap();
        let extracted_dir = upload.dir().to_path_buf();
        assert!(extracted_dir.exists());
        drop(upload);
        assert!(!extracted_dir.exists());
    }

    #[test]
    fn rejects_non_zip_uploads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload.tar");
        std::fs::write(&path, b"nope").unwrap();
        assert!(matches!(extract(&path, dir.path()), Err(ArchiveError::NotAZip(_))));
    }

    #[test]
    fn rejects_archives_without_html() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("upload.zip");
        write_zip(&zip_path, &[("style.css", b"p{}")]);
        let dest = dir.path().join("out");
        assert!(matches!(extract(&zip_path, &dest), Err(ArchiveError::NoHtml(_))));
    }
}
