use std::fs::File;
use std::io::Write;

use docpack::archive::extract_to_temp;
use docpack::render::HtmlBundleBuilder;
use docpack::{CancellationToken, ConversionRequest, Converter};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[test]
fn uploaded_bundle_converts_end_to_end() {
    let dir = TempDir::new().unwrap();
    let zip_path = dir.path().join("Upload.ZIP");
    let mut zip = ZipWriter::new(File::create(&zip_path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let entries: [(&str, &[u8]); 3] = [
        ("report/index.html", b"<html><head><link rel=\"stylesheet\" href=\"style.css\"></head><body><img src=\"chart.gif\"></body></html>"),
        ("report/style.css", b"body { margin: 0 }"),
        ("report/chart.gif", b"GIF89a\x01\0\x01\0"),
    ];
    for (name, bytes) in entries {
        zip.start_file(name, stored).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();

    let upload = extract_to_temp(&zip_path).unwrap();
    let html_content = std::fs::read_to_string(&upload.upload.html_path).unwrap();
    let request = ConversionRequest { html_content, resources: upload.upload.resources.clone() };
    let conversion = Converter::default()
        .convert(&request, HtmlBundleBuilder::new(), &CancellationToken::new())
        .unwrap();
    let output = String::from_utf8(conversion.bytes).unwrap();

    assert_eq!(conversion.image_count, 1);
    assert!(output.contains("<style>body { margin: 0 }</style>"));
    assert!(output.contains("data:image/gif;base64,"));
    assert!(output.contains("[Embedded Image: chart.gif]"));
}
