use super::*;

#[test]
fn content_type_for_known_image_extensions() {
    assert_eq!(content_type_for(Path::new("a.png")), "image/png");
    assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("dir/a.jpeg")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("a.gif")), "image/gif");
    assert_eq!(content_type_for(Path::new("a.webp")), "image/webp");
}

#[test]
fn content_type_for_unknown_falls_back_to_octet_stream() {
    assert_eq!(content_type_for(Path::new("notes.txt")), "application/octet-stream");
    assert_eq!(content_type_for(Path::new("no_extension")), "application/octet-stream");
    // The server stores alphanumeric image subtypes only.
    assert_eq!(content_type_for(Path::new("logo.svg")), "application/octet-stream");
}

#[tokio::test]
async fn from_path_reads_bytes_and_name() {
    let path = std::env::temp_dir().join(format!("quad-page-test-{}.png", std::process::id()));
    tokio::fs::write(&path, b"pixels").await.unwrap();

    let upload = FileUpload::from_path(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(upload.bytes, b"pixels");
    assert_eq!(upload.content_type, "image/png");
    assert!(upload.name.starts_with("quad-page-test-"));
}

#[tokio::test]
async fn from_path_missing_file_is_error() {
    let path = std::env::temp_dir().join("quad-page-test-does-not-exist.png");
    assert!(FileUpload::from_path(&path).await.is_err());
}

#[test]
fn recording_page_keeps_last_status() {
    let page = test_helpers::RecordingPage::default();
    page.set_status("one");
    page.set_status("two");
    assert_eq!(page.last_status().as_deref(), Some("two"));
    assert_eq!(page.statuses().len(), 2);
}
