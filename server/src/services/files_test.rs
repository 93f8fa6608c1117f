use super::*;
use crate::state::test_helpers;
use tokio::time::{Duration, sleep, timeout};

async fn wait_for_file(path: &Path) -> Vec<u8> {
    timeout(Duration::from_secs(2), async {
        loop {
            if let Ok(bytes) = tokio::fs::read(path).await {
                return bytes;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("writer should write the file")
}

#[test]
fn image_subtype_accepts_image_types() {
    assert_eq!(image_subtype(Some("image/png")).as_deref(), Some("png"));
    assert_eq!(image_subtype(Some("IMAGE/JPEG")).as_deref(), Some("jpeg"));
    assert_eq!(image_subtype(Some("image/gif; charset=binary")).as_deref(), Some("gif"));
}

#[test]
fn image_subtype_rejects_everything_else() {
    assert!(image_subtype(None).is_none());
    assert!(image_subtype(Some("text/plain")).is_none());
    assert!(image_subtype(Some("image/")).is_none());
    assert!(image_subtype(Some("image")).is_none());
    assert!(image_subtype(Some("image/svg+xml")).is_none());
    assert!(image_subtype(Some("image/../../etc")).is_none());
}

#[test]
fn parse_file_name_splits_fid_and_extension() {
    assert_eq!(parse_file_name("12.png"), Some((12, "png")));
    assert_eq!(parse_file_name("3.tar.gz"), Some((3, "tar.gz")));
}

#[test]
fn parse_file_name_rejects_malformed_names() {
    assert!(parse_file_name("").is_none());
    assert!(parse_file_name("12").is_none());
    assert!(parse_file_name("12.").is_none());
    assert!(parse_file_name("abc.png").is_none());
    assert!(parse_file_name("1/2.png").is_none());
    assert!(parse_file_name("..%2f.png").is_none());
}

#[tokio::test]
async fn accepted_upload_is_recorded_and_written() {
    let state = test_helpers::test_app_state().await;

    let fid = accept_upload(&state, "cat.png", Some("image/png"), Bytes::from_static(b"png-bytes"))
        .await
        .unwrap();

    let row = state.store.find_file(fid).await.unwrap().unwrap();
    assert_eq!(row.ctype, "png");
    assert_eq!(row.name, "cat.png");

    let written = wait_for_file(&state.config.upload.dir.join(format!("{fid}.png"))).await;
    assert_eq!(written, b"png-bytes");

    let (ctype, bytes) = load_file(&state, &format!("{fid}.png")).await.unwrap();
    assert_eq!(ctype, "png");
    assert_eq!(bytes, b"png-bytes");
}

#[tokio::test]
async fn non_image_upload_is_rejected_without_row() {
    let state = test_helpers::test_app_state().await;
    let result = accept_upload(&state, "notes.txt", Some("text/plain"), Bytes::from_static(b"hi")).await;
    assert!(matches!(result, Err(FileError::NotAnImage)));
    assert!(state.store.find_file(1).await.unwrap().is_none());
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let state = test_helpers::test_app_state().await;
    let big = Bytes::from(vec![0_u8; state.config.upload.max_bytes + 1]);
    let result = accept_upload(&state, "big.png", Some("image/png"), big).await;
    assert!(matches!(result, Err(FileError::TooLarge { max: 1024 })));
}

#[tokio::test]
async fn full_queue_refuses_upload_without_leaving_a_row() {
    let mut state = test_helpers::test_app_state().await;
    let (tx, _rx) = mpsc::channel::<PendingFile>(1);
    state.uploads = tx;

    let first = accept_upload(&state, "a.png", Some("image/png"), Bytes::from_static(b"a")).await;
    assert_eq!(first.unwrap(), 1);

    let second = accept_upload(&state, "b.png", Some("image/png"), Bytes::from_static(b"b")).await;
    assert!(matches!(second, Err(FileError::QueueFull)));
    assert!(state.store.find_file(2).await.unwrap().is_none());
}

#[tokio::test]
async fn stopped_writer_refuses_upload() {
    let mut state = test_helpers::test_app_state().await;
    let (tx, rx) = mpsc::channel::<PendingFile>(1);
    drop(rx);
    state.uploads = tx;

    let result = accept_upload(&state, "a.png", Some("image/png"), Bytes::from_static(b"a")).await;
    assert!(matches!(result, Err(FileError::WriterStopped)));
}

#[tokio::test]
async fn writer_spaces_out_writes() {
    let dir = test_helpers::temp_upload_dir().await;
    let interval = Duration::from_millis(150);
    let tx = spawn_upload_writer(UploadConfig { dir: dir.clone(), max_bytes: 16, queue_size: 4, interval });

    let started = Instant::now();
    for fid in 1..=2 {
        tx.send(PendingFile { fid, ctype: "png".into(), bytes: Bytes::from_static(b"x") })
            .await
            .unwrap();
    }
    wait_for_file(&dir.join("1.png")).await;
    wait_for_file(&dir.join("2.png")).await;

    assert!(started.elapsed() >= interval);
}

#[tokio::test]
async fn load_file_with_wrong_extension_is_not_found() {
    let state = test_helpers::test_app_state().await;
    let fid = state.store.insert_file("png", "a.png", 0).await.unwrap();

    assert!(matches!(load_file(&state, &format!("{fid}.gif")).await, Err(FileError::NotFound)));
    // Row exists but the writer never saw the bytes.
    assert!(matches!(load_file(&state, &format!("{fid}.png")).await, Err(FileError::NotFound)));
    assert!(matches!(load_file(&state, "99.png").await, Err(FileError::NotFound)));
    assert!(matches!(load_file(&state, "nope").await, Err(FileError::BadName)));
}
