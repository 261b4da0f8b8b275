//! Integration test: native-messaging session against a real curl-backed host.
//!
//! Feeds framed requests the way the browser would, reads the framed replies,
//! and checks both the direct download on disk and the intercept handshake.

mod common;

use reptyle_core::coordinator::{CurlDownloadHost, DownloadCoordinator, DownloadId, PendingSlot};
use reptyle_core::protocol::{read_frame, serve, Response, MAX_OUTGOING_FRAME};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::tempdir;

/// Frames requests as the browser does; its limit is larger than ours for replies.
fn frames(requests: &[serde_json::Value]) -> Cursor<Vec<u8>> {
    let mut buf = Vec::new();
    for r in requests {
        let body = serde_json::to_vec(r).unwrap();
        buf.extend_from_slice(&(body.len() as u32).to_ne_bytes());
        buf.extend_from_slice(&body);
    }
    Cursor::new(buf)
}

fn replies(raw: Vec<u8>) -> Vec<Response> {
    let mut cur = Cursor::new(raw);
    let mut out = Vec::new();
    while let Some(frame) = read_frame(&mut cur).unwrap() {
        out.push(serde_json::from_slice(&frame).unwrap());
    }
    out
}

fn metadata() -> serde_json::Value {
    json!({"network": " ExampleNet ", "title": "Sample Title", "actors": "Jane Doe", "date": "08/21/2024"})
}

#[test]
fn direct_download_lands_under_built_name() {
    let body: Vec<u8> = (0u8..=255).cycle().take(32 * 1024).collect();
    let base = common::video_server::start(body.clone());
    let download_dir = tempdir().unwrap();
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(download_dir.path()),
        Arc::new(PendingSlot::new()),
    );

    let mut data = metadata();
    data["url"] = json!(format!("{base}video.mp4"));
    let mut input = frames(&[json!({"action": "downloadVideo", "data": data})]);
    let mut output = Vec::new();
    let stats = serve(&mut input, &mut output, &coordinator).unwrap();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.failures, 0);

    let replies = replies(output);
    assert_eq!(replies, vec![Response::download_started(DownloadId(1))]);

    let path = coordinator.host().wait(DownloadId(1)).expect("download completes");
    assert_eq!(
        path,
        download_dir
            .path()
            .join("[ExampleNet] - 08-21-2024 - Sample Title - Jane Doe.mp4")
    );
    assert_eq!(std::fs::read(&path).unwrap(), body);
}

#[test]
fn repeated_direct_download_is_uniquified() {
    let base = common::video_server::start(b"abc".to_vec());
    let download_dir = tempdir().unwrap();
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(download_dir.path()),
        Arc::new(PendingSlot::new()),
    );
    let mut data = metadata();
    data["url"] = json!(format!("{base}video.mp4"));
    let request = json!({"action": "downloadVideo", "data": data});

    let mut output = Vec::new();
    serve(&mut frames(&[request.clone(), request]), &mut output, &coordinator).unwrap();
    let first = coordinator.host().wait(DownloadId(1)).unwrap();
    let second = coordinator.host().wait(DownloadId(2)).unwrap();
    assert_ne!(first, second);
    assert!(second
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("Jane Doe (1).mp4"));
}

#[test]
fn http_error_removes_partial_file() {
    let base = common::video_server::start(b"abc".to_vec());
    let download_dir = tempdir().unwrap();
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(download_dir.path()),
        Arc::new(PendingSlot::new()),
    );
    let mut data = metadata();
    data["url"] = json!(format!("{base}missing.mp4"));
    let mut output = Vec::new();
    serve(
        &mut frames(&[json!({"action": "downloadVideo", "data": data})]),
        &mut output,
        &coordinator,
    )
    .unwrap();
    // The host accepted the request; the transfer fails afterwards.
    assert!(replies(output)[0].success);
    let err = coordinator.host().wait(DownloadId(1)).unwrap_err();
    assert!(format!("{err:#}").contains("404"));
    assert_eq!(std::fs::read_dir(download_dir.path()).unwrap().count(), 0);
}

#[test]
fn intercept_handshake_renames_exactly_one_download() {
    let download_dir = tempdir().unwrap();
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(download_dir.path()),
        Arc::new(PendingSlot::new()),
    );
    let started = |id: u64| {
        json!({"action": "determineFilename", "data": {"id": id, "url": "https://site.example/x", "filename": "x.mp4"}})
    };
    let mut input = frames(&[
        json!({"action": "prepareNativeDownload", "data": metadata()}),
        started(10),
        started(11),
        json!({"action": "bogus"}),
    ]);
    let mut output = Vec::new();
    let stats = serve(&mut input, &mut output, &coordinator).unwrap();
    assert_eq!(stats.requests, 4);
    assert_eq!(stats.failures, 1);

    let name = "[ExampleNet] - 08-21-2024 - Sample Title - Jane Doe.mp4";
    let replies = replies(output);
    assert_eq!(replies[0], Response::name_ready(name.to_string()));
    assert_eq!(replies[1].filename.as_deref(), Some(name));
    assert_eq!(
        serde_json::to_value(&replies[1]).unwrap()["conflictAction"],
        json!("uniquify")
    );
    assert_eq!(replies[2], Response::suggestion(None));
    assert!(!replies[3].success);
}

#[test]
fn later_prepare_wins_before_any_download_starts() {
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(tempdir().unwrap().path()),
        Arc::new(PendingSlot::new()),
    );
    let mut second = metadata();
    second["title"] = json!("Second Title");
    let mut input = frames(&[
        json!({"action": "prepareNativeDownload", "data": metadata()}),
        json!({"action": "prepareNativeDownload", "data": second}),
        json!({"action": "determineFilename", "data": {"id": 1}}),
    ]);
    let mut output = Vec::new();
    serve(&mut input, &mut output, &coordinator).unwrap();
    let replies = replies(output);
    assert_eq!(
        replies[2].filename.as_deref(),
        Some("[ExampleNet] - 08-21-2024 - Second Title - Jane Doe.mp4")
    );
}

#[test]
fn oversized_reply_fails_without_ending_session() {
    let coordinator = DownloadCoordinator::new(
        CurlDownloadHost::new(tempdir().unwrap().path()),
        Arc::new(PendingSlot::new()),
    );
    let mut huge = metadata();
    huge["title"] = json!("x".repeat(MAX_OUTGOING_FRAME + 16));
    let mut input = frames(&[
        json!({"action": "prepareNativeDownload", "data": metadata()}),
        json!({"action": "prepareNativeDownload", "data": huge}),
        json!({"action": "determineFilename", "data": {"id": 7}}),
    ]);
    let mut output = Vec::new();
    let stats = serve(&mut input, &mut output, &coordinator).unwrap();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.failures, 1);

    let replies = replies(output);
    assert_eq!(replies.len(), 3);
    assert!(!replies[1].success);
    assert!(replies[1].error_message().unwrap().contains("message limit"));
    // The rejected name never reached the slot; the acknowledged one is applied.
    assert_eq!(
        replies[2].filename.as_deref(),
        Some("[ExampleNet] - 08-21-2024 - Sample Title - Jane Doe.mp4")
    );
    assert!(coordinator.slot().peek().is_none());
}
