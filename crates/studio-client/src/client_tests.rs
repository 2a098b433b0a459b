//! Tests for the HTTP client against a mock backend.

use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::json;
use studio_models::{
    ClipId, EventStatus, JobId, LibraryFilter, NarrationRequest, PipelineEvent, PipelineStage,
    RenderJobId, RenderRequest, RenderStatus, SaveClipsRequest, VoiceProvider,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::StudioApi;
use crate::client::StudioClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::RetryConfig;

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> StudioClient {
    let mut config = ClientConfig::with_base_url(server.uri()).unwrap();
    config.retry = RetryConfig {
        max_retries: 2,
        base_delay_ms: 1,
        max_delay_ms: 5,
    };
    StudioClient::new(config).unwrap()
}

fn clip_json(id: &str, score: f64) -> serde_json::Value {
    json!({
        "clip_id": id,
        "meme_caption": format!("caption {id}"),
        "what_happens_visually": "someone laughs",
        "timestamp": "12:04",
        "duration_seconds": 9.5,
        "meme_score": score,
        "audience": "founders",
        "rendered": true
    })
}

fn sse_body(events: &[PipelineEvent]) -> String {
    events
        .iter()
        .map(|e| format!("data: {}\n\n", e.to_json()))
        .collect()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_fetch_library_sends_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clips"))
        .and(query_param("min_score", "7"))
        .and(query_param("source", "the-office"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([clip_json("office_62", 8.5)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let filter = LibraryFilter::new(7, Some("the-office".into()));
    let clips = client.fetch_library(&filter).await.unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].id, ClipId::from("office_62"));
    assert_eq!(clips[0].timestamp_in_source, "12:04");
}

#[tokio::test]
async fn test_fetch_job_library() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clips": [
                {"filename": "c1.mp4", "caption": "one", "type": "reaction", "score": 7.0},
                {"filename": "c2.mp4", "caption": "two", "type": "quote", "score": 6.0}
            ]
        })))
        .mount(&server)
        .await;

    let clips = client_for(&server)
        .fetch_job_library(&JobId::from("j1"))
        .await
        .unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[1].clip_type.as_deref(), Some("quote"));
}

#[tokio::test]
async fn test_fetch_queue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "r2", "output_name": "b", "status": "failed", "created_at": "2026-10-19T10:00:00", "error": "disk full"},
            {"id": "r1", "output_name": "a", "status": "done", "created_at": "2026-10-19T09:00:00"}
        ])))
        .mount(&server)
        .await;

    let jobs = client_for(&server).fetch_queue().await.unwrap();
    assert_eq!(jobs[0].status, RenderStatus::Failed);
    assert_eq!(jobs[0].failure(), Some("disk full"));
    assert_eq!(jobs[1].id, RenderJobId::from("r1"));
}

#[tokio::test]
async fn test_fetch_published_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/published"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/published"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [{"filename": "a.mp4", "size_mb": 3.1, "url": "/api/published/a.mp4"}],
            "today_count": 1,
            "daily_target": 2
        })))
        .with_priority(2)
        .mount(&server)
        .await;

    let snapshot = client_for(&server).fetch_published().await.unwrap();
    assert_eq!(snapshot.videos.len(), 1);
    assert_eq!(snapshot.quota_label(), "1/2 today");
}

#[tokio::test]
async fn test_not_found_maps_to_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/library/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_job_library(&JobId::from("missing"))
        .await
        .unwrap_err();
    match err {
        ClientError::NotFound(msg) => assert!(msg.contains("Job not found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_queue().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_save_clips_sends_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/library/j1/save"))
        .and(body_json(json!({"clips": ["a.mp4", "c.mp4"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "saved": 2, "dest": "published/2026-10-19"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = SaveClipsRequest {
        clips: vec![ClipId::from("a.mp4"), ClipId::from("c.mp4")],
    };
    let response = client_for(&server)
        .save_clips(&JobId::from("j1"), &request)
        .await
        .unwrap();
    assert!(response.ok);
    assert_eq!(response.saved, 2);
}

#[tokio::test]
async fn test_submit_render_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/render"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let request = RenderRequest {
        hook_clip_id: ClipId::from("office_62"),
        hook_caption: "LOL".into(),
        body_script: "script".into(),
        body_audio_file: None,
        cta_tagline: "Understand your audience.".into(),
        output_name: "lol".into(),
    };
    let err = client_for(&server).submit_render(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::ServerError(500, _)));
}

#[tokio::test]
async fn test_submit_render_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/render"))
        .and(body_json(json!({
            "hook_clip_id": "office_62",
            "hook_caption": "LOL",
            "body_script": "script",
            "body_audio_file": null,
            "cta_tagline": "Understand your audience.",
            "output_name": "lol"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "r1", "output_name": "lol", "status": "queued", "created_at": "2026-10-19T09:00:00"
        })))
        .mount(&server)
        .await;

    let request = RenderRequest {
        hook_clip_id: ClipId::from("office_62"),
        hook_caption: "LOL".into(),
        body_script: "script".into(),
        body_audio_file: None,
        cta_tagline: "Understand your audience.".into(),
        output_name: "lol".into(),
    };
    let submitted = client_for(&server).submit_render(&request).await.unwrap();
    assert_eq!(submitted.id, RenderJobId::from("r1"));
}

#[tokio::test]
async fn test_generate_narration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tts"))
        .and(body_json(json!({"script": "hello", "voice": "Adam", "provider": "elevenlabs"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audio_url": "/api/audio/tts_1.mp3", "duration": 2.4, "audio_file": "tts_1.mp3"
        })))
        .mount(&server)
        .await;

    let narration = client_for(&server)
        .generate_narration(&NarrationRequest {
            script: "hello".into(),
            voice: "Adam".into(),
            provider: VoiceProvider::ElevenLabs,
        })
        .await
        .unwrap();
    assert_eq!(narration.audio_file, "tts_1.mp3");
}

#[tokio::test]
async fn test_delete_published_encodes_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/published/2026-10-19/my%20clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_published("2026-10-19/my clip.mp4")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_render_job_missing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/queue/r9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .delete_render_job(&RenderJobId::from("r9"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_video_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
    file.write_all(&vec![7u8; 200_000]).unwrap();
    file.flush().unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress = Arc::new(move |loaded: u64, total: u64| {
        sink.lock().unwrap().push((loaded, total));
    });

    let response = client_for(&server)
        .upload_video(file.path(), progress)
        .await
        .unwrap();
    assert_eq!(response.job_id, JobId::from("j1"));

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert_eq!(seen.last().copied(), Some((200_000, 200_000)));
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
}

#[tokio::test]
async fn test_upload_video_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"video").unwrap();

    let err = client_for(&server)
        .upload_video(file.path(), Arc::new(|_: u64, _: u64| {}))
        .await
        .unwrap_err();
    match err {
        ClientError::RequestFailed(msg) => assert!(msg.contains("413")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_upload_ad_asset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ads/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let asset = dir.path().join("promo.png");
    std::fs::write(&asset, b"png").unwrap();

    let uploaded = client_for(&server).upload_ad_asset(&asset).await.unwrap();
    assert_eq!(uploaded.filename, "promo.png");
}

// =============================================================================
// Event stream
// =============================================================================

#[tokio::test]
async fn test_subscribe_events_follows_one_job() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        PipelineEvent::stage("old", PipelineStage::Render, EventStatus::Running, 90, "old job"),
        PipelineEvent::stage("j1", PipelineStage::Audio, EventStatus::Running, 10, "Extracting"),
        PipelineEvent::stage("j1", PipelineStage::Audio, EventStatus::Done, 25, "Audio ready"),
        PipelineEvent::stage("j1", PipelineStage::Render, EventStatus::Done, 100, "Done"),
        PipelineEvent::stage("j1", PipelineStage::Detect, EventStatus::Running, 0, "after"),
    ]);
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(format!(": connected\n\ndata: garbage\n\n{body}")),
        )
        .mount(&server)
        .await;

    let mut subscription = client_for(&server)
        .subscribe_events(&JobId::from("j1"))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = subscription.next().await {
        events.push(event);
    }
    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["Extracting", "Audio ready", "Done"]);
    assert!(subscription.is_closed());

    subscription.close();
    subscription.close();
}

#[tokio::test]
async fn test_subscribe_events_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .subscribe_events(&JobId::from("j1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ServerError(502, _)));
}
