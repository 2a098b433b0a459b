//! HTTP client for the studio backend.
//!
//! - Separate connection settings for ordinary calls, uploads and the
//!   long-lived event stream
//! - Exponential backoff with jitter for idempotent reads
//! - Observability (tracing spans, metrics)

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use studio_models::{
    AdAsset, AdAssetList, Clip, JobId, LibraryFilter, LibraryResponse, Narration,
    NarrationRequest, PipelineStartRequest, PublishedSnapshot, RenderJob, RenderJobId,
    RenderRequest, RenderSubmitted, SaveClipsRequest, SaveClipsResponse, UploadResponse,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::api::{StudioApi, UploadProgress};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::events::{pump_events, EventSubscription};
use crate::metrics::record_request;
use crate::retry::with_retry;

/// Studio backend client.
#[derive(Clone)]
pub struct StudioClient {
    http: Client,
    /// No overall timeout: the event stream stays open for a whole run
    stream_http: Client,
    config: ClientConfig,
}

impl StudioClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("studio-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        let stream_http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("studio-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            stream_http,
            config,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// GET a JSON body, retrying transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ClientResult<T> {
        let url = self.url(path);
        let url = url.as_str();

        with_retry(&self.config.retry, operation, move || {
            self.execute_request(operation, path, async move {
                let response = self.http.get(url).query(query).send().await?;
                Self::read_json(url, response).await
            })
        })
        .await
    }

    /// POST a JSON body once.
    async fn post_json<B, T>(&self, operation: &'static str, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        self.execute_request(operation, path, async {
            let response = self.http.post(&url).json(body).send().await?;
            Self::read_json(&url, response).await
        })
        .await
    }

    async fn delete(&self, operation: &'static str, path: &str) -> ClientResult<()> {
        let url = self.url(path);
        self.execute_request(operation, path, async {
            let response = self.http.delete(&url).send().await?;
            Self::expect_success(&url, response).await
        })
        .await
    }

    /// Wrap a request in a span and record its outcome.
    async fn execute_request<T, F>(&self, operation: &str, path: &str, fut: F) -> ClientResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        let span = info_span!(
            "studio_request",
            operation = %operation,
            path = %path,
            request_id = %Uuid::new_v4()
        );

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);

        if let Err(e) = &result {
            debug!(operation = %operation, path = %path, error = %e, "Request failed");
        }
        result
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, url, response).await);
        }
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::invalid_response(format!("{url}: {e}")))
    }

    async fn expect_success(url: &str, response: reqwest::Response) -> ClientResult<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, url, response).await);
        }
        Ok(())
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> ClientError {
        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        ClientError::from_http_status(status.as_u16(), format!("{url}: {detail}"))
    }
}

/// Pull the message out of a `{"detail": ...}` error body.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn file_name(path: &Path) -> ClientResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ClientError::request_failed(format!("not a file: {}", path.display())))
}

fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl StudioApi for StudioClient {
    async fn upload_video(
        &self,
        path: &Path,
        progress: UploadProgress,
    ) -> ClientResult<UploadResponse> {
        let filename = file_name(path)?;
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let mut sent = 0u64;
        let stream = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                sent += bytes.len() as u64;
                progress(sent, total);
            }
        });
        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(filename.clone());
        let form = Form::new().part("file", part);

        let url = self.url("/api/upload");
        let response: UploadResponse = self
            .execute_request("upload_video", "/api/upload", async {
                let response = self
                    .http
                    .post(&url)
                    .timeout(self.config.upload_timeout)
                    .multipart(form)
                    .send()
                    .await?;
                Self::read_json(&url, response).await
            })
            .await?;

        info!(job_id = %response.job_id, filename = %filename, bytes = total, "Uploaded source video");
        Ok(response)
    }

    async fn subscribe_events(&self, job_id: &JobId) -> ClientResult<EventSubscription> {
        let url = self.url("/api/events");
        let response = self
            .execute_request("subscribe_events", "/api/events", async {
                let response = self
                    .stream_http
                    .get(&url)
                    .header(ACCEPT, "text/event-stream")
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Self::handle_error_response(status, &url, response).await);
                }
                Ok(response)
            })
            .await?;

        let (sender, subscription) = EventSubscription::channel(job_id.clone());
        tokio::spawn(
            pump_events(response.bytes_stream(), sender)
                .instrument(info_span!("event_stream", job_id = %job_id)),
        );

        info!(job_id = %job_id, "Subscribed to pipeline events");
        Ok(subscription)
    }

    async fn start_pipeline(&self, request: &PipelineStartRequest) -> ClientResult<()> {
        let path = "/api/pipeline/start";
        let url = self.url(path);
        self.execute_request("start_pipeline", path, async {
            let response = self.http.post(&url).json(request).send().await?;
            Self::expect_success(&url, response).await
        })
        .await?;
        info!(job_id = %request.job_id, count = request.count, "Pipeline started");
        Ok(())
    }

    async fn fetch_job_library(&self, job_id: &JobId) -> ClientResult<Vec<Clip>> {
        let path = format!("/api/library/{}", urlencoding::encode(job_id.as_str()));
        let library: LibraryResponse = self.get_json("fetch_job_library", &path, &[]).await?;
        Ok(library.clips)
    }

    async fn fetch_library(&self, filter: &LibraryFilter) -> ClientResult<Vec<Clip>> {
        self.get_json("fetch_library", "/api/clips", &filter.query_pairs())
            .await
    }

    async fn save_clips(
        &self,
        job_id: &JobId,
        request: &SaveClipsRequest,
    ) -> ClientResult<SaveClipsResponse> {
        let path = format!("/api/library/{}/save", urlencoding::encode(job_id.as_str()));
        self.post_json("save_clips", &path, request).await
    }

    async fn generate_narration(&self, request: &NarrationRequest) -> ClientResult<Narration> {
        self.post_json("generate_narration", "/api/tts", request)
            .await
    }

    async fn submit_render(&self, request: &RenderRequest) -> ClientResult<RenderSubmitted> {
        let submitted: RenderSubmitted = self.post_json("submit_render", "/api/render", request).await?;
        info!(
            render_job_id = %submitted.id,
            output_name = %request.output_name,
            "Render submitted"
        );
        Ok(submitted)
    }

    async fn fetch_queue(&self) -> ClientResult<Vec<RenderJob>> {
        self.get_json("fetch_queue", "/api/queue", &[]).await
    }

    async fn delete_render_job(&self, id: &RenderJobId) -> ClientResult<()> {
        let path = format!("/api/queue/{}", urlencoding::encode(id.as_str()));
        self.delete("delete_render_job", &path).await
    }

    async fn fetch_published(&self) -> ClientResult<PublishedSnapshot> {
        self.get_json("fetch_published", "/api/published", &[])
            .await
    }

    async fn delete_published(&self, path: &str) -> ClientResult<()> {
        let path = format!("/api/published/{}", encode_path(path));
        self.delete("delete_published", &path).await
    }

    async fn list_ad_assets(&self) -> ClientResult<Vec<AdAsset>> {
        let list: AdAssetList = self.get_json("list_ad_assets", "/api/ads", &[]).await?;
        Ok(list.ads)
    }

    async fn upload_ad_asset(&self, path: &Path) -> ClientResult<AdAsset> {
        let filename = file_name(path)?;
        let bytes = tokio::fs::read(path).await?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.clone()));

        let url = self.url("/api/ads/upload");
        self.execute_request("upload_ad_asset", "/api/ads/upload", async {
            let response = self
                .http
                .post(&url)
                .timeout(self.config.upload_timeout)
                .multipart(form)
                .send()
                .await?;
            Self::expect_success(&url, response).await
        })
        .await?;

        info!(filename = %filename, "Uploaded ad asset");
        Ok(AdAsset { filename })
    }
}
