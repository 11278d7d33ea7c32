use std::{future::Future, path::PathBuf, pin::Pin};

use reqwest::{
    multipart::{Form, Part},
    Url,
};
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::{
    error::UploadError,
    model::{truthy_text, ResultMetadata, SelectedFile},
};

pub const ANNOTATE_PATH: &str = "/api/annotate";
pub const SCORE_FIELD: &str = "score";
/// File name the server suggests for the annotated score
pub const ARTIFACT_FILE_NAME: &str = "partitura_com_cifras.pdf";
pub const MSG_SERVER_FALLBACK: &str = "Processing failed. Check server logs.";
const MSG_TASK_LOST: &str = "Upload task ended without a result.";

/// Result of one submission attempt, as handed back to the widget
pub type Outcome = Result<ResultMetadata, UploadError>;

/// Body of the multipart request
#[derive(Debug, Clone)]
pub struct ScoreUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Status and raw body of the server's answer
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: Vec<u8>,
}

pub type TransportFuture = Pin<Box<dyn Future<Output = Result<RawReply, UploadError>> + Send>>;

/// Sends a score to the annotation endpoint.
pub trait AnnotateTransport: Send + Sync {
    fn post_score(&self, upload: ScoreUpload) -> TransportFuture;
}

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    /// Configured server base; relative download URLs resolve against it
    server: Url,
    endpoint: Url,
}

impl ReqwestTransport {
    pub fn new(server: &Url) -> Result<Self, UploadError> {
        Self::with_client(server, reqwest::Client::new())
    }

    pub fn with_client(server: &Url, client: reqwest::Client) -> Result<Self, UploadError> {
        let endpoint = server
            .join(ANNOTATE_PATH)
            .map_err(|e| UploadError::Transport(format!("Invalid server URL {}: {}", server, e)))?;
        Ok(Self {
            client,
            server: server.clone(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Absolute URL for a `downloadUrl` returned by the server.
    pub fn resolve(&self, download_url: &str) -> String {
        resolve_download_url(&self.server, download_url)
    }

    /// Fetches the annotated score and writes it to `dest`.
    pub async fn save_artifact(&self, url: String, dest: PathBuf) -> Result<PathBuf, UploadError> {
        info!(%url, dest = %dest.display(), "saving artifact");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(&dest, &bytes).await?;
        Ok(dest)
    }
}

impl AnnotateTransport for ReqwestTransport {
    fn post_score(&self, upload: ScoreUpload) -> TransportFuture {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str("application/pdf")?;
            let form = Form::new().part(SCORE_FIELD, part);

            debug!(%endpoint, "posting score");
            let response = client.post(endpoint).multipart(form).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?.to_vec();
            debug!(status, len = body.len(), "reply received");
            Ok(RawReply { status, body })
        })
    }
}

/// Uploads one file and turns the reply into an outcome.
pub async fn annotate(transport: &dyn AnnotateTransport, file: SelectedFile) -> Outcome {
    let bytes = file.content.load().await?;
    let reply = transport
        .post_score(ScoreUpload {
            file_name: file.name,
            bytes,
        })
        .await?;
    interpret_reply(reply.status, &reply.body)
}

/// Reads the reply body leniently: anything that is not JSON counts as `{}`.
pub fn interpret_reply(status: u16, body: &[u8]) -> Outcome {
    let payload: Value = serde_json::from_slice(body).unwrap_or_else(|err| {
        debug!(%err, "reply body is not JSON");
        Value::Object(Map::new())
    });

    if !(200..300).contains(&status) {
        let message = payload
            .get("error")
            .and_then(truthy_text)
            .unwrap_or_else(|| MSG_SERVER_FALLBACK.to_string());
        return Err(UploadError::Server(message));
    }

    serde_json::from_value(payload).map_err(|err| {
        warn!(%err, "success reply without a usable downloadUrl");
        UploadError::Server(MSG_SERVER_FALLBACK.to_string())
    })
}

pub fn resolve_download_url(base: &Url, download_url: &str) -> String {
    base.join(download_url)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| download_url.to_string())
}

/// Reports the outcome of a background submission exactly once. Dropped
/// without [`SettleGuard::finish`] (the task panicked or was torn down), it
/// reports a transport error so the widget never stays in `Submitting`.
pub struct SettleGuard {
    tx: Option<UnboundedSender<Outcome>>,
}

impl SettleGuard {
    pub fn new(tx: UnboundedSender<Outcome>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn finish(mut self, outcome: Outcome) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!("submission task dropped before settling");
            let _ = tx.send(Err(UploadError::Transport(MSG_TASK_LOST.to_string())));
        }
    }
}
