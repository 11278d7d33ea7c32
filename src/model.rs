use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;
use serde_json::Value;

use crate::error::UploadError;

/// Where the bytes of a selected file live until the upload reads them
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Bytes handed over directly (e.g. a drop that carried its payload)
    InMemory(Arc<[u8]>),
    /// A file on disk, read when the submission starts
    OnDisk(PathBuf),
}

impl FileContent {
    /// Reads the content into an owned buffer for the multipart body.
    pub async fn load(&self) -> Result<Vec<u8>, UploadError> {
        match self {
            FileContent::InMemory(bytes) => Ok(bytes.to_vec()),
            FileContent::OnDisk(path) => tokio::fs::read(path).await.map_err(|e| {
                UploadError::Transport(format!("Could not read {}: {}", path.display(), e))
            }),
        }
    }
}

/// The file the user picked or dropped
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Display name, also sent as the multipart file name
    pub name: String,
    pub content: FileContent,
}

impl SelectedFile {
    pub fn in_memory(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::InMemory(bytes.into()),
        }
    }

    /// Builds a selection from a path, naming it after the last path component.
    pub fn on_disk(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            content: FileContent::OnDisk(path),
        }
    }

    /// Extension check only; the content is never sniffed.
    pub fn has_pdf_name(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// What the server reports after a successful annotation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultMetadata {
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub measures: Option<Value>,
    #[serde(default)]
    pub uncertain_measures: Option<Value>,
}

impl ResultMetadata {
    /// Caption under the download link. Fields that are missing or falsy are left out.
    pub fn caption(&self) -> String {
        [
            ("Key", &self.key),
            ("Measures", &self.measures),
            ("Uncertain", &self.uncertain_measures),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_ref()
                .and_then(truthy_text)
                .map(|text| format!("{}: {}", label, text))
        })
        .collect::<Vec<_>>()
        .join(" | ")
    }
}

/// Text for a JSON value the way a script would print it, or `None` when the
/// value is falsy.
pub(crate) fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        // f64 Display drops a zero fraction: 10.0 prints as 10
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Visible state of the upload widget
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UiState {
    #[default]
    Idle,
    /// Files hover the drop zone; holds the state to return to when they leave
    DraggingOver(Box<UiState>),
    /// A file is selected and waiting for submission
    Ready(String),
    Submitting,
    Success(ResultMetadata),
    Error(String),
}

impl UiState {
    /// The state underneath any drag marker.
    pub fn settled(&self) -> &UiState {
        match self {
            UiState::DraggingOver(previous) => previous.settled(),
            other => other,
        }
    }

    pub fn settled_mut(&mut self) -> &mut UiState {
        match self {
            UiState::DraggingOver(previous) => previous.settled_mut(),
            other => other,
        }
    }
}
