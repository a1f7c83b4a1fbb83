use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{ConversionKind, FilePreview};
use crate::config::formats;
use crate::error::{AppError, Result};
use crate::utils::{display_name, format_size_kb, get_mime_type};

/// Identità di un job, usata per etichettare le richieste in volo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FileContent {
    Path(PathBuf),
    Memory(Bytes),
}

/// File scelto dall'utente (selettore o drag & drop)
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    content: FileContent,
}

impl SourceFile {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            content: FileContent::Memory(data),
        }
    }

    /// Crea un handle da un file su disco; il contenuto viene letto solo all'upload
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(AppError::Validation(format!(
                "{} non è un file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime_type = get_mime_type(&name);

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type,
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    pub async fn read(&self) -> Result<Bytes> {
        match &self.content {
            FileContent::Memory(data) => Ok(data.clone()),
            FileContent::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }

    pub fn size_kb(&self) -> String {
        format_size_kb(self.size_bytes)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name)
    }

    /// Anteprima disponibile solo per i file immagine
    pub fn preview(&self) -> Option<FilePreview> {
        if !self.mime_type.starts_with(formats::IMAGE_MIME_PREFIX) {
            return None;
        }
        Some(match &self.content {
            FileContent::Path(path) => FilePreview::Path { path: path.clone() },
            FileContent::Memory(_) => FilePreview::Memory,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Empty,
    Selected,
    Submitting,
    Success,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Empty => write!(f, "empty"),
            JobStatus::Selected => write!(f, "selected"),
            JobStatus::Submitting => write!(f, "submitting"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

/// Un tentativo di conversione avviato dall'utente.
///
/// I campi sono privati: solo il workflow li modifica, attraverso le
/// transizioni della macchina a stati.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    id: JobId,
    kind: ConversionKind,
    source: Option<SourceFile>,
    status: JobStatus,
    error_message: Option<String>,
    result_filename: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ConversionJob {
    pub(crate) fn empty(kind: ConversionKind) -> Self {
        Self {
            id: JobId::new(),
            kind,
            source: None,
            status: JobStatus::Empty,
            error_message: None,
            result_filename: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub(crate) fn with_source(kind: ConversionKind, source: SourceFile) -> Self {
        Self {
            source: Some(source),
            status: JobStatus::Selected,
            ..Self::empty(kind)
        }
    }

    pub(crate) fn mark_submitting(&mut self) {
        self.status = JobStatus::Submitting;
        self.error_message = None;
        self.result_filename = None;
    }

    pub(crate) fn mark_succeeded(&mut self, result_filename: String) {
        self.status = JobStatus::Success;
        self.completed_at = Some(Utc::now());
        self.result_filename = Some(result_filename);
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(error);
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> ConversionKind {
        self.kind
    }

    pub fn source(&self) -> Option<&SourceFile> {
        self.source.as_ref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result_filename(&self) -> Option<&str> {
        self.result_filename.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Durata dal momento della selezione all'esito, se concluso
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_milliseconds())
    }
}
