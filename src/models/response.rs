use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{ConversionKind, JobStatus, StatusMessage};

/// Corpo JSON restituito dall'endpoint in caso di errore
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Sorgente da cui il livello di presentazione può mostrare l'anteprima dell'immagine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum FilePreview {
    Path { path: PathBuf },
    /// Byte già in memoria (drag & drop)
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// Dimensione in KB con un decimale
    pub size_kb: String,
    pub mime_type: String,
    /// Presente solo per le immagini
    pub preview: Option<FilePreview>,
}

/// Snapshot dello stato del controller per il livello di presentazione
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub kind: ConversionKind,
    /// Filtro per il controllo di selezione file (es. "image/*")
    pub accept: String,
    pub status: JobStatus,
    pub file: Option<FileSummary>,
    pub dragging: bool,
    pub submitting: bool,
    pub submit_enabled: bool,
    pub message: Option<StatusMessage>,
    pub result_filename: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_parsing() {
        let body: ErrorResponse = serde_json::from_str(r#"{"error":"corrupt file"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("corrupt file"));

        let body: ErrorResponse = serde_json::from_str(r#"{"status":500}"#).unwrap();
        assert!(body.error.is_none());
    }

    #[test]
    fn test_preview_serialization() {
        let preview = FilePreview::Path {
            path: PathBuf::from("/tmp/me.png"),
        };
        assert_eq!(
            serde_json::to_value(&preview).unwrap(),
            serde_json::json!({ "source": "path", "path": "/tmp/me.png" })
        );
        assert_eq!(
            serde_json::to_value(FilePreview::Memory).unwrap(),
            serde_json::json!({ "source": "memory" })
        );
    }
}
