//! Consegna dell'artefatto convertito all'utente

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::utils::sanitize_filename;

#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Salva `data` con il nome `filename` e restituisce il percorso finale
    async fn deliver(&self, filename: &str, data: Bytes) -> Result<PathBuf>;
}

/// Scrive i download in una directory locale.
///
/// Il contenuto viene prima messo in un file temporaneo nella stessa
/// directory e poi rinominato; in caso di errore il temporaneo viene rimosso.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, filename: &str, data: Bytes) -> Result<PathBuf> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| AppError::Download(format!("Nome file non valido: {}", filename)))?;
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || write_staged(&dir, &name, &data))
            .await
            .map_err(|e| AppError::Download(e.to_string()))?
    }
}

fn write_staged(dir: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::Download(e.to_string()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".converty-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| AppError::Download(e.to_string()))?;
    staged
        .write_all(data)
        .and_then(|_| staged.flush())
        .map_err(|e| AppError::Download(e.to_string()))?;

    let target = dir.join(name);
    staged
        .persist(&target)
        .map_err(|e| AppError::Download(e.error.to_string()))?;

    tracing::info!("Download salvato: {} ({} byte)", target.display(), data.len());
    Ok(target)
}
