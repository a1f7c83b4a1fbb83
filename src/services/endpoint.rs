//! Endpoint remoto di conversione

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::config::Config;
use crate::error::{AppError, Result, GENERIC_CONVERSION_FAILED};
use crate::models::{ErrorResponse, KindDescriptor, SourceFile};

/// Servizio che converte un file e restituisce l'artefatto binario
#[async_trait]
pub trait ConversionEndpoint: Send + Sync {
    /// Una sola richiesta per chiamata: nessun retry, nessun chunking.
    ///
    /// Errori: `RemoteConversion` per risposte non 2xx, `Transport` se la
    /// richiesta non si completa.
    async fn convert(&self, descriptor: &KindDescriptor, file: &SourceFile) -> Result<Bytes>;
}

pub struct HttpEndpoint {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEndpoint {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Errore creazione client HTTP: {}", e)))?;

        Ok(Self {
            base_url: config.api_url.trim().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, descriptor: &KindDescriptor) -> String {
        format!("{}{}", self.base_url, descriptor.endpoint_path)
    }
}

#[async_trait]
impl ConversionEndpoint for HttpEndpoint {
    async fn convert(&self, descriptor: &KindDescriptor, file: &SourceFile) -> Result<Bytes> {
        let data = file
            .read()
            .await
            .map_err(|e| AppError::Transport(e.status_text()))?;

        let part = Part::bytes(data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| AppError::Transport(e.to_string()))?;
        let form = Form::new().part(descriptor.field_name, part);

        let url = self.url_for(descriptor);
        tracing::debug!("POST {} ({} byte, campo {})", url, file.size_bytes, descriptor.field_name);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = response.status();
        if let Some(disposition) = response.headers().get(reqwest::header::CONTENT_DISPOSITION) {
            tracing::debug!("Content-Disposition ignorato: {:?}", disposition);
        }

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| AppError::Transport(e.to_string()))?;
            tracing::info!("{} ha risposto {} ({} byte)", url, status, body.len());
            return Ok(body);
        }

        let reason = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|error| !error.is_empty())
            .unwrap_or_else(|| GENERIC_CONVERSION_FAILED.to_string());

        tracing::warn!("{} ha risposto {}: {}", url, status, reason);
        Err(AppError::RemoteConversion {
            status: status.as_u16(),
            message: reason,
        })
    }
}
