use thiserror::Error;

/// Messaggio mostrato quando l'endpoint fallisce senza un motivo leggibile
pub const GENERIC_CONVERSION_FAILED: &str = "Conversion failed";

/// Messaggio mostrato quando il trasporto fallisce senza descrizione
pub const GENERIC_TRANSPORT_FAILED: &str = "Failed to convert file";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File non valido: {0}")]
    Validation(String),

    #[error("Precondizione non soddisfatta: {0}")]
    Precondition(String),

    #[error("Errore di conversione (HTTP {status}): {message}")]
    RemoteConversion { status: u16, message: String },

    #[error("Errore di trasporto: {0}")]
    Transport(String),

    #[error("Errore di download: {0}")]
    Download(String),

    #[error("Errore di I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Controller terminato")]
    ControllerClosed,

    #[error("Configurazione non valida: {0}")]
    Config(String),
}

impl AppError {
    /// Testo destinato all'utente, senza prefissi diagnostici.
    ///
    /// Il motivo restituito dall'endpoint viene riportato testualmente.
    pub fn status_text(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Precondition(msg) => msg.clone(),
            AppError::RemoteConversion { message, .. } => {
                non_empty_or(message, GENERIC_CONVERSION_FAILED)
            }
            AppError::Transport(msg) => non_empty_or(msg, GENERIC_TRANSPORT_FAILED),
            AppError::Download(msg) => non_empty_or(msg, GENERIC_TRANSPORT_FAILED),
            AppError::IoError(e) => e.to_string(),
            AppError::ControllerClosed | AppError::Config(_) => self.to_string(),
        }
    }
}

fn non_empty_or(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
