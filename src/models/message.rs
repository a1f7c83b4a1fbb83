use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Error,
}

/// Messaggio di stato transitorio mostrato all'utente
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub tone: Tone,
    pub text: String,
    /// Dopo quanto tempo il messaggio sparisce da solo (None = resta)
    #[serde(skip)]
    pub ttl: Option<Duration>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
            ttl: None,
        }
    }

    /// Avviso informativo che sparisce da solo
    pub fn advisory(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            tone: Tone::Info,
            text: text.into(),
            ttl: Some(ttl),
        }
    }

    pub fn success(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
            ttl: Some(ttl),
        }
    }

    pub fn error(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            tone: Tone::Error,
            text: text.into(),
            ttl: Some(ttl),
        }
    }

    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }
}

/// Ritardi di auto-cancellazione per classe di messaggio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTimings {
    /// Avvisi e errori di validazione
    pub advisory: Duration,
    /// Esiti della sottomissione
    pub outcome: Duration,
}

impl Default for MessageTimings {
    fn default() -> Self {
        Self {
            advisory: Duration::from_millis(3000),
            outcome: Duration::from_millis(5000),
        }
    }
}

impl From<&crate::config::Config> for MessageTimings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            advisory: config.advisory_ttl(),
            outcome: config.outcome_ttl(),
        }
    }
}
