use serde::{Deserialize, Serialize};

use crate::config::formats;
use crate::error::AppError;

/// Tipo di conversione offerto dal front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    PdfToPng,
    ImageToWebp,
    RemoveBackground,
}

impl ConversionKind {
    pub const ALL: [ConversionKind; 3] = [
        ConversionKind::PdfToPng,
        ConversionKind::ImageToWebp,
        ConversionKind::RemoveBackground,
    ];

    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            ConversionKind::PdfToPng => &PDF_TO_PNG,
            ConversionKind::ImageToWebp => &IMAGE_TO_WEBP,
            ConversionKind::RemoveBackground => &REMOVE_BACKGROUND,
        }
    }
}

impl std::fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionKind::PdfToPng => write!(f, "pdf-to-png"),
            ConversionKind::ImageToWebp => write!(f, "image-to-webp"),
            ConversionKind::RemoveBackground => write!(f, "remove-background"),
        }
    }
}

impl std::str::FromStr for ConversionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf-to-png" | "pdf" => Ok(ConversionKind::PdfToPng),
            "image-to-webp" | "webp" => Ok(ConversionKind::ImageToWebp),
            "remove-background" | "remove-bg" => Ok(ConversionKind::RemoveBackground),
            other => Err(AppError::Config(format!(
                "Tipo di conversione sconosciuto: {} (validi: pdf-to-png, image-to-webp, remove-background)",
                other
            ))),
        }
    }
}

/// Filtro sui MIME type accettati dal selettore file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptFilter {
    /// Solo questo MIME type esatto
    Exact(&'static str),
    /// Qualsiasi MIME type con questo prefisso (es. "image/")
    Prefix(&'static str),
}

impl AcceptFilter {
    pub fn matches(&self, mime: &str) -> bool {
        match self {
            AcceptFilter::Exact(expected) => mime == *expected,
            AcceptFilter::Prefix(prefix) => mime.starts_with(prefix),
        }
    }

    /// Valore per l'attributo `accept` del controllo file
    pub fn as_accept_attr(&self) -> String {
        match self {
            AcceptFilter::Exact(expected) => expected.to_string(),
            AcceptFilter::Prefix(prefix) => format!("{}*", prefix),
        }
    }
}

/// Regola per derivare il nome del file scaricato dal nome sorgente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameRule {
    /// Rimuove ".pdf" finale (case-insensitive) e aggiunge ".png"
    PdfToPng,
    /// Sostituisce un'estensione immagine nota con ".webp", altrimenti lascia il nome invariato
    ImageToWebp,
    /// Tiene la parte prima del primo "." e aggiunge "_no_bg.png"
    NoBackground,
}

impl FilenameRule {
    pub fn apply(&self, source_name: &str) -> String {
        match self {
            FilenameRule::PdfToPng => {
                let stem = strip_suffix_ignore_case(source_name, ".pdf").unwrap_or(source_name);
                format!("{}.png", stem)
            }
            FilenameRule::ImageToWebp => match source_name.rsplit_once('.') {
                Some((stem, ext)) if formats::is_webp_source_extension(ext) => {
                    format!("{}.webp", stem)
                }
                _ => source_name.to_string(),
            },
            FilenameRule::NoBackground => {
                let stem = source_name.split('.').next().unwrap_or(source_name);
                format!("{}_no_bg.png", stem)
            }
        }
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Descrittore che parametrizza il workflow per un tipo di conversione
#[derive(Debug)]
pub struct KindDescriptor {
    pub kind: ConversionKind,
    pub accept: AcceptFilter,
    pub endpoint_path: &'static str,
    pub field_name: &'static str,
    pub filename_rule: FilenameRule,
    pub invalid_file_message: &'static str,
    pub success_message: &'static str,
    /// Messaggio mostrato durante l'upload, se previsto
    pub progress_message: Option<&'static str>,
}

impl KindDescriptor {
    pub fn accepts(&self, mime: &str) -> bool {
        self.accept.matches(mime)
    }

    pub fn result_filename(&self, source_name: &str) -> String {
        self.filename_rule.apply(source_name)
    }
}

pub static PDF_TO_PNG: KindDescriptor = KindDescriptor {
    kind: ConversionKind::PdfToPng,
    accept: AcceptFilter::Exact(formats::PDF_MIME),
    endpoint_path: "/convert",
    field_name: "file",
    filename_rule: FilenameRule::PdfToPng,
    invalid_file_message: "Please select a PDF file",
    success_message: "Success! Your PNG file has been downloaded.",
    progress_message: None,
};

pub static IMAGE_TO_WEBP: KindDescriptor = KindDescriptor {
    kind: ConversionKind::ImageToWebp,
    accept: AcceptFilter::Prefix(formats::IMAGE_MIME_PREFIX),
    endpoint_path: "/convertWebP",
    field_name: "image",
    filename_rule: FilenameRule::ImageToWebp,
    invalid_file_message: "Please select an image file (PNG, JPG, JPEG, GIF, BMP, etc.)",
    success_message: "Success! Your WebP file has been downloaded.",
    progress_message: None,
};

pub static REMOVE_BACKGROUND: KindDescriptor = KindDescriptor {
    kind: ConversionKind::RemoveBackground,
    accept: AcceptFilter::Prefix(formats::IMAGE_MIME_PREFIX),
    endpoint_path: "/removeBg",
    field_name: "image",
    filename_rule: FilenameRule::NoBackground,
    invalid_file_message: "Please select an image file (PNG, JPG, JPEG, etc.)",
    success_message: "Background removed successfully!",
    progress_message: Some("Removing background... This may take a moment."),
};
