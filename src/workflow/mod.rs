//! Macchina a stati del workflow di upload/conversione.
//!
//! `Workflow::apply` è una funzione di transizione pura: non esegue I/O e
//! restituisce gli effetti da eseguire come `Command`. Il driver asincrono
//! (`services::controller`) li esegue e reinietta gli esiti come `Event`.

mod drag;
mod status;

pub use drag::{DragSession, DropZone, ElementId};
pub use status::{StatusSlot, TimerChange};

use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{
    ConversionJob, ConversionKind, FileSummary, JobId, JobStatus, KindDescriptor,
    MessageTimings, SourceFile, StatusMessage, ViewState,
};
use crate::utils::validate_candidate;

pub const SELECT_FILE_FIRST: &str = "Please select a file first";
/// Submit dopo un esito con il file ancora mostrato
pub const RETRY_TO_RESUBMIT: &str =
    "This file was already processed. Use Retry to convert it again";

/// Intenzioni dell'utente inoltrate dal livello di presentazione
#[derive(Debug, Clone)]
pub enum Intent {
    /// Esito del selettore file; None se il dialogo è stato annullato
    ChooseFile(Option<SourceFile>),
    DragEnter,
    DragOver,
    DragLeave { related_target: Option<ElementId> },
    Drop(Vec<SourceFile>),
    ZoneClicked { target: ElementId },
    Submit,
    Clear,
    Retry,
}

#[derive(Debug)]
pub enum Event {
    Intent(Intent),
    ResponseReceived { job_id: JobId, outcome: Result<Bytes> },
    DownloadFinished { job_id: JobId, outcome: Result<PathBuf> },
    MessageExpired { token: u64 },
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        Event::Intent(intent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenFilePicker,
    Upload {
        job_id: JobId,
        kind: ConversionKind,
        file: SourceFile,
    },
    Download {
        job_id: JobId,
        filename: String,
        data: Bytes,
    },
    ScheduleClear { token: u64, after: Duration },
    CancelClear,
}

#[derive(Debug)]
pub struct Workflow {
    descriptor: &'static KindDescriptor,
    job: ConversionJob,
    drag: DragSession,
    zone: DropZone,
    status: StatusSlot,
    timings: MessageTimings,
}

impl Workflow {
    pub fn new(kind: ConversionKind, zone: DropZone, timings: MessageTimings) -> Self {
        Self {
            descriptor: kind.descriptor(),
            job: ConversionJob::empty(kind),
            drag: DragSession::default(),
            zone,
            status: StatusSlot::default(),
            timings,
        }
    }

    pub fn kind(&self) -> ConversionKind {
        self.descriptor.kind
    }

    pub fn job(&self) -> &ConversionJob {
        &self.job
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.status.current()
    }

    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        let mut out = Vec::new();
        match event {
            Event::Intent(intent) => self.handle_intent(intent, &mut out),
            Event::ResponseReceived { job_id, outcome } => {
                self.on_response(job_id, outcome, &mut out)
            }
            Event::DownloadFinished { job_id, outcome } => {
                self.on_download(job_id, outcome, &mut out)
            }
            Event::MessageExpired { token } => {
                if self.status.expire(token) {
                    tracing::debug!("Messaggio di stato scaduto (token {})", token);
                }
            }
        }
        out
    }

    fn handle_intent(&mut self, intent: Intent, out: &mut Vec<Command>) {
        match intent {
            Intent::ChooseFile(candidate) => self.acquire(candidate, out),
            Intent::DragEnter | Intent::DragOver => {
                if self.drag.hover() {
                    tracing::trace!("Drag sopra la drop zone");
                }
            }
            Intent::DragLeave { related_target } => {
                self.drag.leave(&self.zone, related_target);
            }
            Intent::Drop(files) => {
                if files.len() > 1 {
                    tracing::debug!("Rilasciati {} file, uso solo il primo", files.len());
                }
                let first = self.drag.drop_items(files);
                self.acquire(first, out);
            }
            Intent::ZoneClicked { target } => {
                if !self.zone.is_label(target) {
                    out.push(Command::OpenFilePicker);
                }
            }
            Intent::Submit => self.submit(out),
            Intent::Clear => self.clear(out),
            Intent::Retry => self.retry(out),
        }
    }

    fn acquire(&mut self, candidate: Option<SourceFile>, out: &mut Vec<Command>) {
        let Some(candidate) = candidate else {
            tracing::debug!("Nessun file scelto");
            return;
        };

        if let Err(e) = validate_candidate(self.descriptor, &candidate) {
            self.show(StatusMessage::error(e.status_text(), self.timings.advisory), out);
            return;
        }

        if self.job.status() == JobStatus::Submitting {
            tracing::warn!(
                "Job {} sostituito durante l'upload, la sua risposta verrà scartata",
                self.job.id()
            );
        }

        let text = format!(
            "File \"{}\" selected ({} KB)",
            candidate.name,
            candidate.size_kb()
        );
        self.job = ConversionJob::with_source(self.descriptor.kind, candidate);
        tracing::info!("Job {} creato: {}", self.job.id(), text);
        self.show(StatusMessage::info(text), out);
    }

    fn submit(&mut self, out: &mut Vec<Command>) {
        match self.job.status() {
            JobStatus::Submitting => {
                tracing::debug!("Upload già in corso per job {}, ignoro", self.job.id());
                return;
            }
            JobStatus::Selected => {}
            _ => {
                self.precondition_failed(out);
                return;
            }
        }

        let Some(file) = self.job.source().cloned() else {
            self.precondition_failed(out);
            return;
        };

        self.job.mark_submitting();
        tracing::info!(
            "Invio job {} ({}) a {}",
            self.job.id(),
            file.name,
            self.descriptor.endpoint_path
        );
        out.push(Command::Upload {
            job_id: self.job.id(),
            kind: self.descriptor.kind,
            file,
        });

        if let Some(progress) = self.descriptor.progress_message {
            self.show(StatusMessage::info(progress), out);
        }
    }

    fn precondition_failed(&mut self, out: &mut Vec<Command>) {
        let text = if self.job.status().is_terminal() && self.job.source().is_some() {
            RETRY_TO_RESUBMIT
        } else {
            SELECT_FILE_FIRST
        };
        let e = AppError::Precondition(text.to_string());
        self.show(StatusMessage::advisory(e.status_text(), self.timings.advisory), out);
    }

    fn on_response(&mut self, job_id: JobId, outcome: Result<Bytes>, out: &mut Vec<Command>) {
        if !self.is_in_flight(job_id) {
            tracing::warn!(
                "Risposta per job {} scartata (job corrente {}, stato {})",
                job_id,
                self.job.id(),
                self.job.status()
            );
            return;
        }

        match outcome {
            Ok(data) => match self.result_filename() {
                Some(filename) => out.push(Command::Download {
                    job_id,
                    filename,
                    data,
                }),
                None => self.fail(AppError::Precondition(SELECT_FILE_FIRST.to_string()), out),
            },
            Err(e) => self.fail(e, out),
        }
    }

    fn on_download(&mut self, job_id: JobId, outcome: Result<PathBuf>, out: &mut Vec<Command>) {
        if !self.is_in_flight(job_id) {
            tracing::warn!("Esito download per job {} scartato", job_id);
            return;
        }

        match (outcome, self.result_filename()) {
            (Ok(path), Some(filename)) => {
                self.job.mark_succeeded(filename);
                tracing::info!(
                    "Job {} completato in {} ms: {}",
                    job_id,
                    self.job.elapsed_ms().unwrap_or_default(),
                    path.display()
                );
                let message =
                    StatusMessage::success(self.descriptor.success_message, self.timings.outcome);
                self.show(message, out);
            }
            (Ok(_), None) => {
                self.fail(AppError::Precondition(SELECT_FILE_FIRST.to_string()), out)
            }
            (Err(e), _) => self.fail(e, out),
        }
    }

    fn fail(&mut self, error: AppError, out: &mut Vec<Command>) {
        let text = error.status_text();
        tracing::error!("Conversione fallita per job {}: {}", self.job.id(), error);
        self.job.mark_failed(text.clone());
        self.show(StatusMessage::error(text, self.timings.outcome), out);
    }

    fn clear(&mut self, out: &mut Vec<Command>) {
        if self.job.status() == JobStatus::Submitting {
            tracing::warn!("Job {} annullato dall'utente durante l'upload", self.job.id());
        }
        self.job = ConversionJob::empty(self.descriptor.kind);
        push_timer(self.status.clear(), out);
    }

    fn retry(&mut self, out: &mut Vec<Command>) {
        if !self.job.status().is_terminal() {
            tracing::debug!("Retry ignorato in stato {}", self.job.status());
            return;
        }
        let Some(source) = self.job.source().cloned() else {
            return;
        };
        self.job = ConversionJob::with_source(self.descriptor.kind, source);
        push_timer(self.status.clear(), out);
    }

    fn is_in_flight(&self, job_id: JobId) -> bool {
        self.job.id() == job_id && self.job.status() == JobStatus::Submitting
    }

    fn result_filename(&self) -> Option<String> {
        self.job
            .source()
            .map(|source| self.descriptor.result_filename(&source.name))
    }

    fn show(&mut self, message: StatusMessage, out: &mut Vec<Command>) {
        push_timer(self.status.show(message), out);
    }

    pub fn view(&self) -> ViewState {
        let status = self.job.status();
        ViewState {
            kind: self.descriptor.kind,
            accept: self.descriptor.accept.as_accept_attr(),
            status,
            file: self.job.source().map(|source| FileSummary {
                name: source.name.clone(),
                display_name: source.display_name(),
                size_bytes: source.size_bytes,
                size_kb: source.size_kb(),
                mime_type: source.mime_type.clone(),
                preview: source.preview(),
            }),
            dragging: self.drag.is_active(),
            submitting: status == JobStatus::Submitting,
            submit_enabled: status == JobStatus::Selected,
            message: self.status.current().cloned(),
            result_filename: self.job.result_filename().map(str::to_string),
            error: self.job.error_message().map(str::to_string),
        }
    }
}

fn push_timer(change: TimerChange, out: &mut Vec<Command>) {
    out.push(match change {
        TimerChange::Schedule { token, after } => Command::ScheduleClear { token, after },
        TimerChange::Cancel => Command::CancelClear,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilePreview, Tone};

    fn workflow(kind: ConversionKind) -> Workflow {
        let zone = DropZone::new(ElementId(1))
            .with_descendant(ElementId(2))
            .with_label(ElementId(3));
        Workflow::new(kind, zone, MessageTimings::default())
    }

    fn file(name: &str, mime: &str, size: usize) -> SourceFile {
        SourceFile::from_bytes(name, mime, Bytes::from(vec![7u8; size]))
    }

    fn choose(wf: &mut Workflow, f: SourceFile) -> Vec<Command> {
        wf.apply(Intent::ChooseFile(Some(f)).into())
    }

    fn upload_job(commands: &[Command]) -> JobId {
        commands
            .iter()
            .find_map(|c| match c {
                Command::Upload { job_id, .. } => Some(*job_id),
                _ => None,
            })
            .expect("no upload command")
    }

    fn schedule_token(commands: &[Command]) -> (u64, Duration) {
        commands
            .iter()
            .find_map(|c| match c {
                Command::ScheduleClear { token, after } => Some((*token, *after)),
                _ => None,
            })
            .expect("no schedule command")
    }

    #[test]
    fn test_invalid_file_leaves_job_untouched() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("a.pdf", "application/pdf", 10));
        let before_id = wf.job().id();

        let commands = choose(&mut wf, file("cat.png", "image/png", 10));

        assert_eq!(wf.job().status(), JobStatus::Selected);
        assert_eq!(wf.job().id(), before_id);
        assert_eq!(wf.job().source().unwrap().name, "a.pdf");
        let message = wf.message().unwrap();
        assert!(message.is_error());
        assert_eq!(message.text, "Please select a PDF file");
        assert_eq!(schedule_token(&commands).1, Duration::from_millis(3000));
    }

    #[test]
    fn test_invalid_file_on_empty_job_stays_empty() {
        let mut wf = workflow(ConversionKind::ImageToWebp);
        choose(&mut wf, file("doc.pdf", "application/pdf", 10));
        assert_eq!(wf.job().status(), JobStatus::Empty);
        assert!(wf.job().source().is_none());
        assert_eq!(wf.message().unwrap().tone, Tone::Error);
    }

    #[test]
    fn test_valid_file_selected_message() {
        let mut wf = workflow(ConversionKind::ImageToWebp);
        let commands = choose(&mut wf, file("photo.jpg", "image/jpeg", 2048));
        assert_eq!(wf.job().status(), JobStatus::Selected);
        assert_eq!(
            wf.message().unwrap().text,
            "File \"photo.jpg\" selected (2.0 KB)"
        );
        assert!(commands.contains(&Command::CancelClear));
        assert!(wf.view().submit_enabled);
    }

    #[test]
    fn test_cancelled_picker_is_noop() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        let commands = wf.apply(Intent::ChooseFile(None).into());
        assert!(commands.is_empty());
        assert_eq!(wf.job().status(), JobStatus::Empty);
        assert!(wf.message().is_none());
    }

    #[test]
    fn test_acquire_is_idempotent() {
        let mut once = workflow(ConversionKind::RemoveBackground);
        let mut twice = workflow(ConversionKind::RemoveBackground);
        let f = file("me.png", "image/png", 512);

        choose(&mut once, f.clone());
        choose(&mut twice, f.clone());
        choose(&mut twice, f);

        let (a, b) = (once.view(), twice.view());
        assert_eq!(a, b);
    }

    #[test]
    fn test_submit_without_selection_is_noop() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        let commands = wf.apply(Intent::Submit.into());
        assert!(!commands.iter().any(|c| matches!(c, Command::Upload { .. })));
        assert_eq!(wf.job().status(), JobStatus::Empty);
        assert_eq!(wf.message().unwrap().text, SELECT_FILE_FIRST);
        assert_eq!(schedule_token(&commands).1, Duration::from_millis(3000));
    }

    #[test]
    fn test_resubmit_while_submitting_issues_nothing() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("x.pdf", "application/pdf", 10));
        let first = wf.apply(Intent::Submit.into());
        assert_eq!(first.len(), 1);
        assert!(wf.view().submitting);
        assert!(!wf.view().submit_enabled);

        let second = wf.apply(Intent::Submit.into());
        assert!(second.is_empty());
        assert_eq!(wf.job().status(), JobStatus::Submitting);
    }

    #[test]
    fn test_success_flow_downloads_once() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("x.pdf", "application/pdf", 10));
        let job_id = upload_job(&wf.apply(Intent::Submit.into()));

        let body = Bytes::from_static(b"\x89PNG");
        let commands = wf.apply(Event::ResponseReceived {
            job_id,
            outcome: Ok(body.clone()),
        });
        let downloads: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                Command::Download { filename, data, .. } => Some((filename.clone(), data.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(downloads, vec![("x.png".to_string(), body)]);
        assert_eq!(wf.job().status(), JobStatus::Submitting);

        let commands = wf.apply(Event::DownloadFinished {
            job_id,
            outcome: Ok(PathBuf::from("x.png")),
        });
        assert_eq!(wf.job().status(), JobStatus::Success);
        assert_eq!(wf.job().result_filename(), Some("x.png"));
        assert!(!wf.view().submitting);
        assert_eq!(wf.message().unwrap().tone, Tone::Success);
        assert_eq!(schedule_token(&commands).1, Duration::from_millis(5000));
    }

    #[test]
    fn test_remote_failure_message_and_expiry() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("x.pdf", "application/pdf", 10));
        let job_id = upload_job(&wf.apply(Intent::Submit.into()));

        let commands = wf.apply(Event::ResponseReceived {
            job_id,
            outcome: Err(AppError::RemoteConversion {
                status: 422,
                message: "corrupt file".to_string(),
            }),
        });
        assert_eq!(wf.job().status(), JobStatus::Failed);
        assert_eq!(wf.message().unwrap().text, "corrupt file");
        assert_eq!(wf.view().error.as_deref(), Some("corrupt file"));

        let (token, after) = schedule_token(&commands);
        assert_eq!(after, Duration::from_millis(5000));
        wf.apply(Event::MessageExpired { token });
        assert!(wf.message().is_none());
    }

    #[test]
    fn test_transport_failure_uses_description() {
        let mut wf = workflow(ConversionKind::ImageToWebp);
        choose(&mut wf, file("a.png", "image/png", 10));
        let job_id = upload_job(&wf.apply(Intent::Submit.into()));
        wf.apply(Event::ResponseReceived {
            job_id,
            outcome: Err(AppError::Transport("connection refused".to_string())),
        });
        assert_eq!(wf.job().status(), JobStatus::Failed);
        assert_eq!(wf.message().unwrap().text, "connection refused");
    }

    #[test]
    fn test_download_failure_fails_job() {
        let mut wf = workflow(ConversionKind::ImageToWebp);
        choose(&mut wf, file("a.png", "image/png", 10));
        let job_id = upload_job(&wf.apply(Intent::Submit.into()));
        wf.apply(Event::ResponseReceived {
            job_id,
            outcome: Ok(Bytes::from_static(b"RIFF")),
        });
        wf.apply(Event::DownloadFinished {
            job_id,
            outcome: Err(AppError::Download("disk full".to_string())),
        });
        assert_eq!(wf.job().status(), JobStatus::Failed);
        assert_eq!(wf.message().unwrap().text, "disk full");
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("old.pdf", "application/pdf", 10));
        let old_job = upload_job(&wf.apply(Intent::Submit.into()));

        choose(&mut wf, file("new.pdf", "application/pdf", 10));
        let commands = wf.apply(Event::ResponseReceived {
            job_id: old_job,
            outcome: Ok(Bytes::from_static(b"png")),
        });

        assert!(commands.is_empty());
        assert_eq!(wf.job().status(), JobStatus::Selected);
        assert_eq!(wf.job().source().unwrap().name, "new.pdf");
    }

    #[test]
    fn test_stale_expiry_does_not_blank_newer_message() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        let commands = choose(&mut wf, file("a.png", "image/png", 10));
        let (old_token, _) = schedule_token(&commands);

        choose(&mut wf, file("a.pdf", "application/pdf", 10));
        wf.apply(Event::MessageExpired { token: old_token });
        assert!(wf.message().is_some());
    }

    #[test]
    fn test_retry_after_failure() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("x.pdf", "application/pdf", 10));
        let job_id = upload_job(&wf.apply(Intent::Submit.into()));
        wf.apply(Event::ResponseReceived {
            job_id,
            outcome: Err(AppError::Transport(String::new())),
        });
        assert_eq!(wf.message().unwrap().text, "Failed to convert file");

        let commands = wf.apply(Intent::Submit.into());
        assert!(!commands.iter().any(|c| matches!(c, Command::Upload { .. })));
        assert_eq!(wf.message().unwrap().text, RETRY_TO_RESUBMIT);
        assert_eq!(schedule_token(&commands).1, Duration::from_millis(3000));

        wf.apply(Intent::Retry.into());
        assert_eq!(wf.job().status(), JobStatus::Selected);
        assert_ne!(wf.job().id(), job_id);
        assert!(wf.message().is_none());
        let again = wf.apply(Intent::Submit.into());
        assert!(again.iter().any(|c| matches!(c, Command::Upload { .. })));
    }

    #[test]
    fn test_clear_resets_job_and_message() {
        let mut wf = workflow(ConversionKind::RemoveBackground);
        choose(&mut wf, file("me.png", "image/png", 10));
        let commands = wf.apply(Intent::Clear.into());
        assert_eq!(commands, vec![Command::CancelClear]);
        assert_eq!(wf.job().status(), JobStatus::Empty);
        assert!(wf.job().source().is_none());
        assert!(wf.message().is_none());
        assert!(wf.view().file.is_none());
    }

    #[test]
    fn test_selected_image_exposes_preview() {
        let mut wf = workflow(ConversionKind::RemoveBackground);
        choose(&mut wf, file("me.png", "image/png", 10));
        let summary = wf.view().file.unwrap();
        assert_eq!(summary.preview, Some(FilePreview::Memory));

        let mut wf = workflow(ConversionKind::PdfToPng);
        choose(&mut wf, file("x.pdf", "application/pdf", 10));
        assert!(wf.view().file.unwrap().preview.is_none());
    }

    #[test]
    fn test_remove_background_shows_progress() {
        let mut wf = workflow(ConversionKind::RemoveBackground);
        choose(&mut wf, file("me.selfie.png", "image/png", 10));
        let commands = wf.apply(Intent::Submit.into());
        assert!(commands.contains(&Command::CancelClear));
        assert_eq!(
            wf.message().unwrap().text,
            "Removing background... This may take a moment."
        );
    }

    #[test]
    fn test_drag_lifecycle() {
        let mut wf = workflow(ConversionKind::ImageToWebp);
        wf.apply(Intent::DragEnter.into());
        assert!(wf.is_dragging());
        wf.apply(Intent::DragOver.into());
        assert!(wf.is_dragging());

        wf.apply(Intent::DragLeave { related_target: Some(ElementId(2)) }.into());
        assert!(wf.is_dragging());

        wf.apply(Intent::DragLeave { related_target: Some(ElementId(42)) }.into());
        assert!(!wf.is_dragging());

        wf.apply(Intent::DragEnter.into());
        wf.apply(
            Intent::Drop(vec![
                file("first.png", "image/png", 10),
                file("second.png", "image/png", 10),
            ])
            .into(),
        );
        assert!(!wf.is_dragging());
        assert_eq!(wf.job().source().unwrap().name, "first.png");
    }

    #[test]
    fn test_drop_of_invalid_file_still_ends_drag() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        wf.apply(Intent::DragEnter.into());
        wf.apply(Intent::Drop(vec![file("a.png", "image/png", 10)]).into());
        assert!(!wf.is_dragging());
        assert_eq!(wf.job().status(), JobStatus::Empty);
        assert!(wf.message().unwrap().is_error());
    }

    #[test]
    fn test_zone_click_opens_picker_except_on_label() {
        let mut wf = workflow(ConversionKind::PdfToPng);
        assert_eq!(
            wf.apply(Intent::ZoneClicked { target: ElementId(2) }.into()),
            vec![Command::OpenFilePicker]
        );
        assert!(wf
            .apply(Intent::ZoneClicked { target: ElementId(3) }.into())
            .is_empty());
    }
}
