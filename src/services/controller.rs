//! Driver asincrono del workflow: esegue i comandi e pubblica la vista

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ConversionKind, MessageTimings, ViewState};
use crate::services::download::DownloadSink;
use crate::services::endpoint::ConversionEndpoint;
use crate::workflow::{Command, DropZone, Event, Intent, Workflow};

/// Capacità della coda eventi del controller
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacità del broadcast channel per gli aggiornamenti della vista
const UPDATE_CHANNEL_CAPACITY: usize = 100;

type Envelope = (Event, Option<oneshot::Sender<ViewState>>);

/// Notifiche verso il livello di presentazione
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerUpdate {
    View(ViewState),
    /// Il livello di presentazione deve aprire il selettore file
    OpenFilePicker,
}

/// Handle clonabile verso il controller in esecuzione
#[derive(Clone)]
pub struct WorkflowController {
    events: mpsc::Sender<Envelope>,
    updates: broadcast::Sender<ControllerUpdate>,
    snapshot: Arc<RwLock<ViewState>>,
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("receivers", &self.updates.receiver_count())
            .finish()
    }
}

impl WorkflowController {
    pub fn spawn(
        kind: ConversionKind,
        zone: DropZone,
        config: &Config,
        endpoint: Arc<dyn ConversionEndpoint>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let workflow = Workflow::new(kind, zone, MessageTimings::from(config));
        let (events, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let snapshot = Arc::new(RwLock::new(workflow.view()));

        let actor = Actor {
            workflow,
            rx,
            feedback: events.downgrade(),
            endpoint,
            sink,
            updates: updates.clone(),
            snapshot: snapshot.clone(),
            clear_timer: None,
        };
        tokio::spawn(actor.run());
        tracing::info!("Controller avviato per {}", kind);

        Self {
            events,
            updates,
            snapshot,
        }
    }

    /// Applica un'intenzione e restituisce la vista risultante
    pub async fn dispatch(&self, intent: Intent) -> Result<ViewState> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.events
            .send((intent.into(), Some(ack_tx)))
            .await
            .map_err(|_| AppError::ControllerClosed)?;
        ack_rx.await.map_err(|_| AppError::ControllerClosed)
    }

    pub async fn snapshot(&self) -> ViewState {
        self.snapshot.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerUpdate> {
        self.updates.subscribe()
    }

    /// Attende che non ci sia più un upload in volo
    pub async fn wait_until_settled(&self) -> Result<ViewState> {
        let mut updates = self.subscribe();
        loop {
            let view = self.snapshot().await;
            if !view.submitting {
                return Ok(view);
            }
            match updates.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(AppError::ControllerClosed),
            }
        }
    }
}

struct Actor {
    workflow: Workflow,
    rx: mpsc::Receiver<Envelope>,
    feedback: mpsc::WeakSender<Envelope>,
    endpoint: Arc<dyn ConversionEndpoint>,
    sink: Arc<dyn DownloadSink>,
    updates: broadcast::Sender<ControllerUpdate>,
    snapshot: Arc<RwLock<ViewState>>,
    clear_timer: Option<JoinHandle<()>>,
}

impl Actor {
    async fn run(mut self) {
        while let Some((event, ack)) = self.rx.recv().await {
            for command in self.workflow.apply(event) {
                self.execute(command);
            }

            let view = self.workflow.view();
            *self.snapshot.write().await = view.clone();
            // Ignora errore se nessun receiver
            let _ = self.updates.send(ControllerUpdate::View(view.clone()));
            if let Some(ack) = ack {
                let _ = ack.send(view);
            }
        }

        self.cancel_timer();
        tracing::debug!("Controller {} terminato", self.workflow.kind());
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::OpenFilePicker => {
                let _ = self.updates.send(ControllerUpdate::OpenFilePicker);
            }
            Command::Upload { job_id, kind, file } => {
                let endpoint = self.endpoint.clone();
                let feedback = self.feedback.clone();
                tokio::spawn(async move {
                    let upload =
                        tokio::spawn(async move { endpoint.convert(kind.descriptor(), &file).await });
                    // Un upload andato in panic chiude comunque il job
                    let outcome = match upload.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(AppError::Transport(format!("Upload interrotto: {}", e))),
                    };
                    send_back(&feedback, Event::ResponseReceived { job_id, outcome }).await;
                });
            }
            Command::Download {
                job_id,
                filename,
                data,
            } => {
                let sink = self.sink.clone();
                let feedback = self.feedback.clone();
                tokio::spawn(async move {
                    let delivery = tokio::spawn(async move { sink.deliver(&filename, data).await });
                    let outcome = match delivery.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(AppError::Download(format!("Download interrotto: {}", e))),
                    };
                    send_back(&feedback, Event::DownloadFinished { job_id, outcome }).await;
                });
            }
            Command::ScheduleClear { token, after } => {
                self.cancel_timer();
                let feedback = self.feedback.clone();
                self.clear_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    send_back(&feedback, Event::MessageExpired { token }).await;
                }));
            }
            Command::CancelClear => self.cancel_timer(),
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.clear_timer.take() {
            timer.abort();
        }
    }
}

async fn send_back(feedback: &mpsc::WeakSender<Envelope>, event: Event) {
    match feedback.upgrade() {
        Some(tx) => {
            if tx.send((event, None)).await.is_err() {
                tracing::debug!("Controller chiuso, evento scartato");
            }
        }
        None => tracing::debug!("Controller chiuso, evento scartato"),
    }
}
