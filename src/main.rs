use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use converty_client::config::Config;
use converty_client::models::{ConversionKind, JobStatus, SourceFile, ViewState};
use converty_client::services::{DirectorySink, HttpEndpoint, WorkflowController};
use converty_client::workflow::{DropZone, Intent};

/// Converte un file tramite l'API Converty e salva il risultato
#[derive(Debug, Parser)]
#[command(name = "converty-client", version, about)]
struct Cli {
    /// Tipo di conversione: pdf-to-png, image-to-webp, remove-background
    kind: ConversionKind,

    /// File da convertire
    file: PathBuf,

    /// URL base dell'API di conversione
    #[arg(long, env = "CONVERTY_API_URL")]
    api_url: Option<String>,

    /// Directory in cui salvare il file convertito
    #[arg(short, long, env = "CONVERTY_DOWNLOAD_DIR")]
    output_dir: Option<PathBuf>,

    /// Stampa lo stato finale come JSON
    #[arg(long)]
    json: bool,

    /// Log di debug
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Inizializza logging
    let default_filter = if cli.verbose {
        "converty_client=debug"
    } else {
        "converty_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Carica configurazione
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(dir) = cli.output_dir {
        config.download_dir = dir;
    }

    let endpoint = match HttpEndpoint::new(&config) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };
    let sink = DirectorySink::new(config.download_dir.clone());

    tracing::info!("API: {}", config.api_url);
    tracing::info!("Download in: {}", sink.dir().display());

    let controller = WorkflowController::spawn(
        cli.kind,
        DropZone::default(),
        &config,
        Arc::new(endpoint),
        Arc::new(sink),
    );

    let file = match SourceFile::from_path(&cli.file).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Impossibile aprire {}: {}", cli.file.display(), e);
            std::process::exit(2);
        }
    };

    let view = match run(&controller, file).await {
        Ok(view) => view,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Errore serializzazione stato: {}", e),
        }
    }

    if view.status != JobStatus::Success {
        std::process::exit(1);
    }
}

async fn run(
    controller: &WorkflowController,
    file: SourceFile,
) -> converty_client::error::Result<ViewState> {
    let mut last = None;

    let view = controller.dispatch(Intent::ChooseFile(Some(file))).await?;
    print_message(&view, &mut last);
    if view.status != JobStatus::Selected {
        return Ok(view);
    }

    let view = controller.dispatch(Intent::Submit).await?;
    print_message(&view, &mut last);

    let view = controller.wait_until_settled().await?;
    print_message(&view, &mut last);
    Ok(view)
}

fn print_message(view: &ViewState, last: &mut Option<String>) {
    if let Some(message) = &view.message {
        if last.as_deref() == Some(message.text.as_str()) {
            return;
        }
        *last = Some(message.text.clone());
        if message.is_error() {
            eprintln!("Error: {}", message.text);
        } else {
            println!("{}", message.text);
        }
    }
}
