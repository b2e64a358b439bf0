use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use visionsave::bootstrap::VisionSave;
use visionsave::cli::{Cli, Command};
use visionsave::config::VisionSaveConfig;
use visionsave::detector::{ElementPath, ElementSnapshot, HoverOutcome, PageEffects};
use visionsave::domain::{Decision, DownloadIntent};
use visionsave::protocol::{DownloadRequest, DownloadResponse};
use visionsave::{logging, paths, protocol, serve};

/// Renders page effects as terminal output.
struct TerminalEffects;

impl PageEffects for TerminalEffects {
    fn highlight(&self, target: &ElementPath) {
        println!("[glow on]  {}", target);
    }

    fn unhighlight(&self, target: &ElementPath) {
        println!("[glow off] {}", target);
    }

    fn notify_blocking(&self, message: &str) {
        println!("!! {}", message);
    }
}

fn describe(decision: Decision) -> String {
    match decision {
        Decision::Allow { count } => format!("Saved (downloads today: {})", count),
        Decision::DenyCooldown => "Waiting 2 seconds between downloads".to_string(),
        Decision::DenyQuota => "Daily free limit reached".to_string(),
        Decision::Error => "Download failed".to_string(),
    }
}

async fn hover(
    app: &VisionSave,
    url: String,
    class: Option<String>,
    id: Option<String>,
    hold_ms: Option<u64>,
) -> Result<()> {
    let mut img = ElementSnapshot::image(&url);
    img.class = class;
    img.id = id;

    let detector = app.detector(Arc::new(TerminalEffects));
    let ticket = match detector.pointer_enter(&img) {
        HoverOutcome::NoCandidate => {
            println!("Nothing to download under the pointer");
            return Ok(());
        }
        HoverOutcome::Filtered => {
            println!("Ignored (looks like a logo)");
            return Ok(());
        }
        HoverOutcome::Armed(ticket) => ticket,
    };

    if let Some(hold) = hold_ms {
        tokio::time::sleep(Duration::from_millis(hold)).await;
        if detector.pointer_leave() {
            println!("Pointer left before {} ms; nothing sent", app.config().hover_delay_ms);
        }
    }

    if let Some(decision) = ticket.wait().await {
        println!("{}", describe(decision));
    }
    Ok(())
}

async fn run(app: &VisionSave, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            println!("{}", app.status_feed().current());
        }
        Command::Download { url } => {
            let decision = app.handle().decide(DownloadIntent::new(url)).await?;
            println!("{}", describe(decision));
        }
        Command::Hover {
            url,
            class,
            id,
            hold_ms,
        } => hover(app, url, class, id, hold_ms).await?,
        Command::Pay { phone, method } => {
            let request = app.payment_desk()?.submit(&phone, method).await?;
            println!(
                "Payment info submitted ({}). Please wait for admin approval.",
                request.id
            );
        }
        Command::Requests => {
            let requests = app.payment_desk()?.list()?;
            if requests.is_empty() {
                println!("No payment requests found.");
            }
            for r in requests {
                let when = chrono::DateTime::from_timestamp_millis(r.timestamp)
                    .map(|t| t.with_timezone(&chrono::Local).format("%b %d, %Y %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{}  {:<9} {:<22} {:<14} {:<6} {}",
                    r.id, r.status, r.username, r.phone_number, r.method, when
                );
            }
        }
        Command::Approve { id } => {
            let request = app.payment_desk()?.approve(&id).await?;
            println!("Approved {} for {}", request.id, request.username);
        }
        Command::Reject { id } => {
            let request = app.payment_desk()?.reject(&id)?;
            println!("Rejected {} for {}", request.id, request.username);
        }
        Command::Stats => {
            let stats = app.payment_desk()?.stats()?;
            println!("Total requests:    {}", stats.total);
            println!("Pending approval:  {}", stats.pending);
            println!("Estimated revenue: {} BDT", stats.revenue);
        }
        Command::Protocol { json } => {
            let response = protocol::dispatch_json(app.handle(), &json).await?;
            println!("{}", response);
        }
        Command::Serve { socket: false } => serve::serve_stdio(app.handle()).await?,
        Command::Serve { socket: true } => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let sink = Arc::new(app.handle().clone());
            serve::serve_socket(sink, &paths::socket_path()?, shutdown).await?;
        }
    }
    Ok(())
}

/// Sends download requests to a running `serve --socket` instance, which
/// owns the coordinator and its cooldown while it runs.
///
/// Returns `false` when no server is listening.
async fn forward_to_server(command: &Command) -> Result<bool> {
    let raw = match command {
        Command::Download { url } => {
            serde_json::to_string(&DownloadRequest::CheckAndDownload { url: url.clone() })?
        }
        Command::Protocol { json } => json.clone(),
        _ => return Ok(false),
    };

    let Some(response) = serve::forward(&paths::socket_path()?, &raw).await? else {
        return Ok(false);
    };
    match command {
        Command::Download { .. } => {
            let response: DownloadResponse = serde_json::from_str(&response)
                .context("Server sent an invalid response")?;
            println!("{}", describe(response.into()));
        }
        _ => println!("{}", response),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    if forward_to_server(&cli.command).await? {
        return Ok(());
    }

    let config_path = paths::config_path()?;
    let config = VisionSaveConfig::load_or_default(&config_path)
        .with_context(|| format!("Invalid configuration: {}", config_path.display()))?;

    let app = VisionSave::start(config).await?;
    let result = run(&app, cli.command).await;
    app.shutdown().await;
    result
}
