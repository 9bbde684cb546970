use std::sync::Arc;

use clap::Parser;
use genai_bridge::channel::envelope::{ReplyEnvelope, RequestEnvelope};
use genai_bridge::config::SimulationConfig;
use genai_bridge::{logger, GenAiPlugin, MethodChannel, Result, Settings};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "genai-bridge")]
#[command(about = "Serve simulated text generation over a JSON-lines method channel")]
struct Cli {
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Overrides logging.level from the config file.
    #[arg(long)]
    log_level: Option<String>,

    /// Skip the simulated load and generation delays.
    #[arg(long)]
    instant: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    if cli.instant {
        settings.simulation = SimulationConfig {
            response_style: settings.simulation.response_style,
            ..SimulationConfig::instant()
        };
    }

    logger::init(&settings.logging)?;

    info!("Starting genai-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config);

    let channel = MethodChannel::new(settings.bridge.channel.clone());
    let plugin = Arc::new(GenAiPlugin::new(&settings, &Handle::current()));
    plugin.clone().attach(&channel);

    let served = serve(&channel).await;

    plugin.detach(&channel);
    plugin.join().await;
    info!("genai-bridge stopped");

    served
}

/// Feeds stdin lines into `channel` until EOF and writes each reply as one
/// line on stdout, in completion order.
async fn serve(channel: &MethodChannel) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = line_rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut in_flight = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request = match RequestEnvelope::parse(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "malformed request line");
                match ReplyEnvelope::malformed(&line, &e).to_line() {
                    Ok(reply) => {
                        let _ = line_tx.send(reply);
                    }
                    Err(e) => error!(error = %e, "failed to encode reply"),
                }
                continue;
            }
        };

        let (id, call) = request.into_call();
        let pending = channel.invoke(call);
        let line_tx = line_tx.clone();
        in_flight.spawn(async move {
            let result = match pending.await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "no reply delivered");
                    return;
                }
            };
            match (ReplyEnvelope { id, result }).to_line() {
                Ok(line) => {
                    let _ = line_tx.send(line);
                }
                Err(e) => error!(error = %e, "failed to encode reply"),
            }
        });
    }

    while in_flight.join_next().await.is_some() {}
    drop(line_tx);
    writer.await??;
    Ok(())
}
