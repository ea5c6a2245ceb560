use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use chatbox::app::App;
use chatbox::config::Config;
use chatbox::controller::{CompletionReceiver, Controller, SubmissionState};
use chatbox::client::HttpChatClient;
use chatbox::{handler, logging, tui, ui};

#[derive(Parser)]
#[command(name = "chatbox")]
#[command(about = "Terminal client for a request/response chat endpoint")]
#[command(version)]
struct Cli {
    /// Chat endpoint URL (overrides the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level or filter directive (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level);
    }

    if let Some(Commands::Config { save }) = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if save {
            let path = match &cli.config {
                Some(path) => {
                    config.save_to(path)?;
                    path.clone()
                }
                None => config.save()?,
            };
            eprintln!("Saved to {}", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let log_path = logging::init(&config)?;
    tracing::info!(endpoint = %config.endpoint, log = %log_path.display(), "starting");

    let client = HttpChatClient::new(&config.endpoint);
    let (controller, completions) = Controller::new(Arc::new(client));

    match cli.command {
        Some(Commands::Ask { message }) => {
            let resolved = ask(controller, completions, message, &mut io::stdout()).await?;
            Ok(if resolved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        _ => {
            run_tui(App::new(controller, config.endpoint), completions).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One submission without the terminal UI.
///
/// Writes the final assistant entry to `out` and returns whether the reply
/// resolved.
async fn ask(
    mut controller: Controller,
    mut completions: CompletionReceiver,
    message: String,
    out: &mut impl Write,
) -> Result<bool> {
    controller.input_mut().set_text(message);
    if controller.submit().is_none() {
        bail!("message is empty");
    }

    let completion = completions
        .recv()
        .await
        .context("request task ended without a result")?;
    let state = controller.complete(completion);

    if let Some(entry) = controller.transcript().last() {
        writeln!(out, "{}", entry.text)?;
    }

    Ok(state == Some(SubmissionState::Resolved))
}

async fn run_tui(mut app: App, mut completions: CompletionReceiver) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            tokio::select! {
                event = events.next() => match event {
                    Some(event) => handler::handle_event(&mut app, event),
                    None => break,
                },
                Some(completion) = completions.recv() => {
                    app.complete(completion);
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!(in_flight = app.controller.in_flight(), "exiting");
    result
}
