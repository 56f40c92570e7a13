use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use beacon_chat::console::{self, ConsoleCommand, ConsoleSynthesizer};
use beacon_chat::{
    AudioFile, Config, Error, FileInput, HttpExchange, TextField, TurnController, TurnOutcome,
};

/// Beacon Chat - Voice and text chat client for AI assistants
#[derive(Parser)]
#[command(name = "beacon-chat", version, about)]
struct Cli {
    /// Processing service base URL
    #[arg(short, long, env = "BEACON_CHAT_SERVER_URL")]
    server: Option<String>,

    /// Language tag for requests and playback (e.g. "hi-IN")
    #[arg(short, long, env = "BEACON_CHAT_LANGUAGE")]
    lang: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message and print the reply
    Ask {
        /// Message text
        text: String,
    },
    /// Send one audio file and print the reply
    Upload {
        /// Path to the audio file
        path: PathBuf,
    },
    /// Clear the conversation context on the service
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,beacon_chat=info",
        1 => "info,beacon_chat=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.server.as_deref() {
        config.server.url = beacon_chat::config::server_url(url)?;
    }
    tracing::debug!(?config, "loaded configuration");

    let exchange = HttpExchange::new(&config.server)?;
    let synthesizer = ConsoleSynthesizer::new(config.playback.voices.clone());
    let mut controller =
        TurnController::new(&config, Box::new(exchange), Box::new(synthesizer))?;

    if let Some(lang) = cli.lang.as_deref() {
        controller.set_language(lang)?;
    }

    tracing::info!(
        server = %config.server.url,
        language = controller.language(),
        "beacon chat ready"
    );

    match cli.command {
        Some(Command::Ask { text }) => ask(&mut controller, &text).await,
        Some(Command::Upload { path }) => upload(&mut controller, &path).await,
        Some(Command::Clear) => {
            controller.clear().await;
            println!("{}", controller.status());
            Ok(())
        }
        None => repl(&mut controller).await,
    }
}

/// One-shot text turn
async fn ask(controller: &mut TurnController, text: &str) -> anyhow::Result<()> {
    let mut field = TextField::new();
    field.set(text);

    let outcome = controller.submit_text(&mut field).await?;
    print_transcript(controller, 0);
    finish_one_shot(controller, outcome)
}

/// One-shot upload turn
async fn upload(controller: &mut TurnController, path: &Path) -> anyhow::Result<()> {
    let mut input = FileInput::new();
    input.select(AudioFile::read(path).await?);

    let outcome = controller.upload_selected(&mut input).await?;
    print_transcript(controller, 0);
    finish_one_shot(controller, outcome)
}

fn finish_one_shot(
    controller: &mut TurnController,
    outcome: Option<TurnOutcome>,
) -> anyhow::Result<()> {
    match outcome {
        None => anyhow::bail!("nothing to send"),
        Some(TurnOutcome::Failed(reason)) => anyhow::bail!("turn failed: {reason}"),
        Some(TurnOutcome::Replied(_)) => {
            controller.on_playback_finished();
            Ok(())
        }
    }
}

/// Print messages appended since `seen`; returns the new count
fn print_transcript(controller: &TurnController, seen: usize) -> usize {
    let transcript = controller.transcript();
    for message in transcript.since(seen) {
        println!("{}", console::render_message(message));
    }
    transcript.len()
}

/// Interactive loop over stdin
async fn repl(controller: &mut TurnController) -> anyhow::Result<()> {
    println!("Beacon chat ({}). Type /help for commands.", controller.language());
    println!("{}", controller.status());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = 0;
    let mut field = TextField::new();
    let mut files = FileInput::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match console::parse_command(&line) {
            ConsoleCommand::Empty => continue,
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{}", console::HELP),
            ConsoleCommand::Say(text) => {
                field.set(text);
                report(&controller.submit_text(&mut field).await);
            }
            ConsoleCommand::Upload(path) => match AudioFile::read(&path).await {
                Ok(file) => {
                    files.select(file);
                    report(&controller.upload_selected(&mut files).await);
                }
                Err(e) => println!("! could not read {}: {e}", path.display()),
            },
            ConsoleCommand::Language(tag) => match controller.set_language(&tag) {
                Ok(()) => println!("language: {}", controller.language()),
                Err(e) => println!("! {e}"),
            },
            ConsoleCommand::Voice => {
                if let Err(e) = controller.toggle_listening() {
                    println!("! {e}");
                }
                println!("{}", controller.status());
            }
            ConsoleCommand::Clear => {
                controller.clear().await;
                seen = 0;
                println!("{}", controller.status());
            }
            ConsoleCommand::Status => {
                println!("{} ({})", controller.status(), controller.state().as_str());
                println!("{}", console::render_pipeline(&controller.pipeline()));
            }
            ConsoleCommand::Unknown(cmd) => println!("! unknown command: {cmd}"),
        }

        seen = print_transcript(controller, seen);
        // Console playback completes as soon as it is printed
        controller.on_playback_finished();
    }

    Ok(())
}

fn report(result: &beacon_chat::Result<Option<TurnOutcome>>) {
    match result {
        Ok(_) => {}
        Err(Error::Busy(state)) => println!("! still {state}, try again shortly"),
        Err(e) => println!("! {e}"),
    }
}
