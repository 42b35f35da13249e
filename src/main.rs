use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use mavis::completion::HighlightedWord;
use mavis::{Config, Engine, Event, SessionView, SpeakOptions, TextBuffer, Utterance};

/// Mavis - phrase completion, correction and soundbites for assisted speech
#[derive(Parser)]
#[command(name = "mavis", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Corrector service address (host:port), skips mDNS discovery
    #[arg(long, env = "MAVIS_CORRECTOR_ADDR")]
    corrector: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank known phrases against the given text
    Complete {
        /// Text typed so far
        text: String,
    },
    /// Ask the corrector service for corrections of the given text
    ///
    /// Without a configured address the service is looked up over mDNS for
    /// a few seconds first.
    Correct {
        /// Sentence to correct
        text: String,
    },
    /// Show how the given text would be voiced
    Speak {
        /// Text to speak
        text: String,
        /// Treat as spoken automatically at the end of a sentence
        #[arg(long)]
        automatic: bool,
        /// A phone call is active
        #[arg(long)]
        in_call: bool,
    },
    /// List soundbite names
    Soundbites,
    /// Import a phrase, pronunciation or soundbite file
    Import {
        /// File or soundbites directory to import
        path: PathBuf,
    },
    /// Show recently spoken messages
    History,
    /// Line-driven completion session
    Interactive,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,mavis=info",
        1 => "info,mavis=debug",
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
    let mut config = Config::load();
    if let Some(addr) = cli.corrector {
        config.corrector.address = Some(addr);
        config.corrector.enabled = true;
    }
    if matches!(cli.command, Command::Correct { .. }) {
        config.corrector.enabled = true;
    }
    tracing::debug!(?config, "loaded configuration");

    let mut engine = Engine::new(config)?;

    match cli.command {
        Command::Complete { text } => {
            for candidate in engine.complete(&text) {
                println!("{:>5.2}  {}", candidate.score, candidate.text);
            }
        }
        Command::Correct { text } => {
            for candidate in engine.correct(&text).await {
                println!("{candidate}");
            }
        }
        Command::Speak {
            text,
            automatic,
            in_call,
        } => {
            let options = SpeakOptions { automatic, in_call };
            match engine.speak(&text, options) {
                Some(Utterance::Soundbite(path)) => println!("soundbite: {}", path.display()),
                Some(Utterance::Synthesize { text, ssml: true }) => println!("ssml: {text}"),
                Some(Utterance::Synthesize { text, ssml: false }) => println!("say: {text}"),
                None => println!("(nothing to say)"),
            }
        }
        Command::Soundbites => {
            for name in engine.soundbite_names() {
                println!("{name}");
            }
        }
        Command::Import { path } => {
            let file = engine.import(&path)?;
            println!("imported {}", file.file_name());
        }
        Command::History => {
            for message in engine.history() {
                println!("{:>3}  {}", message.id, message.message);
            }
        }
        Command::Interactive => interactive(&mut engine).await?,
    }

    Ok(())
}

/// Drive a session from stdin commands
async fn interactive(engine: &mut Engine) -> anyhow::Result<()> {
    println!("commands: :start <text>, :next, :prev, :refine <c>, :accept, :cancel, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = TextBuffer::default();

    while let Some(line) = lines.next_line().await? {
        let (command, arg) = line
            .trim_end()
            .split_once(' ')
            .unwrap_or((line.trim_end(), ""));

        let event = match command {
            ":start" => {
                buffer = TextBuffer::with_caret_at_end(arg);
                Event::Start(buffer.clone())
            }
            ":next" => Event::SelectNext,
            ":prev" => Event::SelectPrevious,
            ":refine" => match arg.chars().next() {
                Some(c) => Event::Refine(c),
                None => {
                    println!("usage: :refine <c>");
                    continue;
                }
            },
            ":accept" => Event::Accept,
            ":cancel" => Event::Cancel,
            ":quit" => break,
            other => {
                println!("unknown command: {other}");
                continue;
            }
        };

        let outcome = engine.handle(event);
        let mut view = outcome.view;

        if view.awaiting_network {
            let wait = engine.config().corrector.timeout * 2;
            match tokio::time::timeout(wait, engine.next_reply()).await {
                Ok(Some(updated)) => view = updated,
                Ok(None) | Err(_) => tracing::warn!("no corrector reply"),
            }
        }

        if let Some(edit) = outcome.edit {
            println!("text: {}", edit.text);
            buffer = edit;
        }
        render(&view);
    }

    tracing::debug!(text = %buffer.text, "interactive session ended");
    Ok(())
}

fn render(view: &SessionView) {
    if !view.is_active {
        return;
    }
    if view.awaiting_network {
        println!("  (waiting for corrector)");
        return;
    }

    for (i, words) in view.highlights.iter().enumerate() {
        let marker = if view.selected_index == Some(i) { '>' } else { ' ' };
        println!("{marker} {}", render_words(words));
    }
}

fn render_words(words: &[HighlightedWord]) -> String {
    words
        .iter()
        .map(|w| {
            if w.changed {
                format!("*{}*", w.text)
            } else {
                w.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
