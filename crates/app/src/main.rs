use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{Label, LandmarkSnapshot, Quiz, RecognitionMode, SignId};
use services::content::{ContentService, ReferenceView, filter_catalog};
use services::sessions::{QuizSession, StopOutcome};
use services::transport::{self, ClassificationTransport, classify};
use services::{
    Clock, EngineConfig, TransportKind, WordSelection, letter_quiz, vocabulary_quiz,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidServer { raw: String },
    InvalidTransport { raw: String },
    InvalidCount { raw: String },
    InvalidSignId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidServer { raw } => write!(f, "invalid --server value: {raw}"),
            ArgsError::InvalidTransport { raw } => {
                write!(f, "invalid --transport value: {raw} (expected batch|stream)")
            }
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidSignId { raw } => write!(f, "invalid --select id: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- words   [--filter <text>] [--select <id,id,...>]");
    eprintln!("  cargo run -p app -- letters [--count <n>]");
    eprintln!("  cargo run -p app -- replay  --frames <file.json> --expect <word> [--words a,b,c]");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --server <url>               recognition service address");
    eprintln!("  --transport <batch|stream>   classification transport");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SIGNQUIZ_SERVER_ADDRESS, SIGNQUIZ_TRANSPORT, SIGNQUIZ_FS_QUIZ_LENGTH, ...");
    eprintln!("  RUST_LOG (default: app=info,services=info)");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Words {
        filter: Option<String>,
        select: Vec<SignId>,
    },
    Letters { count: Option<usize> },
    Replay {
        frames: PathBuf,
        expect: String,
        words: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct Args {
    server: Option<Url>,
    transport: Option<TransportKind>,
    filter: Option<String>,
    select: Vec<SignId>,
    count: Option<usize>,
    frames: Option<PathBuf>,
    expect: Option<String>,
    words: Vec<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--server" => {
                    let value = require_value(args, "--server")?;
                    let url = Url::parse(value.trim())
                        .map_err(|_| ArgsError::InvalidServer { raw: value.clone() })?;
                    parsed.server = Some(url);
                }
                "--transport" => {
                    let value = require_value(args, "--transport")?;
                    parsed.transport = Some(
                        TransportKind::parse(&value)
                            .ok_or(ArgsError::InvalidTransport { raw: value })?,
                    );
                }
                "--filter" => parsed.filter = Some(require_value(args, "--filter")?),
                "--select" => {
                    parsed.select = require_value(args, "--select")?
                        .split(',')
                        .filter(|raw| !raw.trim().is_empty())
                        .map(|raw| {
                            raw.parse::<SignId>().map_err(|_| ArgsError::InvalidSignId {
                                raw: raw.to_string(),
                            })
                        })
                        .collect::<Result<_, _>>()?;
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    let count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                    parsed.count = Some(count);
                }
                "--frames" => parsed.frames = Some(PathBuf::from(require_value(args, "--frames")?)),
                "--expect" => parsed.expect = Some(require_value(args, "--expect")?),
                "--words" => {
                    parsed.words = require_value(args, "--words")?
                        .split(',')
                        .map(str::trim)
                        .filter(|w| !w.is_empty())
                        .map(String::from)
                        .collect();
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    fn into_command(self, name: &str) -> Result<Command, ArgsError> {
        match name {
            "words" => Ok(Command::Words {
                filter: self.filter,
                select: self.select,
            }),
            "letters" => Ok(Command::Letters { count: self.count }),
            "replay" => Ok(Command::Replay {
                frames: self.frames.ok_or(ArgsError::MissingFlag { flag: "--frames" })?,
                expect: self.expect.ok_or(ArgsError::MissingFlag { flag: "--expect" })?,
                words: self.words,
            }),
            other => Err(ArgsError::UnknownArg(other.to_string())),
        }
    }

    fn apply(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(server) = &self.server {
            config = config.with_server(server.clone());
        }
        if let Some(transport) = self.transport {
            config = config.with_transport(transport);
        }
        config
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let name = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(flag) if flag == "--help" || flag == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(name) => name,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let config = args.apply(EngineConfig::from_env()?);
    let command = args.into_command(&name).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    info!(server = %config.server, transport = ?config.transport, "configuration loaded");
    match command {
        Command::Words { filter, select } => list_words(&config, filter.as_deref(), &select).await,
        Command::Letters { count } => list_letters(&config, count).await,
        Command::Replay {
            frames,
            expect,
            words,
        } => replay(&config, &frames, &expect, &words).await,
    }
}

async fn list_words(
    config: &EngineConfig,
    filter: Option<&str>,
    select: &[SignId],
) -> Result<(), Box<dyn std::error::Error>> {
    let content = ContentService::new(config)?;
    let catalog = content.vocabulary().await?;

    if select.is_empty() {
        let hits = filter_catalog(&catalog, filter.unwrap_or_default());
        for entry in &hits {
            println!("{:>6}  {}", entry.id.value(), entry.sign);
        }
        eprintln!(
            "{} of {} signs (select up to {})",
            hits.len(),
            catalog.len(),
            config.vocab_max_words
        );
        return Ok(());
    }

    let mut selection = WordSelection::new(config.vocab_max_words);
    for id in select {
        if let Err(err) = selection.toggle(*id) {
            warn!(%id, "not selected: {err}");
        }
    }
    let quiz = vocabulary_quiz(&catalog, &selection)?;
    for item in quiz.items() {
        println!("{:>3}. {}", item.position() + 1, item.expected());
    }
    Ok(())
}

async fn list_letters(
    config: &EngineConfig,
    count: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = letter_quiz(count.unwrap_or(config.fs_quiz_length), &mut rand::rng())?;
    let reference = match ContentService::new(config)?.fingerspelling().await {
        Ok(reference) => Some(reference),
        Err(err) => {
            warn!("fingerspelling reference unavailable: {err}");
            None
        }
    };

    for item in quiz.items() {
        let letter = item.expected();
        let start = reference.as_ref().and_then(|r| {
            letter
                .as_str()
                .chars()
                .next()
                .and_then(|c| r.start_time(ReferenceView::Front, c))
        });
        match start {
            Some(seconds) => println!("{:>3}. {letter}  (demo at {seconds}s)", item.position() + 1),
            None => println!("{:>3}. {letter}", item.position() + 1),
        }
    }
    Ok(())
}

async fn replay(
    config: &EngineConfig,
    frames: &Path,
    expect: &str,
    words: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(frames)?;
    let snapshots: Vec<LandmarkSnapshot> = serde_json::from_str(&raw)?;
    let with_hands = snapshots.iter().filter(|s| s.landmarks().has_hands()).count();
    if with_hands == 0 && !snapshots.is_empty() {
        warn!(frames = snapshots.len(), "no snapshot carries hand landmarks");
    }

    let mut labels = vec![Label::new(expect)?];
    for word in words {
        let label = Label::new(word.as_str())?;
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    let quiz = Quiz::new(labels)?;

    let transport = transport::from_config(config)?;
    transport.connect().await?;

    let mut session = QuizSession::new(quiz, RecognitionMode::Sequence, Clock::default_clock());
    session.start()?;
    for snapshot in snapshots {
        if let Some(retained) = session.append(snapshot.landmarks().clone()) {
            if let Err(err) = transport.push(&retained).await {
                warn!("snapshot push failed: {err}");
            }
        }
    }

    let evaluation = match session.stop()? {
        StopOutcome::Submit(evaluation) => evaluation,
        StopOutcome::NothingRetained | StopOutcome::Cancelled => {
            transport.close().await;
            println!("no frames to evaluate in {}", frames.display());
            return Ok(());
        }
    };
    let frame_count = evaluation.evidence.len();
    let candidates = classify(transport.as_ref(), evaluation.evidence).await;
    transport.close().await;
    session.resolve(evaluation.ticket, &candidates)?;

    let view = session.view();
    match (view.answer_text(), view.is_correct) {
        (Some(answer), Some(correct)) => {
            let mark = if correct { "correct" } else { "incorrect" };
            println!("{frame_count} frames -> {answer} ({mark}, expected {expect})");
        }
        _ => println!("{frame_count} frames -> no candidates (still evaluating)"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
