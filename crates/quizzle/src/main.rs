//! Word Quizzle server binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use quizzle::{QuizzleServer, ServerConfig, ServerError};
use quizzle_store::UserStore;
use quizzle_words::FileWordSource;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Word Quizzle translation-duel server")]
struct Args {
    /// Host to bind both listeners on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port for client sessions
    #[arg(short, long, default_value_t = 8888)]
    port: u16,

    /// TCP port for the registration front door
    #[arg(long, default_value_t = 5678)]
    registration_port: u16,

    /// Match duration in minutes
    #[arg(long, default_value_t = 1)]
    match_minutes: u64,

    /// Invitation timeout in seconds
    #[arg(long, default_value_t = 15)]
    invite_timeout: u64,

    /// Words per match
    #[arg(long, default_value_t = 5)]
    match_words: usize,

    /// Worker threads executing request handlers
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Path of the persistent user store
    #[arg(long, default_value = "Database.json")]
    database: PathBuf,

    /// Path of the dictionary file
    #[arg(long, default_value = "data/dictionary.txt")]
    dictionary: PathBuf,
}

fn main() -> Result<(), ServerError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.workers.max(1))
        .enable_all()
        .build()?;
    runtime.block_on(serve(args))
}

async fn serve(args: Args) -> Result<(), ServerError> {
    let store = UserStore::open(&args.database)?;
    let words = FileWordSource::load(&args.dictionary)?;
    if words.len() < args.match_words {
        return Err(ServerError::Config(format!(
            "dictionary {} holds {} words, a match needs {}",
            args.dictionary.display(),
            words.len(),
            args.match_words
        )));
    }

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        registration_addr: format!("{}:{}", args.host, args.registration_port),
        match_duration: Duration::from_secs(args.match_minutes * 60),
        invite_window: Duration::from_secs(args.invite_timeout),
        match_words: args.match_words,
    };

    let server = QuizzleServer::builder()
        .config(config)
        .build(store, words)
        .await?;
    server.run().await
}
