// model = "claude-opus-4-5"
// created = "2026-01-30"
// modified = "2026-10-17"
// driver = "Isaac Clayton"

//! Replay a JSON-lines stream of operation envelopes and print the
//! resulting documents.
//!
//! ```text
//! SCRIBE_CONFIG=scribe.json RUST_LOG=scribe=debug scribe < ops.jsonl
//! ```
//!
//! Each input line is `{"document": "...", "operation": {...}}`. Documents
//! are created on first sight. Lines that fail to decode or apply are
//! logged and skipped.

use std::io::BufRead;
use std::io::Write;

use thiserror::Error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use scribe::config::Config;
use scribe::config::ConfigError;
use scribe::table::DocumentTable;
use scribe::table::TableError;
use scribe::wire;

const CONFIG_VAR: &str = "SCRIBE_CONFIG";

#[derive(Debug, Error)]
enum ReplayError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Table(#[from] TableError),
}

fn load_config() -> Result<Config, ReplayError> {
    let path = match std::env::var_os(CONFIG_VAR) {
        Some(path) => path,
        None => return Ok(Config::default()),
    };
    let json = std::fs::read_to_string(&path)?;
    let config = Config::from_json(&json)?;
    info!(path = ?path, ?config, "loaded config");
    return Ok(config);
}

fn run() -> Result<(), ReplayError> {
    let config = load_config()?;
    let mut table = DocumentTable::new(config);

    let stdin = std::io::stdin();
    let mut applied = 0usize;
    let mut skipped = 0usize;
    for (number, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let envelope = match wire::decode_envelope(&line) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(line = number + 1, %err, "skipped undecodable line");
                skipped += 1;
                continue;
            }
        };
        let handle = table.get_or_create(&envelope.document);
        match handle.lock().apply(envelope.operation) {
            Ok(_) => applied += 1,
            Err(err) => {
                warn!(line = number + 1, document = %envelope.document, %err, "skipped invalid operation");
                skipped += 1;
            }
        }
    }
    info!(applied, skipped, documents = table.len(), "replay finished");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for id in table.ids() {
        let handle = table.get(&id)?;
        let doc = handle.lock();
        writeln!(out, "{}\t{}\t{:?}", id, doc.digest(), doc.visible_text())?;
    }
    return Ok(());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scribe=info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("scribe: {}", err);
        std::process::exit(1);
    }
}
