use std::io::{self, BufRead, Write};

use anyhow::Context;

use tally_app::LedgerService;
use tally_infra::{FileKeyValueStore, TallyConfig};

fn main() -> anyhow::Result<()> {
    let config = TallyConfig::from_env().context("invalid configuration")?;
    tally_observability::init(config.log_format);

    let storage = FileKeyValueStore::open(&config.data_dir)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;
    let mut service = LedgerService::open(storage, config.ledger_options())
        .context("failed to load ledger")?;

    tracing::info!(data_dir = %config.data_dir.display(), "tally ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = service.handle_line(&line);
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }

    Ok(())
}
