use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use puppi_algo::PuppiSetup;
use puppi_core::serde::{from_json_slice, to_canonical_json_bytes};
use puppi_producer::{produce_batch, Event, EventOutput};
use serde::Serialize;

use super::load_config;

#[derive(Args, Debug)]
pub struct WeighArgs {
    /// YAML configuration; defaults are used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// JSON array of events.
    #[arg(long)]
    pub events: PathBuf,
    /// Output path for the weighted report.
    #[arg(long)]
    pub out: PathBuf,
    /// Worker threads for the batch.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,
}

#[derive(Debug, Serialize)]
struct WeighReport {
    config_hash: String,
    events: usize,
    candidates: usize,
    outputs: Vec<EventOutput>,
}

pub fn run(args: &WeighArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let config_hash = PuppiSetup::new(config.puppi.clone())
        .map_err(|err| Box::new(err) as Box<dyn Error>)?
        .config_hash()
        .to_string();
    let events: Vec<Event> =
        from_json_slice(&fs::read(&args.events)?).map_err(|err| Box::new(err) as Box<dyn Error>)?;

    let outputs = produce_batch(&config, &events, args.threads)
        .map_err(|err| Box::new(err) as Box<dyn Error>)?;
    let candidates = outputs.iter().map(|output| output.weights.len()).sum();
    tracing::info!(events = events.len(), candidates, hash = %config_hash, "weighing finished");

    let report = WeighReport {
        config_hash,
        events: events.len(),
        candidates,
        outputs,
    };
    if let Some(parent) = args.out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = to_canonical_json_bytes(&report).map_err(|err| Box::new(err) as Box<dyn Error>)?;
    fs::write(&args.out, json)?;
    Ok(())
}
