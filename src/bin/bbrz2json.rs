//! Offline converter: decode `.bbrz` replays and print them as JSON.
//!
//! Usage: `bbrz2json <replay.bbrz>...`

use std::io::Write;

use anyhow::{Context, bail};
use gobbler::parser::{BbrzParser, ReplayParser};

fn main() -> anyhow::Result<()> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: bbrz2json <replay.bbrz>...");
    }

    let parser = BbrzParser::new();
    let mut out = std::io::stdout().lock();
    for path in &paths {
        let raw = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
        let record = parser
            .parse(&raw)
            .with_context(|| format!("Failed to decode {path}"))?;
        let json = serde_json::to_string_pretty(&record)
            .with_context(|| format!("Failed to encode {path}"))?;
        writeln!(out, "{json}")?;
    }
    Ok(())
}
