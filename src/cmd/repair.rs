//! Repair command CLI handler.

use crate::repair;
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

pub fn run(file: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let input = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;

    let (repaired, stats) = repair::repair_text(&input);

    match &output {
        Some(path) => {
            std::fs::write(path, repaired)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Repair complete: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(repaired.as_bytes())?;
            stdout.flush()?;
            eprintln!("Repair complete");
        }
    }
    eprintln!(
        "  {} of {} lines flagged as corrupted",
        stats.lines_flagged, stats.lines_scanned
    );
    if stats.lines_flagged > 0 {
        eprintln!("  Flagged records need manual recovery from the source dump");
    }

    Ok(())
}
