//! Convert command CLI handler.

use crate::convert::{self, ConvertConfig, ConvertStats};
use crate::rewriter::IdentifierCase;
use crate::scanner::ExtractStrategy;
use crate::tables::TableMapping;
use std::path::{Path, PathBuf};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    strategy: String,
    case: String,
    tables: Vec<String>,
    no_sequence_reset: bool,
    progress: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let strategy = strategy
        .parse::<ExtractStrategy>()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let case = case
        .parse::<IdentifierCase>()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let tables = if tables.is_empty() {
        TableMapping::default()
    } else {
        TableMapping::from_overrides(&tables)?
    };

    let config = ConvertConfig {
        input: file,
        output: output.clone(),
        strategy,
        case,
        tables,
        sequence_reset: !no_sequence_reset,
        dry_run,
        progress,
    };

    let stats = convert::run(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats, output.as_deref(), dry_run);
    }

    Ok(())
}

fn print_stats(stats: &ConvertStats, output: Option<&Path>, dry_run: bool) {
    match output {
        Some(path) => eprintln!("Conversion complete: {}", path.display()),
        None => eprintln!("Conversion complete"),
    }
    eprintln!("  {} INSERT statements converted", stats.statements_converted);
    for tc in &stats.per_table {
        if tc.count > 0 {
            eprintln!("  - {}: {}", tc.table, tc.count);
        }
    }

    if stats.statements_flagged > 0 {
        eprintln!();
        eprintln!("Flagged misparses ({}):", stats.statements_flagged);
        for warning in &stats.warnings {
            eprintln!("  ⚠ {}", warning);
        }
    }

    if dry_run {
        eprintln!();
        eprintln!("(Dry run - no output written)");
    }
}
