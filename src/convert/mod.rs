//! The read → decode → extract → rewrite → group → write pipeline.
//!
//! Whole-file, single-threaded batch processing: the input is read into
//! memory, converted, and written in one pass. Output statements are
//! partitioned by table in allow-list order under `-- <Table> data`
//! headers (emitted even for empty groups), followed by one sequence-reset
//! statement per table. A fatal I/O error aborts the run; there is no
//! partial-output recovery.

use crate::decoder::{self, Compression};
use crate::progress::ProgressReader;
use crate::rewriter::{to_snake_case, IdentifierCase, Rewriter};
use crate::scanner::{self, ExtractStrategy};
use crate::tables::TableMapping;
use ahash::AHashMap;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

/// Configuration for one conversion run.
#[derive(Debug)]
pub struct ConvertConfig {
    /// Input T-SQL script (optionally compressed).
    pub input: PathBuf,
    /// Output SQL file (None for stdout).
    pub output: Option<PathBuf>,
    /// Statement extraction strategy.
    pub strategy: ExtractStrategy,
    /// Identifier style for the emitted SQL.
    pub case: IdentifierCase,
    /// Table allow-list and primary-key mapping.
    pub tables: TableMapping,
    /// Emit trailing sequence-reset statements.
    pub sequence_reset: bool,
    /// Preview without writing output.
    pub dry_run: bool,
    /// Show a byte-based progress bar.
    pub progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            strategy: ExtractStrategy::default(),
            case: IdentifierCase::default(),
            tables: TableMapping::default(),
            sequence_reset: true,
            dry_run: false,
            progress: false,
        }
    }
}

/// Per-table statement count.
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub count: u64,
}

/// Statistics from one conversion run.
#[derive(Debug, Default, Serialize)]
pub struct ConvertStats {
    /// Statements rewritten and emitted.
    pub statements_converted: u64,
    /// Allow-listed statements the extractor could not parse.
    pub statements_flagged: u64,
    /// Counts per table, in allow-list order (zero-count tables included;
    /// the console report omits them).
    pub per_table: Vec<TableCount>,
    /// One message per flagged misparse.
    pub warnings: Vec<String>,
}

/// Run the conversion pipeline.
pub fn run(config: ConvertConfig) -> anyhow::Result<ConvertStats> {
    let file = File::open(&config.input)
        .with_context(|| format!("Failed to open input file: {}", config.input.display()))?;
    let file_size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let progress_bar = if config.progress {
        let pb = ProgressBar::new(file_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")
                .unwrap(),
        );
        pb.set_message("Converting...");
        Some(pb)
    } else {
        None
    };

    let reader: Box<dyn Read> = match &progress_bar {
        Some(pb) => {
            let pb = pb.clone();
            Box::new(ProgressReader::new(file, move |n| pb.set_position(n)))
        }
        None => Box::new(file),
    };

    let compression = Compression::from_path(&config.input);
    let mut reader = compression.wrap_reader(reader)?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read input file: {}", config.input.display()))?;

    let text = decoder::decode(&bytes);
    let output = convert_text(&text, &config);

    if let Some(pb) = &progress_bar {
        pb.finish_and_clear();
    }

    if !config.dry_run {
        let mut writer: Box<dyn Write> = match &config.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Box::new(BufWriter::with_capacity(
                    256 * 1024,
                    File::create(path).with_context(|| {
                        format!("Failed to create output file: {}", path.display())
                    })?,
                ))
            }
            None => Box::new(BufWriter::new(std::io::stdout())),
        };
        writer.write_all(output.text.as_bytes())?;
        writer.flush()?;
    }

    Ok(output.stats)
}

pub(crate) struct ConvertOutput {
    pub text: String,
    pub stats: ConvertStats,
}

/// Convert decoded script text into grouped PostgreSQL statements.
pub(crate) fn convert_text(text: &str, config: &ConvertConfig) -> ConvertOutput {
    let scan = scanner::extract(text, &config.tables, config.strategy);

    // Line-oriented input is already single-line; only the document
    // strategy produces statements with internal newlines to collapse.
    let rewriter = Rewriter::new(config.case)
        .with_collapse_whitespace(config.strategy == ExtractStrategy::WholeDocument);

    let mut groups: AHashMap<&str, Vec<String>> = AHashMap::new();
    for stmt in &scan.statements {
        groups
            .entry(stmt.table.as_str())
            .or_default()
            .push(rewriter.rewrite(&stmt.text));
    }

    let mut out = String::new();
    let mut per_table = Vec::with_capacity(config.tables.len());
    let mut converted = 0u64;

    for (i, spec) in config.tables.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("-- {} data\n", spec.name));
        let count = match groups.get(spec.name.as_str()) {
            Some(stmts) => {
                for stmt in stmts {
                    out.push_str(stmt);
                    out.push('\n');
                }
                stmts.len() as u64
            }
            None => 0,
        };
        converted += count;
        per_table.push(TableCount {
            table: spec.name.clone(),
            count,
        });
    }

    if config.sequence_reset {
        out.push_str("\n-- Reset sequences\n");
        for spec in config.tables.iter() {
            out.push_str(&sequence_reset_statement(
                &spec.name,
                &spec.pk_column,
                config.case,
            ));
            out.push('\n');
        }
    }

    let warnings: Vec<String> = scan.misparses.iter().map(|m| m.to_string()).collect();
    ConvertOutput {
        text: out,
        stats: ConvertStats {
            statements_converted: converted,
            statements_flagged: scan.misparses.len() as u64,
            per_table,
            warnings,
        },
    }
}

/// Build the `setval` statement that resynchronizes a table's identity
/// sequence. COALESCE guarantees an empty table resets to 1.
pub fn sequence_reset_statement(table: &str, pk_column: &str, case: IdentifierCase) -> String {
    match case {
        IdentifierCase::Quoted => format!(
            "SELECT setval(pg_get_serial_sequence('\"{table}\"', '{pk}'), COALESCE((SELECT MAX(\"{pk}\") FROM \"{table}\"), 1));",
            pk = pk_column,
        ),
        IdentifierCase::Snake => {
            let table = table.to_lowercase();
            let pk = to_snake_case(pk_column);
            format!(
                "SELECT setval(pg_get_serial_sequence('{table}', '{pk}'), COALESCE((SELECT MAX({pk}) FROM {table}), 1));"
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_reset_quoted() {
        assert_eq!(
            sequence_reset_statement("Teams", "TeamID", IdentifierCase::Quoted),
            "SELECT setval(pg_get_serial_sequence('\"Teams\"', 'TeamID'), COALESCE((SELECT MAX(\"TeamID\") FROM \"Teams\"), 1));"
        );
    }

    #[test]
    fn test_sequence_reset_snake() {
        assert_eq!(
            sequence_reset_statement("ChecklistTemplates", "TemplateID", IdentifierCase::Snake),
            "SELECT setval(pg_get_serial_sequence('checklisttemplates', 'template_id'), COALESCE((SELECT MAX(template_id) FROM checklisttemplates), 1));"
        );
    }

    #[test]
    fn test_convert_text_groups_in_allow_list_order() {
        let text = "INSERT [dbo].[Users] ([UserID], [UserName]) VALUES (1, N'amy')\nINSERT [dbo].[Teams] ([TeamID], [TeamName]) VALUES (1, N'Kitchen')\n";
        let output = convert_text(text, &ConvertConfig::default());

        let teams_pos = output.text.find("-- Teams data").unwrap();
        let users_pos = output.text.find("-- Users data").unwrap();
        assert!(teams_pos < users_pos);

        // Headers for empty groups are still written.
        assert!(output.text.contains("-- ReportSignatures data"));

        assert_eq!(output.stats.statements_converted, 2);
        assert_eq!(output.stats.per_table[0].table, "Teams");
        assert_eq!(output.stats.per_table[0].count, 1);
    }

    #[test]
    fn test_convert_text_emits_resets_for_empty_tables() {
        let output = convert_text("", &ConvertConfig::default());
        assert!(output.text.contains("-- Reset sequences"));
        // Empty table still resolves to 1 via COALESCE.
        assert!(output.text.contains(
            "SELECT setval(pg_get_serial_sequence('\"ReportSignatures\"', 'SignatureID'), COALESCE((SELECT MAX(\"SignatureID\") FROM \"ReportSignatures\"), 1));"
        ));
    }

    #[test]
    fn test_convert_text_flags_misparses() {
        let config = ConvertConfig {
            strategy: ExtractStrategy::LineOriented,
            ..ConvertConfig::default()
        };
        let text = "INSERT [dbo].[Teams] ([TeamID], [Score]) VALUES (1, OUTER(INNER(2),3))\n";
        let output = convert_text(text, &config);
        assert_eq!(output.stats.statements_converted, 0);
        assert_eq!(output.stats.statements_flagged, 1);
        assert_eq!(output.stats.warnings.len(), 1);
    }

    #[test]
    fn test_convert_text_no_sequence_reset() {
        let config = ConvertConfig {
            sequence_reset: false,
            ..ConvertConfig::default()
        };
        let output = convert_text("", &config);
        assert!(!output.text.contains("Reset sequences"));
    }
}
