use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod convert;
mod repair;

#[derive(Parser)]
#[command(name = "mssql2pg")]
#[command(version)]
#[command(
    about = "Convert SQL Server data-export scripts into PostgreSQL INSERT statements",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a T-SQL data export into grouped PostgreSQL INSERT statements
    Convert {
        /// Input SQL script (UTF-16-LE with BOM, UTF-8, or Windows-1252).
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Output SQL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extraction strategy: line (one statement per line) or document
        /// (whole-document scan, handles multi-line statements)
        #[arg(long, default_value = "document")]
        strategy: String,

        /// Identifier style: quoted ("TeamName") or snake (team_name)
        #[arg(long, default_value = "quoted")]
        case: String,

        /// Override the table allow-list (repeatable)
        #[arg(long = "table", value_name = "NAME:PK")]
        tables: Vec<String>,

        /// Skip the trailing sequence-reset statements
        #[arg(long)]
        no_sequence_reset: bool,

        /// Show progress during conversion
        #[arg(short, long)]
        progress: bool,

        /// Preview without writing output (dry run)
        #[arg(long)]
        dry_run: bool,

        /// Print the conversion summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Flag corrupted INSERT lines in previously generated output
    Repair {
        /// Previously generated PostgreSQL SQL file
        file: PathBuf,

        /// Output SQL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            file,
            output,
            strategy,
            case,
            tables,
            no_sequence_reset,
            progress,
            dry_run,
            json,
        } => convert::run(
            file,
            output,
            strategy,
            case,
            tables,
            no_sequence_reset,
            progress,
            dry_run,
            json,
        ),
        Commands::Repair { file, output } => repair::run(file, output),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mssql2pg", &mut io::stdout());
            Ok(())
        }
    }
}
