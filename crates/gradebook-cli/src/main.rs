//! gradebook CLI: mark templates, bulk upload and rankings.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gradebook", version, about = "Exam marks, grades and rankings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the blank upload template for an exam
    Template {
        /// Exam definition TOML
        #[arg(long)]
        exam: PathBuf,

        /// Only include the first N students
        #[arg(long)]
        sample: Option<usize>,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import a filled-in mark sheet
    Import {
        /// Exam definition TOML
        #[arg(long)]
        exam: PathBuf,

        /// Uploaded CSV mark sheet
        #[arg(long)]
        upload: PathBuf,

        /// Marks file to merge into (created if missing)
        #[arg(long)]
        marks: Option<PathBuf>,

        /// Write even if the exam's marks are locked
        #[arg(long)]
        override_lock: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show totals, averages and positions
    Rank {
        /// Exam definition TOML
        #[arg(long)]
        exam: PathBuf,

        /// Marks file produced by `import`
        #[arg(long)]
        marks: PathBuf,

        /// Rank within a single class or stream
        #[arg(long)]
        group: Option<String>,

        /// Rank on a single subject id instead of the average
        #[arg(long)]
        subject: Option<String>,

        /// Save a JSON results sheet (relative paths land in `results_dir`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Look up the grade for a score
    Grade {
        /// Score in [0, 100]; omit for "no entry"
        score: Option<f64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate exam definition files
    Validate {
        /// Path to exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create starter config and example exam
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gradebook=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Template {
            exam,
            sample,
            output,
        } => commands::template::execute(exam, sample, output),
        Commands::Import {
            exam,
            upload,
            marks,
            override_lock,
            config,
        } => commands::import::execute(exam, upload, marks, override_lock, config),
        Commands::Rank {
            exam,
            marks,
            group,
            subject,
            output,
            config,
        } => commands::rank::execute(exam, marks, group, subject, output, config),
        Commands::Grade { score, config } => commands::grade::execute(score, config),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
