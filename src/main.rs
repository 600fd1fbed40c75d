use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use statusdeck::report::{ReportConfig, generate};
use statusdeck::source::{DateRange, SqliteSource};

#[derive(Debug, Parser)]
#[command(name = "statusdeck")]
#[command(about = "Build a paginated PowerPoint status report from SQLite notes", version)]
struct Cli {
    /// First day of the report, YYYY-MM-DD (prompted when omitted)
    #[arg(long)]
    from: Option<String>,

    /// Last day of the report, YYYY-MM-DD (prompted when omitted)
    #[arg(long)]
    to: Option<String>,

    #[arg(long)]
    db: Option<PathBuf>,

    #[arg(long)]
    template: Option<PathBuf>,

    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Seed for sampling learnings and insights
    #[arg(long)]
    seed: Option<u64>,

    /// Location stamped on the cover slide
    #[arg(long)]
    location: Option<String>,

    /// Project groups on the summary slide
    #[arg(long)]
    summary_chunk_size: Option<NonZeroUsize>,

    /// Project groups per project slide
    #[arg(long)]
    chunk_size: Option<NonZeroUsize>,

    /// Support items per project slide
    #[arg(long)]
    teach_chunk_size: Option<NonZeroUsize>,

    /// Plan groups per plan slide
    #[arg(long)]
    plan_chunk_size: Option<NonZeroUsize>,

    #[arg(long)]
    learnings_cap: Option<usize>,

    #[arg(long)]
    insights_cap: Option<usize>,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    fn apply(self, mut config: ReportConfig) -> ReportConfig {
        if let Some(db) = self.db {
            config.db = db;
        }
        if let Some(template) = self.template {
            config.template = template;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(location) = self.location {
            config.location = location;
        }
        if let Some(size) = self.summary_chunk_size {
            config.summary_chunk_size = size;
        }
        if let Some(size) = self.chunk_size {
            config.chunk_size = size;
        }
        if let Some(size) = self.teach_chunk_size {
            config.teach_chunk_size = size;
        }
        if let Some(size) = self.plan_chunk_size {
            config.plan_chunk_size = size;
        }
        if let Some(cap) = self.learnings_cap {
            config.learnings_cap = cap;
        }
        if let Some(cap) = self.insights_cap {
            config.insights_cap = cap;
        }
        config
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("reading {}", label))?;
    Ok(line.trim().to_string())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut cli = Cli::parse();
    let from = match cli.from.take() {
        Some(from) => from,
        None => prompt("Start date (YYYY-MM-DD)")?,
    };
    let to = match cli.to.take() {
        Some(to) => to,
        None => prompt("End date (YYYY-MM-DD)")?,
    };
    let range = DateRange::parse(&from, &to)?;
    let config = cli.apply(ReportConfig::from_env());

    let summary = generate(&config, || SqliteSource::open(&config.db), &range).with_context(|| {
        format!(
            "generating report from template {} and database {}",
            config.template.display(),
            config.db.display()
        )
    })?;

    println!(
        "Wrote {} ({} project slide(s), {} plan slide(s), seed {})",
        summary.output.display(),
        summary.project_slides,
        summary.plan_slides,
        summary.seed
    );
    Ok(())
}
