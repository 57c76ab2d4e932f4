use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use crispr_rust::crispr::{
    self, InputMode, RepeatRecord, ScanParams, SequenceReport,
};

#[derive(Parser, Debug)]
#[command(name = "crispr")]
#[command(about = "Find CRISPR repeat arrays in FASTA sequences", long_about = None)]
#[command(version)]
struct Cli {
    /// Input FASTA file (plain or gzip)
    #[arg(short, long, value_name = "FASTA")]
    input: PathBuf,

    /// Output file (default: stdout; required for parquet)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// How the input is read
    #[arg(short, long, value_enum, default_value_t = ModeArg::Mmap)]
    mode: ModeArg,

    /// JSON file with scan parameters; missing fields keep their defaults
    #[arg(short, long, value_name = "JSON")]
    config: Option<PathBuf>,

    // ===== Scan parameters (override --config) =====
    /// Minimum number of repeats in an array
    #[arg(long, value_name = "INT")]
    min_repeats: Option<usize>,

    /// Minimum repeat length
    #[arg(long, value_name = "INT")]
    min_repeat_length: Option<usize>,

    /// Maximum repeat length
    #[arg(long, value_name = "INT")]
    max_repeat_length: Option<usize>,

    /// Length of the exact seed window
    #[arg(long, value_name = "INT")]
    search_window: Option<usize>,

    /// Minimum spacer length
    #[arg(long, value_name = "INT")]
    min_spacer_length: Option<usize>,

    /// Maximum spacer length
    #[arg(long, value_name = "INT")]
    max_spacer_length: Option<usize>,

    /// Spacers more similar than this are rejected
    #[arg(long, value_name = "FLOAT")]
    spacer_similarity: Option<f64>,

    /// Allowed spacer length spread within an array
    #[arg(long, value_name = "INT")]
    spacer_length_diff: Option<usize>,

    /// Allowed length difference between each spacer and the repeat
    #[arg(long, value_name = "INT")]
    spacer_repeat_length_diff: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
    Parquet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Mmap,
    Stream,
}

impl From<ModeArg> for InputMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Mmap => InputMode::Mmap,
            ModeArg::Stream => InputMode::Stream,
        }
    }
}

impl Cli {
    fn scan_params(&self) -> Result<ScanParams> {
        let mut params = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str::<ScanParams>(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => ScanParams::default(),
        };
        if let Some(value) = self.min_repeats {
            params.min_number_repeats = value;
        }
        if let Some(value) = self.min_repeat_length {
            params.min_repeat_length = value;
        }
        if let Some(value) = self.max_repeat_length {
            params.max_repeat_length = value;
        }
        if let Some(value) = self.search_window {
            params.search_window_length = value;
        }
        if let Some(value) = self.min_spacer_length {
            params.min_spacer_length = value;
        }
        if let Some(value) = self.max_spacer_length {
            params.max_spacer_length = value;
        }
        if let Some(value) = self.spacer_similarity {
            params.spacer_to_spacer_max_similarity = value;
        }
        if let Some(value) = self.spacer_length_diff {
            params.spacer_to_spacer_length_diff = value;
        }
        if let Some(value) = self.spacer_repeat_length_diff {
            params.spacer_to_repeat_length_diff = value;
        }
        params.validate().context("invalid scan parameters")?;
        Ok(params)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(err) = run(Cli::parse()) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let params = cli.scan_params()?;
    if cli.format == OutputFormat::Parquet && cli.output.is_none() {
        bail!("--output is required when --format parquet");
    }

    let reports = scan_file(&cli.input, cli.mode.into(), params)?;
    if reports.is_empty() {
        bail!("no sequences found in {}", cli.input.display());
    }
    let total: usize = reports.iter().map(|report| report.arrays.len()).sum();
    info!(
        "{} sequences scanned, {total} CRISPR arrays found",
        reports.len()
    );

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_reports(&reports, cli.format, BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => write_reports(&reports, cli.format, io::stdout().lock())
            .context("failed to write to stdout"),
    }
}

fn scan_file(path: &Path, mode: InputMode, params: ScanParams) -> Result<Vec<SequenceReport>> {
    let mut reports = Vec::new();
    match mode {
        InputMode::Mmap => {
            let sequences = crispr::load_sequences_from_path(path, InputMode::Mmap)
                .with_context(|| format!("failed to read {}", path.display()))?;
            for sequence in &sequences {
                let arrays = crispr::stream::scan_record(sequence, params);
                reports.push(SequenceReport::new(sequence, &arrays));
            }
        }
        InputMode::Stream => {
            crispr::stream::process_fasta_stream_with_params(path, params, |sequence, arrays| {
                reports.push(SequenceReport::new(sequence, arrays));
                Ok(())
            })
            .with_context(|| format!("failed to stream {}", path.display()))?;
        }
    }
    if reports.iter().all(|report| report.arrays.is_empty()) {
        warn!("no CRISPR arrays found in {}", path.display());
    }
    Ok(reports)
}

fn write_reports<W: Write>(
    reports: &[SequenceReport],
    format: OutputFormat,
    mut writer: W,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for report in reports {
                writer.write_all(report.render_text().as_bytes())?;
            }
            writer.flush()?;
        }
        OutputFormat::Csv => {
            crispr::write_csv_records(reports.iter().flat_map(SequenceReport::records), writer)?;
        }
        OutputFormat::Json => crispr::write_json_reports(reports, writer)?,
        OutputFormat::Parquet => {
            let records: Vec<&RepeatRecord> =
                reports.iter().flat_map(SequenceReport::records).collect();
            let mut buffer = Vec::new();
            crispr::write_parquet_records(&records, &mut buffer)?;
            writer.write_all(&buffer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
