use clap::{Parser, ValueEnum};
use pbmgrep::{
    scan, FeatureSet, Match, PbmGrepError, PbmReader, ScanConfig, ScanOutcome, MAX_WIDTH,
};
use serde::Serialize;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_NO_MATCH: u8 = 0;
const EXIT_MATCH: u8 = 1;
const EXIT_TOO_WIDE: u8 = 2;
const EXIT_FAILURE: u8 = 3;
const EXIT_USAGE: u8 = 64;

#[derive(Parser, Debug)]
#[command(
    name = "pbmgrep",
    author,
    version,
    about = "Report the first place a PBM image contains one of the given features"
)]
struct Cli {
    /// Feature bitmaps to search for (PBM, or any format the image crate reads).
    #[arg(value_name = "FEATURE", required = true)]
    features: Vec<PathBuf>,
    /// Read the image from FILE instead of standard input.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// Reject images wider than this many pixels.
    #[arg(long, value_name = "PIXELS", default_value_t = MAX_WIDTH)]
    max_width: usize,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,
    /// Enable tracing output on stderr.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Tsv,
    Json,
}

#[derive(Debug, Serialize)]
struct MatchRecord<'a> {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    feature: &'a str,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                EXIT_USAGE
            } else {
                EXIT_NO_MATCH
            };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    if cli.trace {
        if let Err(err) = init_tracing() {
            eprintln!("pbmgrep: {err}");
            return ExitCode::from(EXIT_USAGE);
        }
    }

    let stdout = io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(outcome) => ExitCode::from(outcome_code(&outcome)),
        Err(err) => {
            eprintln!("pbmgrep: {err}");
            ExitCode::from(error_code(err.as_ref()))
        }
    }
}

fn init_tracing() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pbmgrep=info".parse()?))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<ScanOutcome, Box<dyn Error>> {
    let features = FeatureSet::load(&cli.features)?;
    tracing::info!(
        features = features.len(),
        cycle_rows = features.cycle_rows(),
        "features loaded"
    );

    let cfg = ScanConfig {
        max_width: cli.max_width,
    };
    let outcome = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| format!("cannot open {}: {err}", path.display()))?;
            scan_stream(BufReader::new(file), &features, &cfg)?
        }
        None => scan_stream(io::stdin().lock(), &features, &cfg)?,
    };

    if let ScanOutcome::Found(found) = outcome {
        write_report(out, &found, &features, cli.format)?;
    }
    Ok(outcome)
}

fn scan_stream<R: BufRead>(
    reader: R,
    features: &FeatureSet,
    cfg: &ScanConfig,
) -> Result<ScanOutcome, PbmGrepError> {
    let mut pbm = PbmReader::new(reader)?;
    scan(features, &mut pbm, cfg)
}

fn write_report<W: Write>(
    out: &mut W,
    found: &Match,
    features: &FeatureSet,
    format: OutputFormat,
) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Tsv => writeln!(out, "{}", found.to_tsv(features))?,
        OutputFormat::Json => {
            let record = MatchRecord {
                x: found.x,
                y: found.y,
                width: found.width,
                height: found.height,
                feature: features.get(found.feature).map_or("", |f| f.label()),
            };
            writeln!(out, "{}", serde_json::to_string(&record)?)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn outcome_code(outcome: &ScanOutcome) -> u8 {
    match outcome {
        ScanOutcome::Found(_) => EXIT_MATCH,
        ScanOutcome::Exhausted { .. } => EXIT_NO_MATCH,
    }
}

fn error_code(err: &(dyn Error + 'static)) -> u8 {
    match err.downcast_ref::<PbmGrepError>() {
        Some(PbmGrepError::StreamTooWide { .. }) => EXIT_TOO_WIDE,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_plain_pbm(dir: &Path, name: &str, width: usize, rows: &[Vec<u8>]) -> PathBuf {
        let mut text = format!("P1\n{width} {}\n", rows.len());
        for row in rows {
            let line: Vec<String> = row.iter().map(|b| b.to_string()).collect();
            text.push_str(&line.join(" "));
            text.push('\n');
        }
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn cli_for(features: Vec<PathBuf>, input: PathBuf, format: OutputFormat) -> Cli {
        Cli {
            features,
            input: Some(input),
            max_width: MAX_WIDTH,
            format,
            trace: false,
        }
    }

    /// 128x20 white image with a 32x2 black block at (64, 10).
    fn sample_files(dir: &TempDir) -> (PathBuf, PathBuf) {
        let feature = write_plain_pbm(dir.path(), "bar.pbm", 32, &[vec![1; 32], vec![1; 32]]);
        let mut rows = vec![vec![0u8; 128]; 20];
        for row in &mut rows[10..12] {
            row[64..96].fill(1);
        }
        let image = write_plain_pbm(dir.path(), "image.pbm", 128, &rows);
        (feature, image)
    }

    #[test]
    fn reports_tsv_match_with_legacy_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let (feature, image) = sample_files(&dir);
        let cli = cli_for(vec![feature.clone()], image, OutputFormat::Tsv);

        let mut out = Vec::new();
        let outcome = run(&cli, &mut out).unwrap();
        assert_eq!(outcome_code(&outcome), EXIT_MATCH);
        let expected = format!("64\t10\t32\t2\t{}\n", feature.display());
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn reports_json_match() {
        let dir = tempfile::tempdir().unwrap();
        let (feature, image) = sample_files(&dir);
        let cli = cli_for(vec![feature], image, OutputFormat::Json);

        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["x"], 64);
        assert_eq!(value["y"], 10);
        assert_eq!(value["width"], 32);
        assert_eq!(value["height"], 2);
    }

    #[test]
    fn no_match_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (feature, _) = sample_files(&dir);
        let blank = write_plain_pbm(dir.path(), "blank.pbm", 128, &vec![vec![0u8; 128]; 4]);
        let cli = cli_for(vec![feature], blank, OutputFormat::Tsv);

        let mut out = Vec::new();
        let outcome = run(&cli, &mut out).unwrap();
        assert_eq!(outcome, ScanOutcome::Exhausted { rows: 4 });
        assert_eq!(outcome_code(&outcome), EXIT_NO_MATCH);
        assert!(out.is_empty());
    }

    #[test]
    fn too_wide_maps_to_its_own_code() {
        let dir = tempfile::tempdir().unwrap();
        let (feature, image) = sample_files(&dir);
        let mut cli = cli_for(vec![feature], image, OutputFormat::Tsv);
        cli.max_width = 64;

        let err = run(&cli, &mut Vec::new()).unwrap_err();
        assert_eq!(error_code(err.as_ref()), EXIT_TOO_WIDE);
        assert_eq!(err.to_string(), "image is too wide (128 > 64 pixels)");
    }

    #[test]
    fn oversized_raw_header_exits_too_wide() {
        let dir = tempfile::tempdir().unwrap();
        let (feature, _) = sample_files(&dir);
        let huge = dir.path().join("huge.pbm");
        std::fs::write(&huge, b"P4\n1000000000000000000 1\n\x00").unwrap();
        let cli = cli_for(vec![feature], huge, OutputFormat::Tsv);

        let err = run(&cli, &mut Vec::new()).unwrap_err();
        assert_eq!(error_code(err.as_ref()), EXIT_TOO_WIDE);
    }

    #[test]
    fn missing_feature_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (_, image) = sample_files(&dir);
        let cli = cli_for(vec![dir.path().join("absent.pbm")], image, OutputFormat::Tsv);

        let err = run(&cli, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PbmGrepError>(),
            Some(PbmGrepError::Load { .. })
        ));
        assert_eq!(error_code(err.as_ref()), EXIT_FAILURE);
    }

    #[test]
    fn usage_errors_are_distinct_from_matches() {
        let err = Cli::try_parse_from(["pbmgrep"]).unwrap_err();
        assert!(err.use_stderr());
        assert_ne!(EXIT_USAGE, EXIT_MATCH);

        let cli = Cli::try_parse_from(["pbmgrep", "--format", "json", "a.pbm", "b.pbm"]).unwrap();
        assert_eq!(cli.features.len(), 2);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.max_width, MAX_WIDTH);
    }
}
