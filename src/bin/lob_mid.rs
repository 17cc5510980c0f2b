//! CLI: LOB dumps to chart-ready mid-price series.
//!
//! # Usage
//!
//! ```bash
//! # One file, series to stdout
//! lob_mid --depth 5 data/Si-3.20.2020-03-17.json.zst > mid.csv
//!
//! # Many files in parallel, one output per input
//! lob_mid -d 10 -f json -o out/ data/*.json.zst
//!
//! # Paths from stdin
//! find data -name '*.zst' | lob_mid -o out/
//! ```
//!
//! Exits with status 1 if any input fails.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lob_midprice::{DumpReconstructor, LobError, Pipeline, PipelineConfig, Result, SeriesFormat};

#[derive(Parser, Debug)]
#[command(name = "lob_mid")]
#[command(version, about = "Derive mid-price series from LOB snapshot matrices")]
struct Cli {
    /// Input files; read newline-separated paths from stdin when omitted
    inputs: Vec<PathBuf>,

    /// Levels per side to request from the reconstruction
    #[arg(short, long)]
    depth: Option<usize>,

    /// Output directory (default: stdout, single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: csv, json
    #[arg(short, long)]
    format: Option<SeriesFormat>,

    /// Worker threads for multi-file runs
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_json(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(dir) = &self.output {
            config.output_dir = Some(std::fs::canonicalize(dir).map_err(|e| {
                LobError::Config(format!("output path {} not reachable: {e}", dir.display()))
            })?);
        }
        if let Some(threads) = self.threads {
            config.threads = Some(threads);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Positional inputs, or newline-separated paths from `stdin` when there are none.
fn collect_inputs<R: BufRead>(positional: &[PathBuf], stdin: R) -> Result<Vec<PathBuf>> {
    if !positional.is_empty() {
        return Ok(positional.to_vec());
    }

    let mut inputs = Vec::new();
    for line in stdin.lines() {
        let line = line.map_err(|e| LobError::io("<stdin>", e))?;
        let line = line.trim();
        if !line.is_empty() {
            inputs.push(PathBuf::from(line));
        }
    }
    Ok(inputs)
}

/// Run the CLI. `Ok(false)` when at least one input failed.
fn run<R: BufRead, W: Write>(cli: Cli, stdin: R, stdout: W) -> Result<bool> {
    let config = cli.pipeline_config()?;

    let inputs = collect_inputs(&cli.inputs, stdin)?
        .into_iter()
        .map(|path| config.validate_input(path))
        .collect::<Result<Vec<_>>>()?;

    if inputs.is_empty() {
        log::warn!("No inputs given");
        return Ok(true);
    }

    let pipeline = Pipeline::new(DumpReconstructor::new(), config);

    if pipeline.config().output_dir.is_none() {
        let [input] = inputs.as_slice() else {
            return Err(LobError::Config(format!(
                "{} inputs need an output directory (--output)",
                inputs.len()
            )));
        };
        let output = pipeline.run(input)?;
        pipeline.render(&output, stdout)?;
        return Ok(true);
    }

    let report = pipeline.run_batch(inputs)?;
    for (input, stat) in report.succeeded() {
        log::info!(
            "{} -> {} ({} rows)",
            input.display(),
            stat.output
                .as_deref()
                .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            stat.rows
        );
    }

    let combined = report.combined_mid_price();
    log::info!(
        "Done: {} ok, {} failed, {} mid-prices (mean {:.4})",
        report.succeeded().count(),
        report.failed().count(),
        combined.count,
        combined.mean
    );

    Ok(report.is_success())
}

fn exit_code(outcome: Result<bool>) -> ExitCode {
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    exit_code(run(
        Cli::parse(),
        std::io::stdin().lock(),
        std::io::stdout().lock(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use lob_midprice::{write_dump, LobMatrix};

    fn scenario() -> LobMatrix {
        LobMatrix::from_rows(
            1,
            vec![
                vec![0, 10, 5, 12, 5],
                vec![1, 10, 5, 13, 5],
                vec![2, 11, 5, 12, 5],
            ],
        )
        .unwrap()
    }

    fn dump(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        write_dump(&path, &scenario()).unwrap();
        path
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lob_mid").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_inputs_from_stdin_when_no_positional() {
        let stdin = "data/a.json\n\n  data/b.json  \n".as_bytes();
        assert_eq!(
            collect_inputs(&[], stdin).unwrap(),
            vec![PathBuf::from("data/a.json"), PathBuf::from("data/b.json")]
        );

        let positional = [PathBuf::from("c.json")];
        assert_eq!(
            collect_inputs(&positional, "ignored.json\n".as_bytes()).unwrap(),
            positional.to_vec()
        );
    }

    #[test]
    fn test_single_input_renders_to_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let input = dump(dir.path(), "SBER.json");

        let mut stdout = Vec::new();
        let ok = run(
            cli(&["-d", "1", input.to_str().unwrap()]),
            std::io::empty(),
            &mut stdout,
        )
        .unwrap();

        assert!(ok);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "timestamp,mid_price\n0,11.0\n1,11.5\n2,11.5\n"
        );
    }

    #[test]
    fn test_stdin_inputs_are_processed() {
        let dir = tempfile::tempdir().unwrap();
        let input = dump(dir.path(), "SBER.json");
        let stdin = format!("{}\n", input.display());

        let mut stdout = Vec::new();
        assert!(run(cli(&["-d", "1", "-f", "json"]), stdin.as_bytes(), &mut stdout).unwrap());
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            "{\"timestamps\":[0,1,2],\"mid_price\":[11.0,11.5,11.5]}\n"
        );
    }

    #[test]
    fn test_several_inputs_need_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let a = dump(dir.path(), "a.json");
        let b = dump(dir.path(), "b.json");

        let mut stdout = Vec::new();
        let err = run(
            cli(&["-d", "1", a.to_str().unwrap(), b.to_str().unwrap()]),
            std::io::empty(),
            &mut stdout,
        )
        .unwrap_err();

        assert!(matches!(err, LobError::Config(msg) if msg.contains("--output")));
        assert!(stdout.is_empty());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        PipelineConfig::new(3)
            .with_format(SeriesFormat::Json)
            .with_threads(4)
            .save_json(&config_path)
            .unwrap();
        let config_arg = config_path.to_str().unwrap();

        let from_file = cli(&["-c", config_arg]).pipeline_config().unwrap();
        assert_eq!(from_file.depth, 3);
        assert_eq!(from_file.format, SeriesFormat::Json);

        let out_dir = dir.path().to_str().unwrap();
        let merged = cli(&["-c", config_arg, "-d", "1", "-f", "csv", "-j", "2", "-o", out_dir])
            .pipeline_config()
            .unwrap();
        assert_eq!(merged.depth, 1);
        assert_eq!(merged.format, SeriesFormat::Csv);
        assert_eq!(merged.threads, Some(2));
        assert_eq!(
            merged.output_dir,
            Some(std::fs::canonicalize(dir.path()).unwrap())
        );
    }

    #[test]
    fn test_failed_input_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let good = dump(dir.path(), "good.json");
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "not a dump").unwrap();

        let outcome = run(
            cli(&[
                "-d",
                "1",
                "-o",
                out.path().to_str().unwrap(),
                good.to_str().unwrap(),
                broken.to_str().unwrap(),
            ]),
            std::io::empty(),
            std::io::sink(),
        );

        assert_eq!(outcome, Ok(false));
        assert!(out.path().join("good.mid.csv").exists());
        assert_eq!(exit_code(outcome), ExitCode::FAILURE);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Ok(true)), ExitCode::SUCCESS);
        assert_eq!(exit_code(Ok(false)), ExitCode::FAILURE);
        let missing = PathBuf::from("/nonexistent/a.json");
        assert_eq!(exit_code(Err(LobError::FileNotFound(missing))), ExitCode::FAILURE);
    }
}
