use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rdf-extractor",
    version,
    about = "Extract embedded RDF metadata from a CellML model"
)]
struct Args {
    /// CellML document to process
    #[arg(value_name = "INPUT")]
    input: String,
    /// Any value: overwrite INPUT with the cleaned model instead of printing it;
    /// further arguments are ignored
    #[arg(
        value_name = "OVERWRITE",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    overwrite: Vec<String>,
}

const USAGE_FAILURE: u8 = 1;
const PROCESSING_FAILURE: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(USAGE_FAILURE),
            };
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(PROCESSING_FAILURE)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let input = Path::new(&args.input);
    let extraction = cellml_rdf::extract(input)
        .with_context(|| format!("failed to process {}", input.display()))?;
    let rdf = extraction
        .rdf_document()
        .context("failed to build the rdf document")?;

    if !args.overwrite.is_empty() {
        std::fs::write(input, &extraction.cleaned_model)
            .with_context(|| format!("failed to overwrite {}", input.display()))?;
        debug!(path = %input.display(), "overwrote model");
    } else {
        write_stdout(&extraction.cleaned_model)?;
    }

    match rdf_output_path(&args.input) {
        Some(path) => {
            std::fs::write(&path, rdf)
                .with_context(|| format!("failed to write rdf file {}", path.display()))?;
            debug!(path = %path.display(), "wrote rdf");
        }
        None => write_stdout(&rdf)?,
    }
    Ok(())
}

/// `<input>.rdf`, or `None` when that name would be the bare `.rdf`
fn rdf_output_path(input: &str) -> Option<PathBuf> {
    let name = format!("{input}.rdf");
    (name != ".rdf").then(|| PathBuf::from(name))
}

fn write_stdout(data: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(data.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write stdout")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdf_output_path() {
        assert_eq!(
            rdf_output_path("models/a.cellml"),
            Some(PathBuf::from("models/a.cellml.rdf"))
        );
        assert_eq!(rdf_output_path(""), None);
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["rdf-extractor", "a.cellml", "yes"]);
        assert!(args.is_ok_and(|args| args.input == "a.cellml" && !args.overwrite.is_empty()));
        let args = Args::try_parse_from(["rdf-extractor", "a.cellml"]);
        assert!(args.is_ok_and(|args| args.overwrite.is_empty()));
        assert!(Args::try_parse_from(["rdf-extractor"]).is_err());
    }

    #[test]
    fn test_overwrite_accepts_any_value() {
        for extra in [&["-y"][..], &["--force"], &["yes", "extra"], &["-", "-x", "y"]] {
            let argv = ["rdf-extractor", "a.cellml"].iter().chain(extra);
            let args = Args::try_parse_from(argv);
            assert!(
                args.is_ok_and(|args| args.input == "a.cellml" && !args.overwrite.is_empty()),
                "{extra:?}"
            );
        }
    }
}
