//! Command-line interface for `jsondiff`.
//!
//! Reads two JSON (or YAML) files, optionally narrows or masks them with a
//! jq query, and prints their unified diff. Flags use the single-dash long
//! form (`-only`, `-exit-code`); double-dash spellings are accepted too.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use jsondiff_core::{diff, DiffError, DiffOptions, Format, IgnoreStrategy, Input, Query, Side};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");
const VERSION_BANNER: &str = concat!("jsondiff version ", env!("CARGO_PKG_VERSION"));

const CODE_OK: i32 = 0;
const CODE_HAVE_DIFFERENCES: i32 = 1;
const CODE_ERROR: i32 = 2;

const LOG_ENV: &str = "JSONDIFF_LOG";

const HELP_TEMPLATE: &str = r#"Usage: jsondiff [OPTION]... FILE1 FILE2
Print the differences between two JSON files as a unified diff.

Options:
  -only=QUERY             Compare only the structure selected by the jq QUERY.
  -ignore=QUERY           Ignore the structures selected by the jq QUERY.
  -ignore-strategy=MODE   How ignored structures are masked: "delete" (default)
                          removes them, "null" replaces them with null.
  -exit-code              Exit with 1 if there were differences, 0 otherwise.
  -yaml                   Read YAML instead of JSON.
  -o=FILE                 Write to FILE instead of STDOUT.
  -log-format=FORMAT      Diagnostics on STDERR as "text" (default) or "json".
                          The level is read from JSONDIFF_LOG (default "warn").

Examples:
  jsondiff from.json to.json
  jsondiff -only .d from.json to.json
  jsondiff -ignore '.updated_at, .etag' -exit-code from.json to.json

Version: {version}
"#;

/// Long flags that may be spelled with a single dash.
const LONG_FLAGS: &[&str] =
    &["help", "version", "only", "ignore", "ignore-strategy", "exit-code", "yaml", "log-format"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum StrategyArg {
    Delete,
    Null,
}

impl From<StrategyArg> for IgnoreStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Delete => Self::Delete,
            StrategyArg::Null => Self::Nullify,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "jsondiff",
    disable_help_flag = true,
    disable_help_subcommand = true,
    disable_version_flag = true,
    override_usage = "jsondiff [OPTION]... FILE1 FILE2"
)]
struct Cli {
    #[arg(long = "help", short = 'h', action = ArgAction::SetTrue, hide = true)]
    help: bool,

    #[arg(long = "version", action = ArgAction::SetTrue, hide = true)]
    version: bool,

    /// jq query pointing at the structure to compare.
    #[arg(long = "only", value_name = "QUERY")]
    only: Option<String>,

    /// jq query pointing at the structures to ignore.
    #[arg(long = "ignore", value_name = "QUERY")]
    ignore: Option<String>,

    /// How ignored structures are masked.
    #[arg(long = "ignore-strategy", value_enum, default_value = "delete")]
    ignore_strategy: StrategyArg,

    /// Exit with 1 when the files differ.
    #[arg(long = "exit-code", action = ArgAction::SetTrue)]
    exit_code: bool,

    /// Read YAML instead of JSON.
    #[arg(long = "yaml", action = ArgAction::SetTrue)]
    yaml: bool,

    /// Write output to FILE instead of STDOUT.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Diagnostics format on STDERR.
    #[arg(long = "log-format", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Positional inputs (FILE1 FILE2).
    #[arg()]
    inputs: Vec<OsString>,
}

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err:#}");
            std::process::exit(CODE_ERROR);
        }
    }
}

fn try_main() -> Result<i32> {
    let args = canonicalize_args(std::env::args_os());
    let cli = Cli::parse_from(args);

    if cli.help {
        print!("{}", help_text());
        return Ok(CODE_OK);
    }

    if cli.version {
        println!("{VERSION_BANNER}");
        return Ok(CODE_OK);
    }

    init_tracing(cli.log_format);
    run_diff(&cli)
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr);
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn run_diff(cli: &Cli) -> Result<i32> {
    let [from_path, to_path] = cli.inputs.as_slice() else {
        bail!("2 file paths must be passed");
    };
    let (from_path, to_path) = (Path::new(from_path), Path::new(to_path));

    let format = if cli.yaml { Format::Yaml } else { Format::Json };
    let from_text = read_input(from_path)?;
    let to_text = read_input(to_path)?;

    let options = build_options(cli)?;
    let from = decode_input(from_path, &from_text, format, Side::Left).context("cannot calculate diff")?;
    let to = decode_input(to_path, &to_text, format, Side::Right).context("cannot calculate diff")?;
    let rendered = diff(&from, &to, &options).context("cannot calculate diff")?;
    debug!(bytes = rendered.len(), "rendered diff");

    if let Some(path) = &cli.output {
        fs::write(path, rendered.as_bytes())
            .with_context(|| format!("failed to write output to {}", path.display()))?;
        info!(path = %path.display(), "wrote diff");
    } else {
        print!("{rendered}");
        io::stdout().flush().ok();
    }

    Ok(exit_code(cli.exit_code, &rendered))
}

fn exit_code(requested: bool, rendered: &str) -> i32 {
    if requested && !rendered.is_empty() {
        CODE_HAVE_DIFFERENCES
    } else {
        CODE_OK
    }
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("cannot read file {}", path.display()))
}

fn decode_input(path: &Path, text: &str, format: Format, side: Side) -> Result<Input, DiffError> {
    Input::from_text(path, text, format).map_err(|source| DiffError::Decode { side, source })
}

fn build_options(cli: &Cli) -> Result<DiffOptions> {
    let only = parse_query(cli.only.as_deref())?;
    let ignore = parse_query(cli.ignore.as_deref())?;
    // Conflicting queries are reported by the diff itself.
    DiffOptions::new(only, ignore)
        .with_ignore_strategy(cli.ignore_strategy.into())
        .map_err(|err| anyhow!(err))
}

fn parse_query(source: Option<&str>) -> Result<Option<Query>> {
    match source {
        None | Some("") => Ok(None),
        Some(source) => Query::parse(source)
            .map(Some)
            .map_err(|err| anyhow!("failed to parse query ({source}): {}", err.message())),
    }
}

fn canonicalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut canonicalized = Vec::new();
    for (idx, arg) in args.into_iter().enumerate() {
        if idx == 0 {
            canonicalized.push(arg);
            continue;
        }
        let rewritten = match arg.to_str() {
            Some("-h") => Some("--help".to_string()),
            Some(other) => single_dash_long_flag(other),
            None => None,
        };
        canonicalized.push(rewritten.map_or(arg, OsString::from));
    }
    canonicalized
}

/// `-only=.d` becomes `--only=.d`; anything that is not a known long flag is kept.
fn single_dash_long_flag(arg: &str) -> Option<String> {
    let flag = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    LONG_FLAGS.contains(&name).then(|| format!("-{arg}"))
}

fn help_text() -> String {
    HELP_TEMPLATE.replace("{version}", VERSION_NUMBER)
}
