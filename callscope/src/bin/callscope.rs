use anyhow::{bail, Context};
use callscope::analysis::{self, AnalyzeRequest};
use callscope::config::AnalyzerConfig;
use callscope::export;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::sync::Once;

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "callscope", version, about = "Reconstruct a call from softswitch signaling logs")]
struct Cli {
    /// Log files (`-` for stdin). Each file is analysed on its own.
    #[arg(required = false)]
    input: Vec<String>,

    /// Caller number, normalized before matching
    #[arg(long)]
    caller: Option<String>,
    #[arg(long)]
    callee: Option<String>,
    #[arg(long = "caller-imsi")]
    caller_imsi: Option<String>,
    #[arg(long = "callee-imsi")]
    callee_imsi: Option<String>,

    /// Feature flags: +sdp | +pgw | +routing | +full. May be repeated.
    #[arg(long = "flag", allow_hyphen_values = true)]
    flags: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// TOML file overriding the analyzer defaults
    #[arg(long)]
    config: Option<String>,

    /// JSON request body ({"log": ..., "caller": ..., "flags": [...]}); `-` reads stdin
    #[arg(long, conflicts_with = "input")]
    request: Option<String>,

    /// Log filter directive, e.g. `debug` or `callscope=trace` (overrides RUST_LOG)
    #[arg(long = "log-level")]
    log_level: Option<String>,
    /// Emit logs as JSON lines on stderr
    #[arg(long = "log-json", default_value_t = false)]
    log_json: bool,
}

fn init_tracing(level: Option<&str>, json: bool) -> anyhow::Result<()> {
    let env_filter = match level {
        Some(l) => tracing_subscriber::EnvFilter::try_new(l).with_context(|| format!("bad --log-level {l:?}"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(io::stderr);
    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.with_target(true).init();
    }
    Ok(())
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s).context("reading stdin")?;
        Ok(s)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
    }
}

fn build_requests(cli: &Cli) -> anyhow::Result<Vec<AnalyzeRequest>> {
    if let Some(req) = &cli.request {
        let body = if req == "-" { read_source("-")? } else { req.clone() };
        let parsed: AnalyzeRequest = serde_json::from_str(&body).context("parsing --request")?;
        return Ok(vec![parsed]);
    }
    if cli.input.is_empty() {
        bail!("no input: pass log files, `-` for stdin, or --request");
    }
    cli.input
        .iter()
        .map(|path| {
            Ok(AnalyzeRequest {
                log: read_source(path)?,
                caller: cli.caller.clone(),
                callee: cli.callee.clone(),
                caller_imsi: cli.caller_imsi.clone(),
                callee_imsi: cli.callee_imsi.clone(),
                flags: cli.flags.clone(),
            })
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref(), cli.log_json)?;
    init_parallelism();

    let config = match &cli.config {
        Some(path) => AnalyzerConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => AnalyzerConfig::default(),
    };
    tracing::debug!(?config, "analyzer config");

    let requests = build_requests(&cli)?;
    tracing::info!(logs = requests.len(), "analysing");
    let results = analysis::analyze_many(&requests, &config);

    match cli.format {
        Format::Json if results.len() == 1 => println!("{}", serde_json::to_string_pretty(&results[0])?),
        Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        Format::Csv => {
            for r in &results {
                print!("{}", export::to_csv(r)?);
            }
        }
    }
    Ok(())
}
