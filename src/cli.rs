use clap::{Parser, Subcommand};
use nu_plugin_survey::algo::oracle::ProcessOracle;
use nu_plugin_survey::config::{self, SurveyConfig};
use nu_plugin_survey::dataset::Dataset;
use nu_plugin_survey::error::{Result, SurveyError};
use nu_plugin_survey::{io, ops};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Customer survey pipeline: normalize, score sentiment, cluster complaints"
)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct ClusterArgs {
    /// Clusters per service type
    #[arg(short = 'k', long)]
    clusters: Option<usize>,
    /// Max vocabulary size per service group
    #[arg(long)]
    max_vocab: Option<usize>,
    /// Random seed for k-means initialization
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline on a survey export
    Run {
        /// Raw survey CSV
        #[arg(short, long)]
        input: PathBuf,
        /// Clustered negative comments (CSV)
        #[arg(short, long)]
        output: PathBuf,
        /// Also write every row with region and sentiment (CSV)
        #[arg(long)]
        enriched: Option<PathBuf>,
        /// Write the aggregate report (JSON)
        #[arg(long)]
        report: Option<PathBuf>,
        /// Classifier program speaking JSON lines on stdin/stdout
        #[arg(long)]
        oracle: String,
        /// Argument passed to the classifier (repeatable)
        #[arg(long = "oracle-arg", allow_hyphen_values = true)]
        oracle_args: Vec<String>,
        #[command(flatten)]
        clustering: ClusterArgs,
    },
    /// Normalize column names and values of a CSV
    Normalize {
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Cluster negative comments of a CSV that already has a sentiment column
    Cluster {
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        clustering: ClusterArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            enriched,
            report,
            oracle,
            oracle_args,
            clustering,
        } => cmd_run(
            cli.config.as_deref(),
            &input,
            &output,
            enriched.as_deref(),
            report.as_deref(),
            &oracle,
            &oracle_args,
            clustering,
        ),
        Commands::Normalize { input, output } => {
            cmd_normalize(cli.config.as_deref(), &input, output.as_deref())
        }
        Commands::Cluster {
            input,
            output,
            clustering,
        } => cmd_cluster(cli.config.as_deref(), &input, output.as_deref(), clustering),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<&Path>, overrides: Option<ClusterArgs>) -> Result<SurveyConfig> {
    let mut config = config::resolve_config(path)?;
    if let Some(args) = overrides {
        if let Some(k) = args.clusters {
            config.clustering.n_clusters = k;
        }
        if let Some(v) = args.max_vocab {
            config.clustering.max_vocab = v;
        }
        if let Some(seed) = args.seed {
            config.clustering.seed = seed;
        }
    }
    config.validate()?;
    Ok(config)
}

fn write_table(ds: &Dataset, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => io::write_csv_path(ds, path),
        None => io::write_csv(ds, std::io::stdout().lock()),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    config_path: Option<&Path>,
    input: &Path,
    output: &Path,
    enriched: Option<&Path>,
    report: Option<&Path>,
    program: &str,
    args: &[String],
    clustering: ClusterArgs,
) -> Result<()> {
    let config = load(config_path, Some(clustering))?;
    let raw = io::read_csv_path(input)?;
    let mut oracle = ProcessOracle::spawn(program, args).map_err(|e| {
        SurveyError::Configuration(format!("cannot start classifier '{program}': {e}"))
    })?;

    let out = ops::op_run(raw, &mut oracle, &config)?;
    if !out.failures.is_empty() {
        tracing::warn!(failures = out.failures.len(), "some comments could not be scored");
    }

    io::write_csv_path(&out.clustered, output)?;
    if let Some(path) = enriched {
        io::write_csv_path(&out.enriched, path)?;
    }
    if let Some(path) = report {
        let summary = ops::op_report(&out, &config)?;
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
    }
    Ok(())
}

fn cmd_normalize(config_path: Option<&Path>, input: &Path, output: Option<&Path>) -> Result<()> {
    let config = load(config_path, None)?;
    let ds = ops::op_normalize(io::read_csv_path(input)?, &config)?;
    write_table(&ds, output)
}

fn cmd_cluster(
    config_path: Option<&Path>,
    input: &Path,
    output: Option<&Path>,
    clustering: ClusterArgs,
) -> Result<()> {
    let config = load(config_path, Some(clustering))?;
    let ds = ops::op_normalize(io::read_csv_path(input)?, &config)?;
    let (clustered, groups) = ops::op_cluster(&ds, &config)?;
    for group in &groups {
        tracing::info!(
            service = %group.service,
            rows = group.rows,
            clusters = group.clusters,
            fallback = ?group.fallback,
            "group"
        );
    }
    write_table(&clustered, output)
}
