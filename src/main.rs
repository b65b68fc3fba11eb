use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use cascade_core::{
    corpus::{CascadeReader, ContributionReader, TimeWindow},
    graph::{DisparityBackboneFilter, GraphMetrics},
    persistence::{self, RunMetadata},
    BackboneMethod, NetworkPipeline, NullModel, PipelineConfig, Timestamp,
};

#[derive(Parser, Debug)]
#[command(name = "cascade", about = "Cascade co-occurrence network and backbone CLI")]
struct Cli {
    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    /// Worker threads (defaults to one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the network, filter cascades and extract the backbone.
    Build(BuildArgs),

    /// Extract the backbone of an existing edge list.
    Backbone {
        /// Input edge list (CSV: source,target,weight)
        input: PathBuf,
        /// Output edge list of retained edges
        output: PathBuf,
        /// Per-edge scores (CSV)
        #[arg(long)]
        scores_out: Option<PathBuf>,
        #[command(flatten)]
        backbone: BackboneArgs,
    },

    /// Print summary metrics of an edge list.
    Inspect {
        /// Input edge list (CSV: source,target,weight)
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Cascade input (JSONL)
    #[arg(long)]
    cascades: PathBuf,
    /// Contribution counts input (JSONL)
    #[arg(long)]
    contributions: PathBuf,
    /// Filtered cascades output (JSONL)
    #[arg(long)]
    cascades_out: PathBuf,
    /// Giant-component edge list output (CSV)
    #[arg(long)]
    edges_out: PathBuf,
    /// Backbone edge list output (CSV)
    #[arg(long)]
    backbone_out: Option<PathBuf>,
    /// Per-edge backbone scores output (CSV)
    #[arg(long)]
    scores_out: Option<PathBuf>,
    /// Run metadata output (JSON)
    #[arg(long)]
    metadata_out: Option<PathBuf>,
    /// Path to config file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Minimum cascade appearances for an author to be eligible
    #[arg(long)]
    min_cascade_count: Option<usize>,
    /// Minimum qualifying subreddits per author
    #[arg(long)]
    min_subreddits: Option<usize>,
    /// Subreddits that never contribute to edge weight
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    exclude_subreddits: Vec<String>,
    /// First contribution year considered
    #[arg(long)]
    year_start: Option<i32>,
    /// Last contribution year considered
    #[arg(long)]
    year_end: Option<i32>,
    /// Skip subreddits with more qualifying authors than this
    #[arg(long)]
    max_bucket_size: Option<usize>,
    /// Drop cascade actions before this UTC date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,
    /// Drop cascade actions after this UTC date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
    #[command(flatten)]
    backbone: BackboneArgs,
}

#[derive(Args, Debug)]
struct BackboneArgs {
    /// Significance level in (0, 1)
    #[arg(long)]
    alpha: Option<f64>,
    /// noise-corrected or disparity
    #[arg(long)]
    method: Option<BackboneMethod>,
    /// binomial or hypergeometric
    #[arg(long)]
    null_model: Option<NullModel>,
}

impl BackboneArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(alpha) = self.alpha {
            config.backbone.alpha = alpha;
        }
        if let Some(method) = self.method {
            config.backbone.method = method;
        }
        if let Some(null_model) = self.null_model {
            config.backbone.null_model = null_model;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    match cli.command {
        Commands::Build(args) => cmd_build(args)?,
        Commands::Backbone {
            input,
            output,
            scores_out,
            backbone,
        } => cmd_backbone(&input, &output, scores_out.as_deref(), &backbone)?,
        Commands::Inspect { input } => cmd_inspect(&input)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            Ok(serde_json::from_str(&s)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Epoch seconds of the first (`end_of_day == false`) or last second of a
/// UTC calendar date.
fn parse_date(s: &str, end_of_day: bool) -> anyhow::Result<Timestamp> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    match time {
        Some(t) => Ok(t.and_utc().timestamp()),
        None => bail!("Invalid date '{s}'"),
    }
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    // 1) Config: file, then flag overrides
    let mut config = load_config(args.config.as_deref())?;
    if let Some(n) = args.min_cascade_count {
        config.min_cascade_count = n;
    }
    if let Some(n) = args.min_subreddits {
        config.graph.min_subreddits = n;
    }
    config
        .graph
        .excluded_subreddits
        .extend(args.exclude_subreddits.iter().cloned());
    if args.year_start.is_some() {
        config.graph.year_start = args.year_start;
    }
    if args.year_end.is_some() {
        config.graph.year_end = args.year_end;
    }
    if args.max_bucket_size.is_some() {
        config.graph.max_bucket_size = args.max_bucket_size;
    }
    args.backbone.apply(&mut config);

    let window = TimeWindow::new(
        args.start_date.as_deref().map(|s| parse_date(s, false)).transpose()?,
        args.end_date.as_deref().map(|s| parse_date(s, true)).transpose()?,
    );
    if let (Some(start), Some(end)) = (window.start, window.end) {
        if start > end {
            bail!("start date is after end date");
        }
    }

    let pipeline = NetworkPipeline::new(config)?;
    tracing::info!("using config: {:?}", pipeline.config());

    // 2) Run
    let cascades = CascadeReader::new(&args.cascades).with_window(window);
    let contributions = ContributionReader::new(&args.contributions);
    let output = pipeline.run_files(&cascades, &contributions)?;

    // 3) Write outputs
    persistence::write_cascades(&args.cascades_out, &output.cascades)?;
    persistence::write_edge_list(&args.edges_out, &output.giant)?;
    if let Some(path) = &args.backbone_out {
        persistence::write_edge_list(path, &output.backbone.graph)?;
    }
    if let Some(path) = &args.scores_out {
        persistence::write_scores(path, &output.backbone.records(&output.giant))?;
    }

    let giant = GraphMetrics::compute(&output.giant);
    let backbone = GraphMetrics::compute(&output.backbone.graph);
    if let Some(path) = &args.metadata_out {
        RunMetadata::new(pipeline.config(), &output.stats, giant.clone(), backbone.clone())
            .save(path)?;
    }

    println!(
        "Giant component: {} users, {} edges; backbone: {} users, {} edges; cascades kept: {} of {}",
        giant.num_nodes,
        giant.num_edges,
        backbone.num_nodes,
        backbone.num_edges,
        output.stats.cascades_out,
        output.stats.cascades_in
    );

    Ok(())
}

/// Default config with flag overrides, rejected before any input is read.
fn backbone_config(args: &BackboneArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::default();
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn cmd_backbone(
    input: &Path,
    output: &Path,
    scores_out: Option<&Path>,
    args: &BackboneArgs,
) -> anyhow::Result<()> {
    let config = backbone_config(args)?;
    let filter = DisparityBackboneFilter::new(config.backbone.clone())?;

    let (graph, report) = persistence::read_edge_list(input)?;
    report.check(&input.display().to_string(), config.max_skip_rate)?;

    let backbone = filter.extract(&graph)?;

    persistence::write_edge_list(output, &backbone.graph)?;
    if let Some(path) = scores_out {
        persistence::write_scores(path, &backbone.records(&graph))?;
    }

    println!(
        "Backbone: kept {} of {} edges ({} zero-variance)",
        backbone.graph.edge_count(),
        graph.edge_count(),
        backbone.zero_variance
    );
    Ok(())
}

fn cmd_inspect(input: &Path) -> anyhow::Result<()> {
    let (graph, report) = persistence::read_edge_list(input)?;
    let metrics = GraphMetrics::compute(&graph);

    println!("{}", serde_json::to_string_pretty(&metrics)?);
    if report.skipped > 0 {
        println!("skipped rows: {} of {}", report.skipped, report.records);
    }
    Ok(())
}
