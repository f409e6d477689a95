//! massoc - microbiome two-group association CLI
//!
//! Command-line interface for comparing feature abundances between two
//! metadata-defined cohorts.

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use microbiome_assoc::error::Result;
use microbiome_assoc::filter::FeatureFilter;
use microbiome_assoc::pipeline::{load_inputs, run_analysis, write_outputs, AnalysisConfig};
use microbiome_assoc::rank::{LabelPolicy, SignificanceMetric};
use std::path::{Path, PathBuf};

/// Volcano labeling mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLabelMode {
    /// Label features passing the significance and fold-change thresholds
    Threshold,
    /// Label the top N features by rank
    Top,
    /// Label nothing
    None,
}

/// Feature filter mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFilter {
    /// Keep every feature
    None,
    /// Keep features whose overall mean abundance is at least the threshold
    MinMean,
    /// Keep features present in at least a fraction of samples
    MinPrevalence,
}

/// Microbiome two-group association analysis
#[derive(Parser)]
#[command(name = "massoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare feature abundances between two groups
    Run(RunArgs),

    /// Write an example analysis configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "massoc.yaml")]
        output: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Path to the abundance table (SampleID + one column per feature)
    #[arg(short, long)]
    abundance: PathBuf,

    /// Path to the metadata table (SampleID + clinical fields)
    #[arg(short, long)]
    metadata: PathBuf,

    /// Output directory for results and plots
    #[arg(short, long, default_value = "results")]
    out: PathBuf,

    /// Optional YAML configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field delimiter, e.g. ',' or '\t' (default: ',')
    #[arg(long)]
    sep: Option<String>,

    /// Metadata column defining the groups (default: Severity)
    #[arg(long)]
    group_col: Option<String>,

    /// Baseline group value (default: Mild)
    #[arg(long)]
    group1: Option<String>,

    /// Group compared against the baseline (default: Severe)
    #[arg(long)]
    group2: Option<String>,

    /// How to label points on the volcano plot (default: threshold)
    #[arg(long, value_enum)]
    label_mode: Option<CliLabelMode>,

    /// Number of features labeled in top mode (default: 10)
    #[arg(long)]
    top_n: Option<usize>,

    /// Label by raw p-value instead of q-value in threshold mode
    #[arg(long)]
    use_p: bool,

    /// p-value threshold: volcano guide line, and label cutoff with --use-p (default: 0.05)
    #[arg(long)]
    p_thresh: Option<f64>,

    /// q-value label cutoff in threshold mode (default: 0.10)
    #[arg(long)]
    q_thresh: Option<f64>,

    /// Absolute log2 fold-change cutoff and guide lines (default: 1.0)
    #[arg(long)]
    fc_thresh: Option<f64>,

    /// Feature filter applied before testing (default: none)
    #[arg(long, value_enum)]
    filter: Option<CliFilter>,

    /// Threshold for the feature filter (mean abundance, or prevalence fraction)
    #[arg(long)]
    filter_threshold: Option<f64>,

    /// Abundance above which a feature counts as present (default: 0)
    #[arg(long)]
    prevalence_epsilon: Option<f64>,

    /// Pseudocount added to both means for the fold change (default: 1e-9)
    #[arg(long)]
    pseudocount: Option<f64>,

    /// Number of top-ranked features that get a boxplot (default: 3)
    #[arg(long)]
    boxplots: Option<usize>,

    /// Fail if the two tables do not list exactly the same samples
    #[arg(long)]
    strict_samples: bool,
}

const DEFAULT_TOP_N: usize = 10;
const DEFAULT_Q_THRESH: f64 = 0.10;

fn main() {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Merge a YAML configuration (if any) with command-line overrides.
fn build_config(args: &RunArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            AnalysisConfig::from_yaml(&std::fs::read_to_string(path)?)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(sep) = &args.sep {
        config.delimiter = sep.clone();
    }
    if let Some(col) = &args.group_col {
        config.group.column = col.clone();
    }
    if let Some(g1) = &args.group1 {
        config.group.group1 = g1.clone();
    }
    if let Some(g2) = &args.group2 {
        config.group.group2 = g2.clone();
    }
    if let Some(pc) = args.pseudocount {
        config.pseudocount = pc;
    }
    if let Some(n) = args.boxplots {
        config.boxplot_top_n = n;
    }
    if args.strict_samples {
        config.strict_samples = true;
    }
    if let Some(p) = args.p_thresh {
        config.volcano.p_thresh = p;
    }
    if let Some(fc) = args.fc_thresh {
        config.volcano.fc_thresh = fc;
    }

    config.filter = match args.filter {
        None => match config.filter {
            FeatureFilter::MinMean { threshold } => FeatureFilter::MinMean {
                threshold: args.filter_threshold.unwrap_or(threshold),
            },
            FeatureFilter::MinPrevalence { fraction, epsilon } => FeatureFilter::MinPrevalence {
                fraction: args.filter_threshold.unwrap_or(fraction),
                epsilon: args.prevalence_epsilon.unwrap_or(epsilon),
            },
            FeatureFilter::None => FeatureFilter::None,
        },
        Some(CliFilter::None) => FeatureFilter::None,
        Some(CliFilter::MinMean) => FeatureFilter::MinMean {
            threshold: args.filter_threshold.unwrap_or(0.0),
        },
        Some(CliFilter::MinPrevalence) => FeatureFilter::MinPrevalence {
            fraction: args.filter_threshold.unwrap_or(0.0),
            epsilon: args.prevalence_epsilon.unwrap_or(0.0),
        },
    };

    config.labels = build_label_policy(args, config.labels, config.volcano.p_thresh);
    Ok(config)
}

fn build_label_policy(args: &RunArgs, current: LabelPolicy, p_thresh: f64) -> LabelPolicy {
    let mode = args.label_mode.unwrap_or(match current {
        LabelPolicy::None => CliLabelMode::None,
        LabelPolicy::Top { .. } => CliLabelMode::Top,
        LabelPolicy::Threshold { .. } => CliLabelMode::Threshold,
    });

    match mode {
        CliLabelMode::None => LabelPolicy::None,
        CliLabelMode::Top => {
            let current_n = match current {
                LabelPolicy::Top { n } => n,
                _ => DEFAULT_TOP_N,
            };
            LabelPolicy::Top {
                n: args.top_n.unwrap_or(current_n),
            }
        }
        CliLabelMode::Threshold => {
            let (cur_metric, cur_alpha, cur_fc) = match current {
                LabelPolicy::Threshold {
                    metric,
                    alpha,
                    fc_thresh,
                } => (metric, alpha, fc_thresh),
                _ => (SignificanceMetric::QValue, DEFAULT_Q_THRESH, 1.0),
            };
            let metric = if args.use_p {
                SignificanceMetric::PValue
            } else {
                cur_metric
            };
            let alpha = match metric {
                SignificanceMetric::PValue if args.use_p || args.p_thresh.is_some() => p_thresh,
                SignificanceMetric::QValue => args.q_thresh.unwrap_or(cur_alpha),
                SignificanceMetric::PValue => cur_alpha,
            };
            LabelPolicy::Threshold {
                metric,
                alpha,
                fc_thresh: args.fc_thresh.unwrap_or(cur_fc),
            }
        }
    }
}

/// Run the association analysis and write all artifacts.
fn cmd_run(args: &RunArgs) -> Result<()> {
    let config = build_config(args)?;
    config.validate()?;

    eprintln!("Loading data...");
    let (abundance, metadata) = load_inputs(&args.abundance, &args.metadata, &config)?;
    eprintln!(
        "Loaded {} features x {} samples, metadata for {} samples",
        abundance.n_features(),
        abundance.n_samples(),
        metadata.n_samples()
    );

    eprintln!(
        "Comparing {} vs {} on '{}'...",
        config.group.group2, config.group.group1, config.group.column
    );
    let outcome = run_analysis(&abundance, &metadata, &config)?;

    eprintln!("Writing outputs to {:?}...", args.out);
    let files = write_outputs(&outcome, &args.out)?;

    println!("{}", outcome);
    println!("Saved results table: {}", files.results.display());
    println!("Saved volcano plot:  {}", files.volcano.display());
    for path in &files.boxplots {
        println!("Saved boxplot:       {}", path.display());
    }
    println!("Saved run report:    {}", files.report.display());

    Ok(())
}

fn cmd_example(output_path: &Path) -> Result<()> {
    let config = AnalysisConfig::new()
        .group("Severity", "Mild", "Severe")
        .filter(FeatureFilter::MinPrevalence {
            fraction: 0.1,
            epsilon: 0.0,
        })
        .labels(LabelPolicy::Top { n: DEFAULT_TOP_N });
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
