use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use canopy_io::{EvaluationReport, ExampleReader, ExampleSet, ReportWriter};
use canopy_rf::{FeaturesPerSplit, OobMembership, RandomForestConfig, RandomForestResult};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Random forest classification over boolean features")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// How out-of-bag membership is decided.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum MembershipArg {
    /// Rows never drawn into the bootstrap sample
    Index,
    /// Rows whose content matches no drawn example
    Value,
}

impl From<MembershipArg> for OobMembership {
    fn from(arg: MembershipArg) -> Self {
        match arg {
            MembershipArg::Index => OobMembership::ByIndex,
            MembershipArg::Value => OobMembership::ByValue,
        }
    }
}

/// Shared forest hyperparameters.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Features sampled at each split (defaults to ceil(sqrt(n_features)))
    #[arg(long)]
    features_per_split: Option<usize>,

    /// Maximum tree depth (unbounded if absent)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum examples at a node needed to split it
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Out-of-bag membership policy
    #[arg(long, value_enum, default_value_t = MembershipArg::Index)]
    oob_membership: MembershipArg,
}

impl ForestArgs {
    fn config(&self, n_features: usize, seed: u64) -> Result<RandomForestConfig> {
        let features_per_split = self
            .features_per_split
            .map_or(FeaturesPerSplit::Sqrt, FeaturesPerSplit::Fixed);
        let config = RandomForestConfig::new(self.trees, n_features)?
            .with_features_per_split(features_per_split)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_oob_membership(self.oob_membership.into())
            .with_seed(seed);
        config.validate().context("invalid forest configuration")?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a forest and evaluate it on a held-out test file
    Evaluate {
        /// Tab-delimited training file
        #[arg(long)]
        train: PathBuf,

        /// Tab-delimited test file
        #[arg(long)]
        test: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,

        /// Print the first tree of the forest
        #[arg(long, default_value_t = false)]
        print_tree: bool,

        /// Write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print a JSON summary instead of plain text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Train a forest and report its out-of-bag estimates
    Oob {
        /// Tab-delimited training file
        #[arg(long)]
        train: PathBuf,

        #[command(flatten)]
        forest: ForestArgs,

        /// Number of top-ranked features to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print a JSON summary instead of plain text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn load(path: &Path, what: &str) -> Result<ExampleSet> {
    let set = ExampleReader::new(path)
        .read()
        .with_context(|| format!("failed to read {what} file {}", path.display()))?;
    info!(
        what,
        n_examples = set.n_examples(),
        n_skipped = set.skipped().len(),
        "examples loaded"
    );
    Ok(set)
}

fn train(set: &ExampleSet, forest: &ForestArgs, seed: u64) -> Result<RandomForestResult> {
    let config = forest.config(set.n_features(), seed)?;
    config
        .fit(set.examples())
        .context("random forest training failed")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Evaluate {
            train: train_path,
            test: test_path,
            forest,
            print_tree,
            report,
            json,
        } => {
            let train_set = load(&train_path, "training")?;
            let test_set = load(&test_path, "test")?;
            ensure!(
                train_set.n_features() == test_set.n_features(),
                "training file has {} features but test file has {}",
                train_set.n_features(),
                test_set.n_features()
            );

            let result = train(&train_set, &forest, cli.seed)?;
            let cm = result
                .forest()
                .evaluate(test_set.examples())
                .context("evaluation failed")?;
            let summary = EvaluationReport::new(&result, &train_set, Some(&cm));

            if let Some(path) = report {
                ReportWriter::new(&path)?
                    .write(&summary)
                    .context("failed to write report")?;
            }

            if print_tree {
                if let Some(tree) = result.forest().trees().first() {
                    print!("{tree}");
                    println!();
                }
            }

            if json {
                println!("{}", summary.to_json()?);
            } else {
                println!(
                    "Positive examples correct: {} out of {}",
                    cm.true_positives,
                    cm.n_positives()
                );
                println!("Positive accuracy: {}", cm.positive_accuracy());
                println!(
                    "Negative examples correct: {} out of {}",
                    cm.true_negatives,
                    cm.n_negatives()
                );
                println!("Negative accuracy: {}", cm.negative_accuracy());
                println!();
                println!("Overall total accuracy is: {}", cm.accuracy());
                match summary.mean_oob_error {
                    Some(score) => println!("OOB: {score}"),
                    None => println!("OOB: undefined (every out-of-bag set was empty)"),
                }
            }
        }

        Command::Oob {
            train: train_path,
            forest,
            top,
            json,
        } => {
            let train_set = load(&train_path, "training")?;
            let result = train(&train_set, &forest, cli.seed)?;
            let summary = EvaluationReport::new(&result, &train_set, None);

            if json {
                println!("{}", summary.to_json()?);
            } else {
                let mean = result
                    .forest()
                    .mean_oob_error()
                    .context("no out-of-bag estimate available")?;
                println!("Mean OOB error: {mean}");
                if let Some(score) = result.oob_score() {
                    println!(
                        "Ensemble OOB accuracy: {} ({} examples)",
                        score.accuracy, score.n_oob_examples
                    );
                }
                println!();
                println!("Top features:");
                for entry in summary.feature_importances.iter().take(top) {
                    println!("{:>4}. {:<24} {:.4}", entry.rank, entry.name, entry.importance);
                }
            }
        }
    }

    Ok(())
}
