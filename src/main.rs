use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use faculty_stress_detector::{
    config::Config,
    dataset::{load_csv, write_labeled_csv, LabeledDataset},
    ml::{Classifier, FileModelStore, ModelStore, TrainingPipeline},
    prediction::{stress_level_line, write_stress_output, PredictionContext},
    scoring, WorkloadRecord,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "faculty-stress")]
#[command(about = "Faculty workload stress scoring and classification", long_about = None)]
#[command(version)]
struct Cli {
    /// Dataset CSV (overrides configuration)
    #[arg(short, long, global = true, env = "FACULTY_STRESS_DATASET")]
    dataset: Option<PathBuf>,

    /// Model file (overrides configuration)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one workload with the rule engine
    Score {
        #[command(flatten)]
        workload: WorkloadArgs,
    },

    /// Train and evaluate a classifier on the dataset, then store it
    Train {
        /// Also write the dataset with rule and learned labels
        #[arg(long, value_name = "CSV")]
        labeled_output: Option<PathBuf>,
    },

    /// Evaluate the stored classifier on a split re-derived from the dataset
    Evaluate,

    /// Predict one workload and write the downstream stress level line
    Predict {
        #[command(flatten)]
        workload: WorkloadArgs,

        /// Stress level file (overrides configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip writing the stress level file
        #[arg(long)]
        no_output: bool,
    },

    /// Predict every dataset row, one JSON line each
    Batch,
}

#[derive(Args)]
struct WorkloadArgs {
    /// Number of subjects handled
    #[arg(long)]
    subjects: u32,

    /// Total students taught
    #[arg(long)]
    students: u32,

    /// Weekly preparation hours
    #[arg(long)]
    prep: u32,

    /// Weekly research hours
    #[arg(long)]
    research: u32,

    /// Committee duties
    #[arg(long)]
    committee: u32,

    /// Administrative tasks
    #[arg(long)]
    admin: u32,

    /// Weekly meeting hours
    #[arg(long)]
    meetings: u32,

    /// Nightly sleep hours
    #[arg(long)]
    sleep: u32,

    /// Weekends worked per month
    #[arg(long)]
    weekend: u32,
}

impl WorkloadArgs {
    fn record(&self) -> WorkloadRecord {
        WorkloadRecord::from_values([
            self.subjects,
            self.students,
            self.prep,
            self.research,
            self.committee,
            self.admin,
            self.meetings,
            self.sleep,
            self.weekend,
        ])
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });
    if let Some(dataset) = &cli.dataset {
        config.dataset.path = dataset.clone();
    }
    if let Some(model) = &cli.model {
        config.model.path = model.clone();
    }

    init_tracing(&config);
    tracing::debug!("faculty-stress v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Score { workload } => score(&workload.record(), cli.json),
        Commands::Train { labeled_output } => train(&config, labeled_output.as_deref(), cli.json),
        Commands::Evaluate => evaluate(&config, cli.json),
        Commands::Predict {
            workload,
            output,
            no_output,
        } => {
            let output = (!no_output).then(|| {
                output
                    .clone()
                    .unwrap_or_else(|| config.output.stress_output_path.clone())
            });
            predict(&config, &workload.record(), output.as_deref(), cli.json)
        }
        Commands::Batch => batch(&config),
    }
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_dataset(config: &Config) -> anyhow::Result<LabeledDataset> {
    let path = &config.dataset.path;
    let table = load_csv(path, config.dataset.has_headers)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let dataset = config
        .dataset
        .preprocessor()
        .preprocess(&table)
        .with_context(|| format!("failed to preprocess dataset {}", path.display()))?;
    Ok(dataset)
}

fn load_classifier(config: &Config) -> anyhow::Result<Option<Arc<dyn Classifier>>> {
    let store = FileModelStore::new(&config.model.path);
    let classifier = store
        .load()
        .with_context(|| format!("failed to load model {}", config.model.path.display()))?;
    Ok(classifier.map(|c| Arc::new(c) as Arc<dyn Classifier>))
}

fn score(record: &WorkloadRecord, json: bool) -> anyhow::Result<()> {
    let breakdown = scoring::breakdown(record);
    let wss = breakdown.total();
    let category = scoring::categorize(wss);

    if json {
        let points: serde_json::Map<String, serde_json::Value> = breakdown
            .iter()
            .map(|(attr, points)| (attr.column_name().to_string(), points.into()))
            .collect();
        let out = serde_json::json!({
            "points": points,
            "wss": wss,
            "category": category,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (attr, points) in breakdown.iter() {
        println!("{:<34} {:>4} -> {}", attr.label(), record.get(attr), points);
    }
    println!("WSS: {} ({})", wss, category);
    Ok(())
}

fn train(config: &Config, labeled_output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let mut dataset = load_dataset(config)?;
    let mut pipeline = TrainingPipeline::from_config(&config.training);

    let outcome = pipeline.train(&dataset).context("training failed")?;
    for warning in &outcome.warnings {
        eprintln!("warning: {}", warning);
    }

    let metrics = pipeline.evaluate(&outcome.split, &outcome.classifier)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", metrics.classification_report());
    }

    FileModelStore::new(&config.model.path)
        .save(&outcome.classifier)
        .with_context(|| format!("failed to save model {}", config.model.path.display()))?;

    if let Some(path) = labeled_output {
        pipeline.annotate(&mut dataset, &outcome.classifier)?;
        write_labeled_csv(&dataset, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    tracing::info!("✅ Model saved to {}", config.model.path.display());
    Ok(())
}

fn evaluate(config: &Config, json: bool) -> anyhow::Result<()> {
    let Some(classifier) = load_classifier(config)? else {
        bail!(
            "no trained model at {}; run `faculty-stress train` first",
            config.model.path.display()
        );
    };
    let dataset = load_dataset(config)?;

    let pipeline = TrainingPipeline::from_config(&config.training);
    let metrics = pipeline.evaluate_on(&dataset, &*classifier)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", metrics.classification_report());
    }
    Ok(())
}

fn predict(
    config: &Config,
    record: &WorkloadRecord,
    output: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let context = match load_classifier(config) {
        Ok(Some(classifier)) => PredictionContext::with_classifier(classifier),
        Ok(None) => PredictionContext::rule_only(),
        Err(e) => {
            tracing::warn!("⚠️  {:#}; continuing with rule-based scoring only", e);
            PredictionContext::rule_only()
        }
    };

    let result = context.predict(record);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("WSS: {}", result.wss());
        println!("Rule-based category: {}", result.rule_category());
        if let Some(learned) = result.learned() {
            println!(
                "Learned category: {} ({:.0}% of votes)",
                learned.value,
                learned.confidence * 100.0
            );
        }
        println!("{}", stress_level_line(result.rule_category()));
    }

    if let Some(path) = output {
        write_stress_output(path, result.rule_category())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn batch(config: &Config) -> anyhow::Result<()> {
    let dataset = load_dataset(config)?;
    let context = match load_classifier(config)? {
        Some(classifier) => PredictionContext::with_classifier(classifier),
        None => PredictionContext::rule_only(),
    };

    let records: Vec<WorkloadRecord> = dataset.records().copied().collect();
    for result in context.predict_batch(&records) {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}
