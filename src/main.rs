//! Tennis match dataset CLI
//!
//! Builds leakage-free training datasets from historical match CSVs and
//! produces prediction vectors for new pairings.

use clap::{Parser, Subcommand};
use tennis::{Config, Result};

#[derive(Parser)]
#[command(name = "tennis")]
#[command(about = "Tennis match feature engineering and dataset preparation", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Build train/test matrices and save the artifacts
    Dataset {
        /// Processed match CSV (defaults to data.csv_path)
        #[arg(long)]
        csv: Option<String>,
        /// Directory for train.csv, test.csv and artifacts.json
        #[arg(long)]
        out: Option<String>,
    },
    /// List players and match contexts known to the catalog
    Players {
        /// Only show players whose name contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Build the feature vector for a pairing
    Vectorize {
        /// First player
        player1: String,
        /// Second player
        player2: String,
        #[arg(long)]
        surface: Option<String>,
        #[arg(long)]
        court: Option<String>,
        #[arg(long)]
        round: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Turn a raw match dump into a processed feature CSV
    Preprocess {
        /// Raw match CSV
        #[arg(long)]
        input: String,
        /// Output path
        #[arg(long)]
        output: String,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Dataset { csv, out } => commands::dataset(&config, csv, out),
        Commands::Players { filter } => commands::players(&config, filter),
        Commands::Vectorize {
            player1,
            player2,
            surface,
            court,
            round,
            year,
            format,
        } => {
            let context = tennis::features::MatchContext {
                surface,
                court,
                round,
                year,
            };
            commands::vectorize(&config, &player1, &player2, context, format)
        }
        Commands::Preprocess { input, output } => commands::preprocess(&config, &input, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::path::{Path, PathBuf};
    use tennis::data::{load_dataset, parse_table, AliasTable, ColumnMap, DatasetArtifacts};
    use tennis::features::{Catalog, MatchContext};
    use tennis::predict::Vectorizer;
    use tennis::TennisError;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Place processed matches at {}", config.data.csv_path);
        println!("  3. Run 'tennis dataset' to build the training matrices");
        Ok(())
    }

    fn read_csv(path: &str) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| {
            TennisError::Config(format!("Failed to read {}: {}", path, e))
        })
    }

    fn load_catalog(config: &Config) -> Result<Catalog> {
        let text = read_csv(&config.data.csv_path)?;
        let table = parse_table(&text)?;
        let columns = ColumnMap::resolve(&table.headers, &AliasTable::default());
        Ok(Catalog::from_table(&table, &columns, config))
    }

    pub fn dataset(config: &Config, csv: Option<String>, out: Option<String>) -> Result<()> {
        let csv_path = csv.unwrap_or_else(|| config.data.csv_path.clone());
        let text = read_csv(&csv_path)?;
        let dataset = load_dataset(&text, config)?;

        let (out_dir, artifacts_path) = match out {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                let artifacts = dir.join("artifacts.json");
                (dir, artifacts)
            }
            None => {
                let artifacts = PathBuf::from(&config.data.artifacts_path);
                let dir = artifacts
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (dir, artifacts)
            }
        };
        dataset.write_csv(&out_dir)?;
        dataset.artifacts.save(&artifacts_path)?;

        println!("Dataset Summary");
        println!("───────────────────────────────");
        println!("  Source:         {}", csv_path);
        println!("  Train rows:     {}", dataset.train_labels.len());
        println!("  Test rows:      {}", dataset.test_labels.len());
        println!("  Features:       {}", dataset.feature_names.len());
        println!("  Players:        {}", dataset.catalog.len());
        println!("  Dropped:        {}", dataset.artifacts.dropped_columns.join(", "));
        println!("  Output:         {}", out_dir.display());
        Ok(())
    }

    pub fn players(config: &Config, filter: Option<String>) -> Result<()> {
        let catalog = load_catalog(config)?;
        let filter = filter.map(|f| f.to_lowercase());

        println!("Players");
        println!("───────────────────────────────");
        for name in catalog.list_players() {
            if let Some(f) = &filter {
                if !name.as_str().to_lowercase().contains(f) {
                    continue;
                }
            }
            let played = catalog.player(name).map_or(0, |p| p.matches_played);
            println!("  {:30} {:>5} matches", name.as_str(), played);
        }

        println!("\nSurfaces: {}", catalog.list_surfaces().join(", "));
        println!("Courts:   {}", catalog.list_courts().join(", "));
        println!("Rounds:   {}", catalog.list_rounds().join(", "));
        match catalog.latest_year() {
            Some(year) => println!("Latest year: {}", year),
            None => println!("Latest year: unknown"),
        }
        Ok(())
    }

    pub fn vectorize(
        config: &Config,
        player1: &str,
        player2: &str,
        context: MatchContext,
        format: OutputFormat,
    ) -> Result<()> {
        let artifacts_path = &config.data.artifacts_path;
        if !Path::new(artifacts_path).exists() {
            return Err(TennisError::NoArtifacts(artifacts_path.clone()));
        }
        let artifacts = DatasetArtifacts::load(artifacts_path)?;
        let vectorizer = Vectorizer::new(load_catalog(config)?, artifacts);
        let vectorized = vectorizer.vectorize_from_players(player1, player2, &context)?;

        match format {
            OutputFormat::Table => {
                let (p1, p2) = &vectorized.resolved_players;
                println!("{} vs {}", p1, p2);
                println!("───────────────────────────────");
                for (name, value) in vectorizer
                    .artifacts()
                    .feature_names
                    .iter()
                    .zip(&vectorized.vector)
                {
                    println!("  {:28} {:>10.4}", name, value);
                }
                if !vectorized.missing_features.is_empty() {
                    println!("\nMissing: {}", vectorized.missing_features.join(", "));
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&vectorized)?);
            }
        }
        Ok(())
    }

    pub fn preprocess(config: &Config, input: &str, output: &str) -> Result<()> {
        let text = read_csv(input)?;
        let processed = tennis::data::preprocess(&text, config)?;
        if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(output)?;
        processed.write_csv(file)?;
        println!("Wrote {} processed matches to {}", processed.len(), output);
        Ok(())
    }
}
