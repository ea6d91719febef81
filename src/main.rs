//! Play-call feature CLI
//!
//! Builds leakage-free run/pass feature tables from cached NFL play-by-play data.

use clap::{Parser, Subcommand};
use playcall::{Config, Result};

#[derive(Parser)]
#[command(name = "playcall")]
#[command(about = "Pre-snap run/pass feature engineering for NFL play-by-play data", long_about = None)]
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
    /// Write a default config and create the data directories
    Init,
    /// Build the feature table and summary
    Build {
        /// Seasons to build (defaults to the configured seasons)
        #[arg(long = "season", num_args = 1..)]
        seasons: Vec<u16>,
        /// Summary output format (table, json)
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Show which input tables are cached per season
    Status,
    /// Write temporal train/test files from a feature file
    Split {
        /// Feature CSV written by `build`
        features: String,
        /// Report output format (table, json)
        #[arg(long, default_value = "table")]
        format: OutputFormat,
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
        Commands::Build { seasons, format } => commands::build(&config, seasons, format),
        Commands::Status => commands::status(&config),
        Commands::Split { features, format } => commands::split(&config, &features, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use playcall::data::cache::table_status;
    use playcall::data::TableKind;
    use playcall::pipeline;
    use playcall::split::{write_split, TemporalSplit};
    use playcall::PlayCallError;
    use std::path::Path;

    fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
        serde_json::to_string_pretty(value).map_err(|e| PlayCallError::Serialization(e.to_string()))
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.cache_dir)?;
        std::fs::create_dir_all(&config.data.output_dir)?;
        println!(
            "Created {} and {} directories",
            config.data.cache_dir, config.data.output_dir
        );

        println!("\nNext steps:");
        println!("  1. Edit {} to choose seasons and the tendency scope", config_path);
        println!(
            "  2. Place pbp_{{season}}.csv (plus participation_, schedules_, player_stats_) in {}",
            config.data.cache_dir
        );
        println!("  3. Run 'playcall build' to write the feature table");
        println!("  4. Run 'playcall split <features.csv>' for train/test files");

        Ok(())
    }

    pub fn build(config: &Config, seasons: Vec<u16>, format: OutputFormat) -> Result<()> {
        let seasons = if seasons.is_empty() {
            config.data.seasons.clone()
        } else {
            seasons
        };

        let (paths, summary) = pipeline::run(config, &seasons)?;

        match format {
            OutputFormat::Json => println!("{}", to_json(&summary)?),
            OutputFormat::Table => {
                println!("Feature Build");
                println!("───────────────────────────────");
                println!("  Seasons:   {:?}", summary.seasons);
                println!("  Plays:     {}", summary.total_plays);
                println!("  Dropped:   {}", summary.dropped_plays);
                println!("  Features:  {}", summary.feature_count());
                for group in &summary.groups {
                    println!("    {:<18} {}", group.name, group.columns.len());
                }
                println!("  Output:    {}", paths.features.display());
                println!("  Summary:   {}", paths.summary.display());
            }
        }
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let cache_dir = Path::new(&config.data.cache_dir);

        println!("Cache Status");
        println!("───────────────────────────────");
        println!("  Path: {}", config.data.cache_dir);
        println!(
            "  {:<8} {:<14} {:<14} {:<14} {:<14}",
            "Season",
            TableKind::Plays,
            TableKind::Participation,
            TableKind::Schedules,
            TableKind::PlayerStats
        );

        for &season in &config.data.seasons {
            let marks: Vec<&str> = table_status(cache_dir, &[season])
                .into_iter()
                .map(|(_, kind, present)| match (present, kind.is_required()) {
                    (true, _) => "yes",
                    (false, true) => "MISSING",
                    (false, false) => "-",
                })
                .collect();
            println!(
                "  {:<8} {:<14} {:<14} {:<14} {:<14}",
                season, marks[0], marks[1], marks[2], marks[3]
            );
        }

        Ok(())
    }

    pub fn split(config: &Config, features: &str, format: OutputFormat) -> Result<()> {
        let split = TemporalSplit::from_config(&config.split);
        let report = write_split(Path::new(features), &split)?;

        match format {
            OutputFormat::Json => println!("{}", to_json(&report)?),
            OutputFormat::Table => {
                let rate = |r: Option<f64>| r.map_or("-".to_string(), |r| format!("{:.1}%", r * 100.0));
                println!("Temporal Split");
                println!("───────────────────────────────");
                println!(
                    "  Train:     seasons < {} + {} weeks 1-{}",
                    split.cutoff_season, split.cutoff_season, split.cutoff_week
                );
                println!(
                    "  Test:      {} weeks {}-{}",
                    split.cutoff_season, split.test_start_week, split.test_end_week
                );
                println!("  Features:  {}", report.feature_columns.len());
                println!("  Excluded:  {} leakage columns", report.leakage_columns.len());
                println!(
                    "  Train:     {} plays (pass rate {})",
                    report.train_rows,
                    rate(report.train_pass_rate)
                );
                println!(
                    "  Test:      {} plays (pass rate {})",
                    report.test_rows,
                    rate(report.test_pass_rate)
                );
                println!("  Written:   {}", report.train_path.display());
                println!("             {}", report.test_path.display());
            }
        }
        Ok(())
    }
}
