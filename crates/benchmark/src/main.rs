//! 2BP Benchmark Runner CLI

use clap::{Parser, Subcommand, ValueEnum};
use rbp_benchmark::{BenchmarkResult, InstanceParser, LocalSearch, LocalSearchConfig};
use rbp_core::{PackingHeuristic, PackingSolution};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rbp-bench")]
#[command(about = "2BP Benchmark Runner for RBP")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the instances of a 2BP file
    Info {
        /// Path to the 2BP file
        file: PathBuf,
    },

    /// Run local search on the instances of a 2BP file
    Run {
        /// Path to the 2BP file
        file: PathBuf,

        /// Only run this instance (0-indexed)
        #[arg(short, long)]
        instance: Option<usize>,

        /// Placement heuristic
        #[arg(long, value_enum, default_value = "baf")]
        heuristic: HeuristicArg,

        /// Ruin-and-recreate moves per instance
        #[arg(short = 'n', long, default_value = "200")]
        iterations: usize,

        /// Allow 90 degree rotation
        #[arg(long)]
        rotation: bool,

        /// Shuffle the initial queue instead of sorting it by area
        #[arg(long)]
        shuffle: bool,

        /// Random seed
        #[arg(short, long, default_value = "12345")]
        seed: u64,

        /// Time limit per instance in seconds
        #[arg(short, long)]
        time_limit: Option<u64>,

        /// Record item placements in the JSON output
        #[arg(long)]
        placements: bool,

        /// Output file for results (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file for CSV results
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    /// Best area fit
    Baf,
    /// Touching perimeter
    Tp,
    /// Top-right corner distance
    Trcd,
}

impl From<HeuristicArg> for PackingHeuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Baf => PackingHeuristic::BestAreaFit,
            HeuristicArg::Tp => PackingHeuristic::TouchingPerimeter,
            HeuristicArg::Trcd => PackingHeuristic::TopRightCornerDistance,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("rbp_core", level)
        .filter_module("rbp_benchmark", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Info { file } => {
            let instances = InstanceParser::new().parse_file(&file)?;

            println!("{}: {} instances", file.display(), instances.len());
            println!("{:-<60}", "");
            println!(
                "{:<10} {:>12} {:>8} {:>12} {:>6}",
                "Instance", "Bin", "Items", "Item area", "LB"
            );
            for (idx, instance) in instances.iter().enumerate() {
                let solution = PackingSolution::new(instance.bin_width(), instance.bin_height());
                let lower_bound = solution.compute_lower_bound(instance.items())?;
                println!(
                    "{:<10} {:>12} {:>8} {:>12} {:>6}",
                    idx,
                    format!("{}x{}", instance.bin_width(), instance.bin_height()),
                    instance.len(),
                    instance.total_area(),
                    lower_bound
                );
            }
        }

        Commands::Run {
            file,
            instance,
            heuristic,
            iterations,
            rotation,
            shuffle,
            seed,
            time_limit,
            placements,
            output,
            csv,
        } => {
            let instances = InstanceParser::new().parse_file(&file)?;
            if let Some(idx) = instance {
                if idx >= instances.len() {
                    anyhow::bail!(
                        "instance {} out of range, {} has {} instances",
                        idx,
                        file.display(),
                        instances.len()
                    );
                }
            }

            let mut config = LocalSearchConfig::new()
                .with_heuristic(heuristic.into())
                .with_iterations(iterations)
                .with_rotation(rotation)
                .with_sorted_initial(!shuffle)
                .with_seed(seed)
                .with_placements(placements);
            if let Some(secs) = time_limit {
                config = config.with_time_limit(Duration::from_secs(secs));
            }

            let description = format!(
                "heuristic={} iterations={} rotation={} seed={}",
                config.heuristic, iterations, rotation, seed
            );
            let search = LocalSearch::new(config);
            let mut results = BenchmarkResult::new(file.display().to_string(), description);

            for (idx, inst) in instances.iter().enumerate() {
                if instance.map_or(false, |only| only != idx) {
                    continue;
                }
                log::info!("running instance {} ({} items)", idx, inst.len());
                let result = search.run(idx, inst)?;
                results.add_run(result);
            }

            results.print_summary();

            if let Some(path) = output {
                results.save_json(&path)?;
                println!("Results saved to: {}", path.display());
            }

            if let Some(path) = csv {
                results.save_csv(&path)?;
                println!("CSV saved to: {}", path.display());
            }
        }
    }

    Ok(())
}
