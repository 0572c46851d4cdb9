use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tsp_evo::data::{Dataset, DistanceMatrix};
use tsp_evo::export::ResultsExport;
use tsp_evo::ga::{
    evaluate, initial_population, step_timed, ConfigFile, GenerationStats, Observer, RunConfig,
    RunResult, RunState, TspRunner,
};
use tsp_evo::random::create_rng;

fn cli() -> Command {
    Command::new("tsp-evo")
        .about("Evolves short tours for a Euclidean TSP instance")
        .arg(
            arg!(-a --config <CONFIG> "JSON parameter file")
                .default_value("default_args.json")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-f --data [DATAFILE] "`id x y` data file; overrides `datafile` in the config")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-t --runs [RUNS] "Number of independent runs")
                .default_value("1")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-e --export [CSV] "Write each run's best length to a CSV file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(--seed [SEED] "Base seed; overrides the config")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(arg!(-v --verbose "Log every generation").action(ArgAction::SetTrue))
        .arg(
            arg!(-d --debug "Log per-stage timings of one profiled generation")
                .action(ArgAction::SetTrue),
        )
}

/// Prints one line per generation and the best tour of each run.
struct ConsoleReport;

impl Observer for ConsoleReport {
    fn on_generation(&mut self, _state: &RunState, stats: &GenerationStats) {
        println!(
            "Generation {}: Max: {:.0}\tMean: {:.0}\tSD: {:.0}",
            stats.generation, stats.best_length, stats.mean_length, stats.sd_length
        );
    }

    fn on_run_complete(&mut self, result: &RunResult) -> tsp_evo::Result<()> {
        println!("The best individual of run {}:", result.run);
        println!("#0 (length: {:.0}): {:?}", result.best_length, result.best_tour);
        Ok(())
    }
}

fn main() {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow!("missing --config"))?;
    let file = ConfigFile::from_path(config_path)?;

    let data_path = matches
        .get_one::<PathBuf>("data")
        .cloned()
        .or_else(|| file.datafile.clone())
        .ok_or_else(|| anyhow!("no data file: pass --data or set `datafile` in the config"))?;

    let mut config: RunConfig = file.to_run_config()?;
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(seed);
    }
    let runs = *matches.get_one::<usize>("runs").unwrap_or(&1);

    let t = Instant::now();
    let dataset = Dataset::from_file(&data_path)
        .with_context(|| format!("loading {}", data_path.display()))?;
    let load_time = t.elapsed();

    let t = Instant::now();
    let mut cache_path = data_path.clone().into_os_string();
    cache_path.push(".distance");
    let distances = DistanceMatrix::load_or_compute(&dataset, &PathBuf::from(cache_path))?;
    let matrix_time = t.elapsed();
    config.validate(distances.len())?;

    if matches.get_flag("debug") {
        profile_generation(&config, &distances, load_time, matrix_time)?;
    }

    println!("Runtime parameters:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    let export = matches
        .get_one::<PathBuf>("export")
        .map(|path| ResultsExport::create(path.clone()))
        .transpose()?;

    let mut observer = (ConsoleReport, export);
    TspRunner::run_many(&config, &distances, runs, &mut observer, None)?;
    Ok(())
}

/// Times seeding, evaluation, and every stage of one generation, then logs
/// the breakdown.
fn profile_generation(
    config: &RunConfig,
    distances: &DistanceMatrix,
    load: Duration,
    matrix: Duration,
) -> Result<()> {
    let seed = config.seed.unwrap_or_else(rand::random);

    let t = Instant::now();
    let population = initial_population(config, distances, seed)?;
    let seeding = t.elapsed();

    let t = Instant::now();
    let fitness = evaluate(&population, distances);
    let evaluation = t.elapsed();

    let mut state = RunState {
        population,
        fitness,
        generation: 0,
    };
    let stages = step_timed(config, distances, &mut state, &mut create_rng(seed))?;

    info!(
        load_ms = ms(load),
        distance_matrix_ms = ms(matrix),
        seeding_ms = ms(seeding),
        evaluation_ms = ms(evaluation),
        "setup timings"
    );
    info!(
        selection_ms = ms(stages.selection),
        recombination_ms = ms(stages.recombination),
        mutation_ms = ms(stages.mutation),
        evaluation_ms = ms(stages.evaluation),
        survivors_ms = ms(stages.survivors),
        total_ms = ms(stages.total()),
        "generation timings"
    );
    Ok(())
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
