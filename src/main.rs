//! var-engine CLI
//!
//! Run Monte Carlo VaR against a JSON repository snapshot.
//!
//! # Usage
//!
//! ```bash
//! # VaR for one instrument over a 20-day horizon
//! var-engine run --input market.json --instrument NABIL --horizon 20
//!
//! # Reproducible run, JSON output, snapshot written back with the result
//! var-engine run --input market.json --instrument NABIL --horizon 20 --seed 42 \
//!     --format json --output market.json
//!
//! # Seed calibration history for every instrument in the snapshot
//! var-engine bootstrap --input market.json --output market.json
//! ```

use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::process;
use var_engine::core::instrument::InstrumentId;
use var_engine::engine::bootstrap::bootstrap;
use var_engine::engine::config::EngineConfig;
use var_engine::engine::orchestrator::VarEngine;
use var_engine::engine::repository::InMemoryRepository;

fn print_usage() {
    eprintln!(
        r#"var-engine — Monte Carlo Value-at-Risk with confidence calibration

USAGE:
    var-engine <COMMAND> [OPTIONS]

COMMANDS:
    run         Compute VaR for one instrument
    bootstrap   Seed calibration history for all instruments (first use only)
    help        Show this message

OPTIONS (all commands):
    --input <FILE>        Repository snapshot (JSON) to read
    --output <FILE>       Write the updated snapshot here
    --config <FILE>       Engine configuration (JSON, partial allowed)
    --seed <N>            Seed the random source for reproducible runs
    --workers <N>         Fixed simulation worker count (default: all cores)
    --paths <N>           Simulated paths per run (default: 10000)

OPTIONS (run):
    --instrument <ID>     Instrument to evaluate
    --horizon <DAYS>      Investment horizon in days
    --confidence <C>      Use this confidence level instead of calibrating
    --format <FORMAT>     Output format: text (default) or json

Set RUST_LOG=debug for per-stage tracing."#
    );
}

#[derive(Default)]
struct Options {
    input: Option<String>,
    output: Option<String>,
    config: Option<String>,
    seed: Option<u64>,
    workers: Option<usize>,
    paths: Option<usize>,
    instrument: Option<String>,
    horizon: Option<usize>,
    confidence: Option<f64>,
    format: String,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    args.get(i)
        .map(String::as_str)
        .unwrap_or_else(|| fail(format!("{} requires a value", flag)))
}

fn parse<T: std::str::FromStr>(raw: &str, flag: &str) -> T {
    raw.parse()
        .unwrap_or_else(|_| fail(format!("invalid value '{}' for {}", raw, flag)))
}

fn parse_options(args: &[String]) -> Options {
    let mut opts = Options {
        format: "text".to_string(),
        ..Default::default()
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--input" => opts.input = Some(value(args, i, flag).to_string()),
            "--output" => opts.output = Some(value(args, i, flag).to_string()),
            "--config" => opts.config = Some(value(args, i, flag).to_string()),
            "--seed" => opts.seed = Some(parse(value(args, i, flag), flag)),
            "--workers" => opts.workers = Some(parse(value(args, i, flag), flag)),
            "--paths" => opts.paths = Some(parse(value(args, i, flag), flag)),
            "--instrument" => opts.instrument = Some(value(args, i, flag).to_string()),
            "--horizon" => opts.horizon = Some(parse(value(args, i, flag), flag)),
            "--confidence" => opts.confidence = Some(parse(value(args, i, flag), flag)),
            "--format" => opts.format = value(args, i, flag).to_string(),
            _ => fail(format!("unknown option: {}", flag)),
        }
        i += 1;
    }
    opts
}

fn load_config(opts: &Options) -> EngineConfig {
    let mut config = match &opts.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .unwrap_or_else(|e| fail(format!("reading config '{}': {}", path, e)));
            serde_json::from_str(&content)
                .unwrap_or_else(|e| fail(format!("parsing config '{}': {}", path, e)))
        }
        None => EngineConfig::default(),
    };
    if let Some(workers) = opts.workers {
        config.simulation.worker_count = Some(workers);
    }
    if let Some(paths) = opts.paths {
        config.num_paths = paths;
    }
    config
}

fn load_repository(opts: &Options) -> InMemoryRepository {
    let path = opts
        .input
        .as_deref()
        .unwrap_or_else(|| fail("--input <FILE> is required"));
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading '{}': {}", path, e)));
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "prices": {{
    "NABIL": [ {{ "date": "2024-01-01", "close": 500.0 }}, {{ "date": "2024-01-02", "close": 505.0 }} ]
  }}
}}"#
        );
        fail(format!("parsing '{}': {}", path, e))
    })
}

fn save_repository(opts: &Options, repo: &InMemoryRepository) {
    if let Some(path) = &opts.output {
        let json = serde_json::to_string_pretty(repo)
            .unwrap_or_else(|e| fail(format!("serializing snapshot: {}", e)));
        fs::write(path, json).unwrap_or_else(|e| fail(format!("writing '{}': {}", path, e)));
        info!("snapshot written to {}", path);
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn cmd_run(args: &[String]) {
    let opts = parse_options(args);
    let instrument = InstrumentId::new(
        opts.instrument
            .as_deref()
            .unwrap_or_else(|| fail("--instrument <ID> is required")),
    );
    let horizon = opts
        .horizon
        .unwrap_or_else(|| fail("--horizon <DAYS> is required"));

    let engine = VarEngine::new(load_config(&opts)).unwrap_or_else(|e| fail(e));
    let mut repo = load_repository(&opts);
    let mut rng = make_rng(opts.seed);

    let result = match opts.confidence {
        Some(c) => engine.run_with_confidence(&instrument, horizon, c, false, &mut repo, &mut rng),
        None => engine.run(&instrument, horizon, &mut repo, &mut rng),
    }
    .unwrap_or_else(|e| fail(e));

    if opts.format == "json" {
        let json = serde_json::to_string_pretty(&result)
            .unwrap_or_else(|e| fail(format!("serializing result: {}", e)));
        println!("{}", json);
    } else {
        print!("{}", result);
    }

    save_repository(&opts, &repo);
}

fn cmd_bootstrap(args: &[String]) {
    let opts = parse_options(args);
    let engine = VarEngine::new(load_config(&opts)).unwrap_or_else(|e| fail(e));
    let mut repo = load_repository(&opts);
    let mut rng = make_rng(opts.seed);

    let report = bootstrap(&engine, &mut repo, &mut rng).unwrap_or_else(|e| fail(e));
    if report.is_empty() {
        println!("History already present; nothing to bootstrap.");
    } else {
        for result in &report.seeded {
            println!(
                "  {:<12} {:>3} days  {:>6.2}%  VaR {:>10.2} ({:.2}%)",
                result.instrument_id,
                result.horizon_days,
                result.confidence_level * 100.0,
                result.var_amount,
                result.var_percentage
            );
        }
        for (id, reason) in &report.skipped {
            println!("  {:<12} skipped: {}", id, reason);
        }
        println!(
            "\nSeeded {} instruments, skipped {}",
            report.seeded.len(),
            report.skipped.len()
        );
    }

    save_repository(&opts, &repo);
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "run" => cmd_run(rest),
        "bootstrap" => cmd_bootstrap(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
