use std::{fs, path::PathBuf, process::ExitCode};

use log::LevelFilter;

use tlb_rs::{
    config::Config,
    error::{Error, Result, Stage},
    pipeline::{Inputs, Pipeline},
    replace::PolicyKind,
};

const HELP: &str = "\
Replays a program's memory trace through a simulated TLB

USAGE:
  tlb_rs [OPTIONS] <source-file> <trace-file> <tlb-capacity>

OPTIONS:
  -p <path>             Read configuration from a JSON file
  --config <json>       Inline JSON configuration
  --policy <name>       fifo, lru, optimal or random (repeatable; default all)
  --page-size <bytes>   Page size, a power of two (default 4096)
  --seed <n>            Seed for the random policy
  --heartbeat <n>       Log progress every n references
  --out-dir <dir>       Where reference strings and the executable are written
  --skip-profile        Use an existing trace instead of compiling and profiling
  --json <path>         Write all reports as JSON
  -v                    More logging (repeat for trace output)
  -h, --help            Print this help
";

fn main() -> ExitCode {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return ExitCode::SUCCESS;
    }

    let mut verbosity = 0;
    while args.contains("-v") {
        verbosity += 1;
    }
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(err) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("logger setup failed: {err}");
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {} stage failed: {}", err.stage(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(mut args: pico_args::Arguments) -> Result<()> {
    let config_json: Option<String> = args.opt_value_from_str("--config")?;
    let mut config = if let Some(config_str) = config_json {
        Config::from_json(&config_str)?
    } else if let Some(config_path) = args.opt_value_from_str::<_, PathBuf>("-p")? {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    let policies: Vec<PolicyKind> = args.values_from_str("--policy")?;
    if !policies.is_empty() {
        config.policies = policies;
    }
    if let Some(page_size) = args.opt_value_from_str("--page-size")? {
        config.page_size = page_size;
    }
    if let Some(seed) = args.opt_value_from_str("--seed")? {
        config.seed = seed;
    }
    if let Some(heartbeat) = args.opt_value_from_str("--heartbeat")? {
        config.heartbeat = heartbeat;
    }
    if let Some(out_dir) = args.opt_value_from_str("--out-dir")? {
        config.work_dir = out_dir;
    }
    if args.contains("--skip-profile") {
        config.skip_profile = true;
    }
    let stats_path: Option<PathBuf> = args.opt_value_from_str("--json")?;

    let source: PathBuf = args.free_from_str()?;
    let trace: PathBuf = args.free_from_str()?;
    let capacity: String = args.free_from_str()?;
    let rest = args.finish();
    if !rest.is_empty() {
        return Err(Error::Configuration(format!("unexpected arguments: {rest:?}")));
    }
    config.capacity = Some(capacity.trim().parse().map_err(|_| {
        Error::Configuration(format!("TLB capacity `{capacity}` is not a positive integer"))
    })?);
    log::debug!("{config:?}");

    let pipeline = Pipeline::new(config)?;
    let reports = pipeline.run(&Inputs { source, trace })?;

    let mut current = None;
    for report in &reports {
        if current != Some(report.stream) {
            println!("\n{} TLB:", report.stream);
            current = Some(report.stream);
        }
        println!("{report}");
    }

    if let Some(stats_path) = stats_path {
        let stats_file =
            fs::File::create(&stats_path).map_err(Error::io(Stage::Report, &stats_path))?;
        serde_json::to_writer_pretty(stats_file, &reports).map_err(|source| Error::Json {
            stage: Stage::Report,
            source,
        })?;
    }
    Ok(())
}
