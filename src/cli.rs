use std::env;
use std::path::PathBuf;

/// Default API port for `--serve`.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub events: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub log_json: bool,
    pub serve: bool,
    pub port: u16,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut events = None;
    let mut out = None;
    let mut log_json = false;
    let mut serve = false;
    let mut port = None;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--events" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --events (expected a CSV file path)")?;
                if events.replace(PathBuf::from(path)).is_some() {
                    return Err("--events provided more than once".to_string());
                }
            }
            "--out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --out (expected a file path)")?;
                if out.replace(PathBuf::from(path)).is_some() {
                    return Err("--out provided more than once".to_string());
                }
            }
            "--log-json" => log_json = true,
            "--serve" => serve = true,
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let parsed = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
                if port.replace(parsed).is_some() {
                    return Err("--port provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if port.is_some() && !serve {
        return Err("--port requires --serve".to_string());
    }

    if config.is_none() && preset.is_none() {
        preset = Some("demo".to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        events,
        out,
        log_json,
        serve,
        port: port.unwrap_or(DEFAULT_PORT),
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("powermix: derive \"other usage\" power from a main meter and its sub-meters");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  powermix [--config <path> | --preset <name>] [--events <csv>] [--out <csv>] [--log-json] [--serve [--port <u16>]]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>   Load entries from a TOML config file");
    eprintln!("  --preset <name>   Use a built-in preset (demo, consumers_only)");
    eprintln!("  --events <csv>    Replay state changes from CSV instead of the demo stream");
    eprintln!("  --out <csv>       Export every publication to CSV");
    eprintln!("  --log-json        Emit logs as JSON lines");
    eprintln!("  --serve           Start the REST API after the replay (feature `api`)");
    eprintln!("  --port <u16>      API server port (default: {DEFAULT_PORT})");
    eprintln!();
    eprintln!("If no --config or --preset is given, the demo preset is used.");
}
