//! Powermix entry point: CLI wiring, entry setup, and event replay.

use std::path::Path;
use std::process;

use powermix::cli::{parse_args, print_usage};
use powermix::config::PowermixConfig;
use powermix::demo::DemoGenerator;
use powermix::entry::EntryRuntime;
use powermix::host::MemoryHost;
use powermix::io::export::export_csv;
use powermix::io::replay::{read_events_from_path, replay};
use powermix::logging::init_tracing;
use tracing::{error, info};

fn load_config(config: Option<&Path>, preset: Option<&str>) -> PowermixConfig {
    let loaded = match (config, preset) {
        (Some(path), _) => PowermixConfig::from_toml_file(path),
        (None, Some(name)) => PowermixConfig::from_preset(name),
        (None, None) => Ok(PowermixConfig::demo()),
    };
    let cfg = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

fn main() {
    let cli = parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        print_usage();
        process::exit(1);
    });

    init_tracing(cli.log_json);

    #[cfg(not(feature = "api"))]
    if cli.serve {
        eprintln!("error: --serve requires building with `--features api`");
        process::exit(1);
    }

    let cfg = load_config(cli.config.as_deref(), cli.preset.as_deref());

    let mut host = MemoryHost::new();
    let runtimes: Vec<EntryRuntime> = cfg
        .entries
        .iter()
        .map(|entry| EntryRuntime::setup(&mut host, entry))
        .collect();
    for runtime in &runtimes {
        info!(entry_id = runtime.entry_id(), title = runtime.title(), "entry ready");
    }

    let events = match cli.events.as_deref() {
        Some(path) => read_events_from_path(path).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            process::exit(1);
        }),
        None => DemoGenerator::new(&cfg.demo).events(&cfg),
    };
    info!(events = events.len(), "replaying events");

    let rows = replay(&mut host, &events);
    for row in &rows {
        println!("step {:>4} | {}", row.step, row.state);
    }

    println!();
    for state in host.latest_states() {
        println!("final     | {state}");
    }

    if let Some(ref path) = cli.out {
        if let Err(e) = export_csv(&rows, path) {
            error!(path = %path.display(), "export failed: {e}");
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Publications written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(powermix::api::AppState {
            sensors: host.latest_states(),
            publications: rows,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(powermix::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }

    for runtime in runtimes {
        runtime.unload();
    }
}
