#![forbid(unsafe_code)]

//! `reltime` binary entry point.

use std::io;

use reltime_cli::{cli, host};
use reltime_runtime::RefreshScheduler;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env(cli::LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let opts = cli::Opts::parse();
    init_logging();

    let scheduler = RefreshScheduler::system();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = host::run(&opts, &scheduler, std::thread::sleep, &mut out) {
        eprintln!("reltime: {e}");
        std::process::exit(1);
    }
}
