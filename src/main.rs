use std::process::ExitCode;

use env_logger::Env;
use ipcmeter::{run_all, BenchConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = BenchConfig::from_args(std::env::args());
    println!(
        "Starting IPC comparison with message size: {} bytes...",
        config.message_size
    );

    let ok = run_all(&config, |_, result| {
        if let Ok(measurement) = result {
            println!("{}", measurement);
        }
    });

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
