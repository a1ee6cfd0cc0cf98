// src/main.rs

use runner::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("runner error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(summary) => {
            tracing::info!(reason = ?summary.reason, stats = ?summary.stats, "runner finished");
        }
        Err(err) => {
            eprintln!("runner error: {err}");
            std::process::exit(1);
        }
    }
}
