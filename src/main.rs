// src/main.rs

use dagrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("dagrun error: {err:?}");
            std::process::exit(2);
        }
    }
}

/// Returns `true` when the run (if any) fully succeeded.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    match run(args).await? {
        Some(report) => Ok(report.is_success()),
        None => Ok(true),
    }
}
