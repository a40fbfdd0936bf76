//! campus entry point
//!
//! Initializes logging and hands off to the CLI. Log filtering comes from
//! `CAMPUS_LOG` (e.g. `CAMPUS_LOG=campus=debug,tower_http=info`).

use campus::cli;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CAMPUS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("campus=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = cli::run().await {
        tracing::error!(code = e.code().code(), "{}", e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
