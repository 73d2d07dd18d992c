// src/main.rs

use cronrun::types::DEFAULT_SENTINEL_EXIT_CODE;
use cronrun::{cli, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("cronrun error: {err:?}");
            std::process::exit(DEFAULT_SENTINEL_EXIT_CODE);
        }
    }
}
