use batched_test_runner::cli;
use std::process::ExitCode;

// The status board is single-threaded, so the whole run stays on one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
