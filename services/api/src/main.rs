use std::process::ExitCode;

use volunteer_match_api::run;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("volunteer-match: {err}");
            ExitCode::FAILURE
        }
    }
}
