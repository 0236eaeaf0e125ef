use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
  match exerplan_lib::run().await {
    Ok(()) => ExitCode::SUCCESS,
    Err(_) => ExitCode::FAILURE,
  }
}
