use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    see_containers::run().await
}
