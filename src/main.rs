use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dayone_content::run().await
}
