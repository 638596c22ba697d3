use clap::Parser;
use docqa_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys may live in a .env file next to the document.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.log_json {
        docqa_telemetry::init_json_telemetry("docqa");
    } else {
        docqa_telemetry::init_telemetry("docqa");
    }

    docqa_cli::run(cli).await
}
