use clap::Parser;
use studio_api::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    studio_api::telemetry::init_tracing(cli.debug)?;

    if let Err(e) = studio_api::cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
