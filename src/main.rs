use anyhow::Result;
use registry_syncer::cli::{Args, Runner};
use registry_syncer::config::AppConfig;
use registry_syncer::logging::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file in the working directory may supply any of the settings
    dotenvy::dotenv().ok();
    let args = Args::parse_args();

    let output = if args.quiet {
        Logger::new_quiet()
    } else {
        Logger::new(args.verbose)
    };
    output.init_tracing();

    let config = AppConfig::from_args(&args)?;

    // Per-item failures are reported in the summary and do not change the exit code
    Runner::new(config, output).run().await?;

    Ok(())
}
