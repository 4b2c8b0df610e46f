use clap::Parser;
use tracing::{error, info};
use wp_toolkit::{install_prometheus, setup_logging, validate_config, Cli, CliRunner, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    info!("Starting wp-toolkit v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = if args.metrics {
        Some(install_prometheus()?)
    } else {
        None
    };

    // Load configuration
    let config = load_config(&args).await?;

    let cli_runner = CliRunner::new(config, &args)?;
    let presenter = cli_runner.presenter;

    let result = cli_runner.run(args.command).await;

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    if let Err(e) = result {
        if e.is_failure() {
            error!("Application error: {}", e);
            eprintln!("{}", presenter.format_error(&e));
            std::process::exit(1);
        }
        println!("{}", presenter.format_error(&e));
    }

    Ok(())
}

async fn load_config(args: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if let Some(config_path) = &args.config {
        // Load from file
        let config_content = tokio::fs::read_to_string(config_path).await?;
        serde_json::from_str(&config_content)?
    } else {
        // Use default configuration
        Config::default()
    };

    // Override with CLI arguments
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = Some(timeout);
    }

    if let Some(user_agent) = &args.user_agent {
        config.user_agent = Some(user_agent.clone());
    }

    validate_config(&config)?;

    info!("Configuration loaded successfully");
    info!("Request timeout: {:?}", config.request_timeout());
    info!("Output format: {:?}", config.output_format);

    Ok(config)
}
