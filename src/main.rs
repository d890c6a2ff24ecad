//! Switchyard binary
//!
//! Runs the HTTP server by default; see `switchyard --help` for the other
//! subcommands.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use switchyard::cli::{Cli, Command, generate_config_template};
use switchyard::config::Config;
use switchyard::generation::{GenerationRequest, ResponseFormat};
use switchyard::handlers::{self, AppState};
use switchyard::metrics::Metrics;
use switchyard::registry::ProviderRegistry;
use switchyard::router::Router;
use switchyard::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { output }) => write_template(output.as_deref()),
        Some(Command::Providers) => list_providers(&cli.config),
        Some(Command::Generate {
            category,
            json,
            system,
            prompt,
        }) => {
            let mut request = GenerationRequest::from_prompt(prompt, category.into());
            if json {
                request = request.with_response_format(ResponseFormat::Json);
            }
            if let Some(system) = system {
                request = request.with_system_instruction(system);
            }
            generate_once(&cli.config, request).await
        }
        Some(Command::Serve) | None => serve(&cli.config).await,
    }
}

fn write_template(output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let template = generate_config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)?;
            println!("Configuration template written to {}", path);
        }
        None => print!("{}", template),
    }
    Ok(())
}

fn list_providers(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    let registry = ProviderRegistry::from_config(&config);

    println!(
        "{:<16} {:<11} {:>5} {:>8}  {:<22} STATUS",
        "NAME", "KIND", "RPM", "PRIORITY", "API KEY ENV"
    );
    for provider in registry.all() {
        let status = if provider.enabled() {
            "enabled"
        } else if provider.entry().disabled() {
            "disabled"
        } else {
            "missing credential"
        };
        println!(
            "{:<16} {:<11} {:>5} {:>8}  {:<22} {}",
            provider.name(),
            provider.kind().as_str(),
            provider.requests_per_minute(),
            provider.priority(),
            provider.entry().api_key_env(),
            status
        );
    }
    Ok(())
}

async fn generate_once(
    config_path: &str,
    request: GenerationRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);

    let registry = ProviderRegistry::from_config(&config);
    let router = Router::new(&registry, Arc::new(Metrics::new()?))?;

    let response = router.generate(&request).await?;
    eprintln!(
        "[{} / {}{}]",
        response.provider_name,
        response.model_used,
        response
            .tokens_used
            .map(|t| format!(", {} tokens", t))
            .unwrap_or_default()
    );
    println!("{}", response.text);
    Ok(())
}

async fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Config::from_file(config_path)?);
    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting Switchyard server on {}:{}",
        config.server.host,
        config.server.port
    );

    let state = AppState::new(config.clone())?;
    let app = handlers::build_app(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Generation endpoint at http://{}/v1/generate", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
