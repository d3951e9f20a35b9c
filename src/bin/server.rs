//! Chaff Server Binary
//!
//! Usage: chaff-server [OPTIONS]
//!
//! Runs with the default configuration when no option is given.
//!
//! Options:
//!   -c, --config <FILE>  Path to configuration file
//!   -d, --defaults       Run with the default configuration
//!   -g, --generate       Generate a configuration file
//!   -h, --help           Print help information

use std::env;

use chaff::server::{Server, ServerConfig, ServerConfigFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respects RUST_LOG (e.g. RUST_LOG=chaff=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return run_server(ServerConfig::default()).await;
    }

    match args[1].as_str() {
        "-h" | "--help" => {
            print_usage();
        }
        "-g" | "--generate" => {
            generate_config()?;
        }
        "-d" | "--defaults" => {
            run_server(ServerConfig::default()).await?;
        }
        "-c" | "--config" => {
            if args.len() < 3 {
                eprintln!("Error: --config requires a file path");
                return Ok(());
            }
            run_server(load_config(&args[2])?).await?;
        }
        "--show-config" => {
            if args.len() < 3 {
                eprintln!("Error: --show-config requires a file path");
                return Ok(());
            }
            show_config(&args[2])?;
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"Chaff Server - serves chaff shaped like its real traffic

USAGE:
    chaff-server [OPTIONS]

OPTIONS:
    -c, --config <FILE>     Path to configuration file
    -d, --defaults          Run with the default configuration
    -g, --generate          Generate a configuration file
    --show-config <FILE>    Validate a configuration file and print it
    -h, --help              Print help information

With no options the server runs with the default configuration.

EXAMPLES:
    Generate a configuration:
        chaff-server --generate > chaff.toml

    Run the server:
        chaff-server --config chaff.toml

    Send real and chaff traffic:
        curl http://localhost:8080/
        curl http://localhost:8080/chaff
"#
    );
}

fn load_config(path: &str) -> anyhow::Result<ServerConfig> {
    let content = std::fs::read_to_string(path)?;
    let config_file: ServerConfigFile = toml::from_str(&content)?;
    Ok(config_file.to_config()?)
}

fn generate_config() -> anyhow::Result<()> {
    let config_file = ServerConfigFile::from_config(&ServerConfig::default());

    println!("# Chaff Server Configuration");
    println!("# Generated: {}", chrono::Utc::now());
    println!("#");
    println!("# Set detector_header (e.g. \"X-Chaff\") to serve chaff from \"/\"");
    println!("# for requests carrying that header instead of from chaff_path.");
    println!();
    println!("{}", toml::to_string_pretty(&config_file)?);

    Ok(())
}

fn show_config(path: &str) -> anyhow::Result<()> {
    let config = load_config(path)?;

    println!("Listen:    {}:{}", config.listen_addr, config.listen_port);
    println!("Capacity:  {}", config.tracker.capacity);
    println!("Queue:     {}", config.tracker.queue_capacity);
    println!("Responder: {}", config.responder);
    match &config.detector_header {
        Some(header) => println!("Chaff:     requests to / with header {}", header),
        None => println!("Chaff:     {}", config.chaff_path),
    }

    Ok(())
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting chaff server on {}:{}",
        config.listen_addr,
        config.listen_port
    );
    tracing::info!(
        "Window capacity: {}, responder: {}",
        config.tracker.capacity,
        config.responder
    );

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
