use clap::{Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::time::Instant;
use subrequests::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse, compile and send nested find-or-create specs as one batch
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the subrequests of a spec and their dependencies
    Parse {
        /// Path to the spec JSON file
        spec_path: String,
    },
    /// Print the wire envelope a spec compiles to
    Compile {
        /// Path to the spec JSON file
        spec_path: String,
    },
    /// Send a spec to the backend and print the response for every subrequest
    Send {
        /// Path to the spec JSON file
        spec_path: String,
        /// Transport config JSON file; falls back to SUBREQUESTS_* variables
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Parse { spec_path } => run_parse(&spec_path),
        Command::Compile { spec_path } => run_compile(&spec_path),
        Command::Send { spec_path, config } => run_send(&spec_path, config.as_deref()).await,
    }
}

fn run_parse(spec_path: &str) {
    let spec = load_spec(spec_path);
    let graph = parse(&spec).unwrap_or_else(|e| exit_with_error(&format!("Parse failed: {}", e)));

    println!("{} subrequest(s):", graph.len());
    for descriptor in &graph {
        println!("  {}", descriptor.id);
        for dependency in &descriptor.depends_on {
            println!("      <- {}", dependency);
        }
    }
}

fn run_compile(spec_path: &str) {
    let spec = load_spec(spec_path);
    let graph = parse(&spec).unwrap_or_else(|e| exit_with_error(&format!("Parse failed: {}", e)));
    let envelope =
        compile(&graph).unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    print_json(&envelope);
}

async fn run_send(spec_path: &str, config_path: Option<&str>) {
    let spec = load_spec(spec_path);
    let config = match config_path {
        Some(path) => TransportConfig::from_file(path),
        None => TransportConfig::from_env(),
    }
    .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    let client = Subrequests::builder(HttpTransport::new(config)).build();
    let start = Instant::now();
    let responses = client
        .send(&spec)
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Batch failed: {}", e)));
    let duration = start.elapsed();

    print_json(&responses);

    let failed = responses.failures().count();
    eprintln!(
        "\n{} subrequest(s) answered in {:?}, {} failed",
        responses.len(),
        duration,
        failed
    );
    if failed > 0 {
        std::process::exit(2);
    }
}

fn load_spec(path: &str) -> Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read spec file '{}': {}", path, e)));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse spec JSON: {}", e)))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with_error(&format!("Failed to render JSON: {}", e)),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
