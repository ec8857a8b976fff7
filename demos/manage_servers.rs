use anyhow::Context;
use mcp_server_manager::{LogReport, ServerManager, StartOptions, Status, ToolOutcome};
use serde_json::json;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=mcp_server_manager=debug shows every launch, probe and session
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    tracing::info!("Starting manage_servers example");

    let mut args = std::env::args().skip(1);
    let script = args
        .next()
        .context("usage: manage_servers <server script> [config file]")?;

    let mut manager = match args.next() {
        Some(config_path) => ServerManager::from_config_file(&config_path)
            .with_context(|| format!("loading {}", config_path))?,
        None => ServerManager::default(),
    };

    println!("Starting '{}'...", script);
    let report = manager.start("demo", &script, StartOptions::new()).await;
    println!("[{:?}] {}", report.status, report.message);
    if report.status == Status::Error {
        return Ok(());
    }

    println!("\nServer ports: {:?}", manager.server_ports());
    println!("Healthy: {}", manager.check_health("demo").await);

    let tools = manager.list_tools("demo").await;
    println!("\nAvailable tools:");
    for tool in &tools {
        println!("- {}: {}", tool.name, tool.description);
    }

    if let Some(tool) = tools.first() {
        println!("\nCalling '{}' with no arguments...", tool.name);
        match manager.test_tool("demo", &tool.name, json!({})).await {
            ToolOutcome::Ok { result } => println!("result: {}", result),
            ToolOutcome::Error { message } => println!("error: {}", message),
        }
    }

    println!("\nFunction specs:");
    for spec in manager.function_specs().await {
        println!("{}", spec);
    }

    match manager.show_logs("demo", 10, true).await {
        LogReport::Ok { lines, log_file } => {
            println!("\nLast lines of {}:", log_file.display());
            for line in lines {
                println!("  {}", line);
            }
        }
        LogReport::Error { message } => println!("\n{}", message),
    }

    println!("\nStopping servers...");
    let report = manager.stop_all().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("manage_servers example finished");
    Ok(())
}
