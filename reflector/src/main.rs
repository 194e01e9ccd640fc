use anyhow::Context;
use colored::Colorize;
use commands::command_argument_builder;
use reflector::handlers;
use reflector_core::Fetcher;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber;

mod commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();
    let quiet = matches.get_flag("quiet");

    tracing_subscriber::fmt::init();

    if !quiet {
        print_banner();
    }

    // clap fills the defaults, these are always present
    let bind = matches
        .get_one::<String>("bind")
        .map(String::as_str)
        .unwrap_or("0.0.0.0");
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let timeout = matches.get_one::<u64>("timeout").copied().unwrap_or(10);

    let fetcher = Arc::new(Fetcher::with_timeout(timeout));
    let app = handlers::router(fetcher);

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn print_banner() {
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!("{}", "  REFLECTOR".bright_white().bold());
    println!(
        "{}",
        "  single-hop page proxy with reference rewriting".bright_cyan()
    );
    println!("  v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
