mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::WisdomClient;
use output::{OutputConfig, OutputFormat};
use std::process;
use wisdom21::config;

/// CLI for the wisdom21 server
#[derive(Parser, Debug)]
#[clap(name = "wisdom21-cli", about = "CLI for the 21/21 wisdom scheduler")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "WISDOM21_URL", global = true)]
    server_url: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage wisdom
    #[command(subcommand)]
    Wisdom(commands::wisdom::WisdomCommands),
    /// Move wisdom through its cycle
    #[command(subcommand)]
    Cycle(commands::cycle::CycleCommands),
    /// Show the next wisdom and count the exposure
    Show {
        /// Only look at what would be shown, without counting it
        #[clap(long)]
        peek: bool,
    },
    /// Counts per cycle state and today's progress
    Summary,
    /// Manage categories
    #[command(subcommand)]
    Category(commands::category::CategoryCommands),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > http://localhost:3021
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    if let Some(dir) = config::get_config_dir_path() {
        let config_path = dir.join("config.toml");
        if let Ok(update) = config::config_from_file(Some(config_path)) {
            if let Some(url) = update.server_url {
                return url;
            }
        }
    }

    "http://localhost:3021".to_string()
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!(
            "Could not connect to server. Is wisdom21 running?\n  {}",
            err_string
        );
    }

    err_string
}

/// Shows or peeks at the next wisdom
async fn show(
    client: &WisdomClient,
    peek: bool,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let display = if peek {
        let wisdom = client.peek_next().await?;
        let summary = client.summary().await?;
        wisdom21::dto::DisplayDto {
            daily_target_met: wisdom.is_none() && summary.active > 0,
            wisdom,
            recorded: false,
        }
    } else {
        client.show_next().await?
    };
    output::print_display(&display, config);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = WisdomClient::new(server_url);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Wisdom(cmd) => commands::wisdom::execute(&client, cmd, &output_config).await,
        Commands::Cycle(cmd) => commands::cycle::execute(&client, cmd, &output_config).await,
        Commands::Show { peek } => show(&client, peek, &output_config).await,
        Commands::Summary => match client.summary().await {
            Ok(summary) => {
                output::print_summary(&summary, &output_config);
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
        Commands::Category(cmd) => commands::category::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
