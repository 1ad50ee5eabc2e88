//! Vehicle Enquiry — entry point.

use std::path::PathBuf;

use anyhow::bail;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use vehicle_enquiry::config::DEFAULT_TIMEOUT_MS;
use vehicle_enquiry::VehicleEnquiry;
use vehicle_enquiry_cli::output::{render_layout, render_record};
use vehicle_enquiry_cli::settings::{build_config, load_layout};

#[derive(Debug, Parser)]
#[command(
    name = "vehicle-enquiry",
    about = "Vehicle Enquiry — look up a registration mark and print the vehicle record as JSON",
    version
)]
struct Cli {
    /// Registration mark to look up (shorthand for `check <VRM>`).
    vrm: Option<String>,

    /// Base URL of the enquiry service.
    /// Also reads from VEHICLE_ENQUIRY_URL env var.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Page layout JSON file replacing the embedded one.
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout: u64,

    /// Indent the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up a registration mark.
    Check {
        /// Registration mark, e.g. AB12CDE.
        vrm: String,
    },

    /// Print the effective page layout as JSON.
    Layout,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   vehicle-enquiry completions bash > ~/.local/share/bash-completion/completions/vehicle-enquiry
    ///   vehicle-enquiry completions zsh > ~/.zfunc/_vehicle-enquiry
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let vrm = match cli.command {
        Some(Commands::Check { vrm }) => vrm,
        Some(Commands::Layout) => {
            let layout = load_layout(cli.layout.as_deref())?;
            println!("{}", render_layout(&layout)?);
            return Ok(());
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "vehicle-enquiry",
                &mut std::io::stdout(),
            );
            return Ok(());
        }
        None => match cli.vrm {
            Some(vrm) => vrm,
            None => bail!("provide a registration mark, e.g. `vehicle-enquiry AB12CDE`"),
        },
    };

    let layout = load_layout(cli.layout.as_deref())?;
    let config = build_config(cli.base_url.as_deref(), cli.timeout);
    tracing::debug!("using {}", config.base_url);

    let enquiry = VehicleEnquiry::with_layout(config, &layout)?;
    let record = enquiry.check(&vrm).await?;

    println!("{}", render_record(&record, cli.pretty)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flag_before_subcommand() {
        let cli = parse(&["vehicle-enquiry", "--layout", "f.json", "layout"]);
        assert!(matches!(cli.command, Some(Commands::Layout)));
        assert!(cli.vrm.is_none());
        assert_eq!(cli.layout, Some(PathBuf::from("f.json")));

        let cli = parse(&["vehicle-enquiry", "--base-url", "http://x", "check", "AB12CDE"]);
        assert!(matches!(cli.command, Some(Commands::Check { ref vrm }) if vrm == "AB12CDE"));
        assert_eq!(cli.base_url.as_deref(), Some("http://x"));

        let cli = parse(&["vehicle-enquiry", "--pretty", "check", "AB12CDE"]);
        assert!(cli.pretty);
        assert!(matches!(cli.command, Some(Commands::Check { .. })));
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = parse(&["vehicle-enquiry", "check", "AB12CDE", "--pretty", "--timeout", "500"]);
        assert!(cli.pretty);
        assert_eq!(cli.timeout, 500);
        assert!(matches!(cli.command, Some(Commands::Check { ref vrm }) if vrm == "AB12CDE"));
    }

    #[test]
    fn test_bare_mark_shorthand() {
        let cli = parse(&["vehicle-enquiry", "AB12CDE", "--pretty"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.vrm.as_deref(), Some("AB12CDE"));
        assert!(cli.pretty);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_MS);
    }
}
