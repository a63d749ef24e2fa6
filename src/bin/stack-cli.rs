use std::path::PathBuf;

use clap::{Parser, Subcommand};

use serverless_bridge::config::{resolve_config, ConfigError};
use serverless_bridge::provisioning::synthesize;

#[derive(Parser)]
#[command(name = "stack-cli")]
#[command(about = "Render the cloud resources fronting the bridge", long_about = None)]
struct Cli {
    /// Configuration file (TOML) whose [stack] section describes the resources.
    #[arg(short, long, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CloudFormation template
    Synth {
        /// Require an API key and usage plan regardless of the config file
        #[arg(long)]
        api_key_required: bool,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Check the stack configuration and exit
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Commands::Synth {
            api_key_required,
            pretty,
        } => {
            let mut stack = config.stack;
            stack.api_key_required |= api_key_required;

            let template = synthesize(&stack);
            let rendered = if pretty {
                serde_json::to_string_pretty(&template)?
            } else {
                serde_json::to_string(&template)?
            };
            println!("{}", rendered);
        }
        Commands::Validate => {
            println!("stack '{}' is valid", config.stack.function_name);
        }
    }

    Ok(())
}
