pub(crate) mod error;
pub(crate) mod log_args;
pub(crate) mod output;

use error::Error;
use log_args::LogArgs;
use output::build_output_path;
use tracing::info;

use clap::{Parser, Subcommand};

use slotscope_common::utils::io::file::write_file;
use slotscope_config::{config, ConfigArgs};
use slotscope_server::{serve, ServeArgs};
use slotscope_storage::{inspect, InspectArgs};

#[derive(Debug, Parser)]
#[clap(name = "slotscope", version)]
pub struct Arguments {
    #[clap(subcommand)]
    pub sub: Subcommands,

    #[clap(flatten)]
    logs: LogArgs,
}

#[derive(Debug, Subcommand)]
#[clap(about = "Slotscope reads, decodes and serves the raw storage slots of deployed contracts.")]
pub enum Subcommands {
    #[clap(name = "serve", about = "Serve decoded contract storage over HTTP")]
    Serve(ServeArgs),

    #[clap(name = "inspect", about = "Fetch and decode a range of storage slots for a contract")]
    Inspect(InspectArgs),

    #[clap(name = "config", about = "Display and edit the current configuration")]
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Arguments::parse();

    // setup logging. the guard flushes the file writer when dropped
    let _guard = args
        .logs
        .init_tracing()
        .map_err(|e| Error::Generic(format!("failed to initialize tracing: {}", e)))?;

    match args.sub {
        Subcommands::Serve(cmd) => {
            serve(cmd).await?;
        }

        Subcommands::Inspect(cmd) => {
            let output = cmd.output.clone();
            let target = cmd.target.clone();
            let chain_id = cmd.chain_id;

            let storage = inspect(cmd).await?;
            let json = serde_json::to_string_pretty(&storage)?;

            if output == "print" {
                println!("{}", json);
            } else {
                let output_path = build_output_path(&output, chain_id, &target, "storage.json")
                    .map_err(|e| Error::Generic(format!("failed to build output path: {}", e)))?;

                write_file(&output_path, &json)
                    .map_err(|e| Error::Generic(format!("failed to write storage: {}", e)))?;
                info!("wrote {} slots to {}", storage.slots.len(), output_path);
            }
        }

        Subcommands::Config(cmd) => {
            config(cmd)?;
        }
    }

    Ok(())
}
