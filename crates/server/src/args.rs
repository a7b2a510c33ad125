use clap::Parser;
use derive_builder::Builder;

#[derive(Debug, Clone, Parser, Builder)]
#[clap(
    about = "Serve decoded contract storage over HTTP",
    override_usage = "slotscope serve [OPTIONS]"
)]
/// Arguments for the serve operation
pub struct ServeArgs {
    /// The address to bind to, overriding the configured one.
    #[clap(long)]
    pub bind: Option<String>,

    /// The port to listen on, overriding the configured one.
    #[clap(long, short)]
    pub port: Option<u16>,
}

impl ServeArgsBuilder {
    /// Creates a new ServeArgsBuilder with default values
    pub fn new() -> Self {
        Self { bind: Some(None), port: Some(None) }
    }
}
