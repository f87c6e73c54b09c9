use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod call;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Invoke a method on a remote service.
    Call(CallArgs),
    /// Run a diagnostics server with a built-in Echo service.
    Serve(ServeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, format),
        Command::Serve(args) => serve::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Service name.
    pub service: String,
    /// Method name.
    pub method: String,
    /// Arguments as JSON scalars (e.g. 1 2.5 '"text"' true). Bare words
    /// that are not valid JSON are sent as strings.
    pub params: Vec<String>,
    /// Server address.
    #[arg(long, env = "SEQRPC_ADDR", default_value = "127.0.0.1:9999")]
    pub addr: String,
    /// Response timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "SEQRPC_ADDR", default_value = "0.0.0.0:9999")]
    pub addr: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
