use seqrpc_server::{Server, ServerConfig, ServiceDef};
use seqrpc_wire::Response;

use crate::cmd::ServeArgs;
use crate::exit::{server_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let server = Server::new(ServerConfig::default().with_address(args.addr));
    server
        .register(echo_service())
        .map_err(|err| server_error("registration failed", err))?;

    server
        .serve()
        .map_err(|err| server_error("serve failed", err))?;
    Ok(SUCCESS)
}

/// Built-in diagnostics service for connectivity and marshaling checks.
fn echo_service() -> ServiceDef {
    ServiceDef::new("Echo")
        .method("Ping", || Response::ok("pong"))
        .method("Echo", |s: String| Response::ok(s))
        .method("Sum", |a: i64, b: i64| Response::ok(a + b))
}
