use std::time::Duration;

use seqrpc_client::{Client, ClientConfig};
use seqrpc_wire::{code, Value};

use crate::cmd::CallArgs;
use crate::exit::{client_error, wire_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let params = parse_params(&args.params)?;

    let config = ClientConfig::default()
        .with_address(args.addr.clone())
        .with_read_timeout(timeout);
    let client = Client::connect(config).map_err(|err| client_error("connect failed", err))?;

    let resp = client
        .call(&args.service, &args.method, params)
        .map_err(|err| client_error("call failed", err))?;

    print_response(&resp, format);
    if resp.code == code::OK {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}

/// Each argument is tried as a JSON scalar first; bare words that do not
/// parse as JSON are sent as strings, so `hello` and `"hello"` are the same.
fn parse_params(raw: &[String]) -> CliResult<Vec<Value>> {
    let mut params = Vec::with_capacity(raw.len());
    for arg in raw {
        let json = serde_json::from_str::<serde_json::Value>(arg)
            .unwrap_or_else(|_| serde_json::Value::String(arg.clone()));
        let value = Value::from_json(&json)
            .map_err(|err| wire_error(&format!("argument '{arg}' not sendable"), err))?;
        params.push(value);
    }
    Ok(params)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
