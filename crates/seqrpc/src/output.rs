use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use seqrpc_wire::Response;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    seq: u64,
    code: i32,
    message: &'a str,
    data: &'a serde_json::Value,
}

pub fn print_response(resp: &Response, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                seq: resp.seq,
                code: resp.code,
                message: &resp.message,
                data: &resp.data,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "CODE", "MESSAGE", "DATA"])
                .add_row(vec![
                    resp.seq.to_string(),
                    resp.code.to_string(),
                    resp.message.clone(),
                    resp.data.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "seq={} code={} message={} data={}",
                resp.seq, resp.code, resp.message, resp.data
            );
        }
    }
}
