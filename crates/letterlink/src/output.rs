use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use letterlink_frame::{LetterTriple, TcpResponse};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Bare value, one per line.
    Plain,
    Json,
    Table,
}

#[derive(Serialize)]
struct SumOutput<'a> {
    schema_id: &'a str,
    sum: u32,
    timestamp: String,
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    schema_id: &'a str,
    letters: String,
    valid: bool,
    status: u8,
    values: Option<[u16; 3]>,
    sum: Option<u64>,
    timestamp: String,
}

/// Print one sum received by endpoint A.
pub fn print_sum(sum: u32, format: OutputFormat) {
    match format {
        OutputFormat::Plain => println!("{sum}"),
        OutputFormat::Json => {
            let out = SumOutput {
                schema_id: "https://schemas.3leaps.dev/letterlink/cli/v1/sum-received.schema.json",
                sum,
                timestamp: now_unix_seconds(),
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
                .set_header(vec!["SUM"])
                .add_row(vec![sum.to_string()]);
            println!("{table}");
        }
    }
    flush_stdout();
}

/// Print the decoded TCP response to a probe request.
pub fn print_response(letters: &LetterTriple, response: &TcpResponse, format: OutputFormat) {
    let values = match response {
        TcpResponse::Valid(values) => Some(*values),
        TcpResponse::Invalid => None,
    };

    match format {
        OutputFormat::Plain => match values {
            Some([v1, v2, v3]) => println!("valid {v1} {v2} {v3}"),
            None => println!("invalid"),
        },
        OutputFormat::Json => {
            let out = ResponseOutput {
                schema_id:
                    "https://schemas.3leaps.dev/letterlink/cli/v1/probe-response.schema.json",
                letters: letters.to_string(),
                valid: values.is_some(),
                status: response.status(),
                values,
                sum: response.sum(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let describe = |v: Option<u64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LETTERS", "STATUS", "VALUES", "SUM"])
                .add_row(vec![
                    letters.to_string(),
                    if values.is_some() { "valid" } else { "invalid" }.to_string(),
                    values
                        .map(|v| format!("{} {} {}", v[0], v[1], v[2]))
                        .unwrap_or_else(|| "-".to_string()),
                    describe(response.sum()),
                ]);
            println!("{table}");
        }
    }
    flush_stdout();
}

// Sums are consumed line by line while the process keeps running.
fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
