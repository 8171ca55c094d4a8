//! SmartMark RPC server: JSON-RPC over stdin/stdout for a thin front-end.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::process::ExitCode;

use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use smartmark::app::App;
use smartmark::rpc_handler::handle_method;
use smartmark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

const LOG_FILTER_VAR: &str = "SMARTMARK_LOG";

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> io::Result<()> {
    let mut line = value.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = match SettingsEngine::from_env() {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "failed to load settings");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = engine.validate() {
        error!(error = %e, path = engine.get_config_path(), "invalid settings");
        return ExitCode::FAILURE;
    }

    let mut app = match App::from_settings(engine.get_settings().clone()) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to initialize SmartMark");
            return ExitCode::FAILURE;
        }
    };
    app.startup().await;

    let mut stdout = io::stdout();
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if write_line(&mut stdout, &ready).await.is_err() {
        return ExitCode::FAILURE;
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                match handle_method(&mut app, method, &params).await {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                }
            }
            Err(e) => json!({"id": null, "error": format!("parse error: {}", e)}),
        };

        if write_line(&mut stdout, &response).await.is_err() {
            break;
        }
    }

    app.shutdown();
    info!("stdin closed, exiting");
    ExitCode::SUCCESS
}
