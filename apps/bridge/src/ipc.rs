//! # IPC Protocol
//!
//! Line-delimited JSON between the bridge and the rendering layer.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  stdin  (one request per line)                                          │
//! │    {"id": 1, "command": "get_budget"}                                   │
//! │    {"id": 2, "command": "add_item", "args": {"name": "Sugar", ...}}     │
//! │                                                                         │
//! │  stdout (responses and events, one per line)                            │
//! │    {"id": 1, "ok": true,  "data": {...}}                                │
//! │    {"id": 2, "ok": false, "error": {"code": "...", "message": "..."}}   │
//! │    {"event": "budget_changed", "payload": {...}}                        │
//! │    {"event": "rate_settled",   "payload": {...}}                        │
//! │                                                                         │
//! │  Events raised by a command are written right after its response.      │
//! │  A line that cannot be parsed gets an INVALID_REQUEST response and the │
//! │  session continues. The loop ends when stdin closes.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::budget::{
    self, CreatePartialTotalArgs, DeleteItemArgs, EditItemArgs, ItemArgs, PartialTotalArgs,
    RenamePartialTotalArgs, SetPercentageArgs,
};
use crate::commands::rate::{self, PreviewArgs};
use crate::commands::config;
use crate::error::ApiError;
use crate::events::{BudgetEvent, BudgetEventEmitter};
use crate::state::{AppConfig, BudgetState};

// =============================================================================
// Messages
// =============================================================================

/// A command with its arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    GetBudget,
    AddItem(ItemArgs),
    EditItem(EditItemArgs),
    DeleteItem(DeleteItemArgs),
    CreatePartialTotal(CreatePartialTotalArgs),
    DeletePartialTotal(PartialTotalArgs),
    RenamePartialTotal(RenamePartialTotalArgs),
    SetPercentage(SetPercentageArgs),
    GetFormattedTotals,
    GetRate,
    PreviewConversion(PreviewArgs),
    GetConfig,
}

/// A parsed request line.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: Option<u64>,
    pub command: Command,
}

#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    id: Option<u64>,
    command: String,
    #[serde(default)]
    args: Value,
}

impl Request {
    /// Parses one request line.
    ///
    /// On failure the request id is still returned when it could be read,
    /// so the error response can be matched by the caller.
    pub fn parse(line: &str) -> Result<Request, (Option<u64>, ApiError)> {
        let raw: RawRequest = serde_json::from_str(line)
            .map_err(|e| (None, ApiError::invalid_request(format!("Malformed request: {}", e))))?;

        let mut tagged = Map::new();
        tagged.insert("command".into(), Value::String(raw.command.clone()));
        if !is_unit_command(&raw.command) {
            // Commands whose arguments are all optional may omit "args".
            let args = match raw.args {
                Value::Null => Value::Object(Map::new()),
                args => args,
            };
            tagged.insert("args".into(), args);
        }

        let command = serde_json::from_value::<Command>(Value::Object(tagged)).map_err(|e| {
            (
                raw.id,
                ApiError::invalid_request(format!("Invalid command '{}': {}", raw.command, e)),
            )
        })?;

        Ok(Request { id: raw.id, command })
    }
}

fn is_unit_command(command: &str) -> bool {
    matches!(
        command,
        "get_budget" | "get_formatted_totals" | "get_rate" | "get_config"
    )
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    pub fn success(id: Option<u64>, data: Value) -> Self {
        Response {
            id,
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Option<u64>, error: ApiError) -> Self {
        Response {
            id,
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Everything commands can be given.
#[derive(Clone)]
pub struct BridgeContext {
    pub budget: BudgetState,
    pub config: Arc<AppConfig>,
    pub emitter: Arc<dyn BudgetEventEmitter>,
}

/// Runs one command.
pub fn dispatch(ctx: &BridgeContext, command: Command) -> Result<Value, ApiError> {
    let state = &ctx.budget;
    let emitter = ctx.emitter.as_ref();
    let display = &ctx.config.display;

    let data = match command {
        Command::GetBudget => serde_json::to_value(budget::get_budget(state))?,
        Command::AddItem(args) => serde_json::to_value(budget::add_item(state, emitter, args)?)?,
        Command::EditItem(args) => serde_json::to_value(budget::edit_item(state, emitter, args)?)?,
        Command::DeleteItem(args) => serde_json::to_value(budget::delete_item(state, emitter, args))?,
        Command::CreatePartialTotal(args) => {
            serde_json::to_value(budget::create_partial_total(state, emitter, args)?)?
        }
        Command::DeletePartialTotal(args) => {
            serde_json::to_value(budget::delete_partial_total(state, emitter, args))?
        }
        Command::RenamePartialTotal(args) => {
            serde_json::to_value(budget::rename_partial_total(state, emitter, args)?)?
        }
        Command::SetPercentage(args) => {
            serde_json::to_value(budget::set_percentage(state, emitter, args))?
        }
        Command::GetFormattedTotals => {
            serde_json::to_value(budget::get_formatted_totals(state, display))?
        }
        Command::GetRate => serde_json::to_value(rate::get_rate(state, display))?,
        Command::PreviewConversion(args) => {
            serde_json::to_value(rate::preview_conversion(state, args))?
        }
        Command::GetConfig => serde_json::to_value(config::get_config(&ctx.config))?,
    };

    Ok(data)
}

/// Parses, runs and answers one request line.
pub fn handle_line(ctx: &BridgeContext, line: &str) -> Response {
    match Request::parse(line) {
        Ok(request) => {
            debug!(id = ?request.id, command = ?request.command, "Request received");
            match dispatch(ctx, request.command) {
                Ok(data) => Response::success(request.id, data),
                Err(error) => {
                    debug!(id = ?request.id, error = %error, "Command failed");
                    Response::failure(request.id, error)
                }
            }
        }
        Err((id, error)) => {
            warn!(error = %error.message, "Rejected request line");
            Response::failure(id, error)
        }
    }
}

// =============================================================================
// Serve Loop
// =============================================================================

async fn write_line<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

async fn drain_events<W>(
    writer: &mut W,
    events: &mut mpsc::UnboundedReceiver<BudgetEvent>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Ok(event) = events.try_recv() {
        write_line(writer, &event).await?;
    }
    Ok(())
}

/// Serves requests from `reader` until it reaches EOF.
///
/// Events are written as they arrive, also between requests.
pub async fn serve<R, W>(
    ctx: &BridgeContext,
    reader: R,
    mut writer: W,
    mut events: mpsc::UnboundedReceiver<BudgetEvent>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = handle_line(ctx, &line);
                write_line(&mut writer, &response).await?;
                drain_events(&mut writer, &mut events).await?;
            }
            Some(event) = events.recv() => {
                write_line(&mut writer, &event).await?;
            }
        }
    }

    debug!("Input closed, stopping IPC loop");
    drain_events(&mut writer, &mut events).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::events::ChannelEmitter;
    use cambio_core::{BudgetEngine, Markup};
    use serde_json::json;

    fn context() -> (BridgeContext, mpsc::UnboundedReceiver<BudgetEvent>) {
        let mut engine = BudgetEngine::new();
        engine.set_exchange_rate(40.0);
        let (emitter, rx) = ChannelEmitter::channel();
        let ctx = BridgeContext {
            budget: BudgetState::new(engine, Markup::NONE),
            config: Arc::new(AppConfig::default()),
            emitter: Arc::new(emitter),
        };
        (ctx, rx)
    }

    fn output_lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_requests() {
        let request = Request::parse(r#"{"id":1,"command":"get_budget"}"#).unwrap();
        assert_eq!(request.id, Some(1));
        assert!(matches!(request.command, Command::GetBudget));

        let request = Request::parse(r#"{"id":2,"command":"get_rate","args":{}}"#).unwrap();
        assert!(matches!(request.command, Command::GetRate));

        let request = Request::parse(r#"{"id":3,"command":"create_partial_total"}"#).unwrap();
        assert!(matches!(request.command, Command::CreatePartialTotal(ref a) if a.name.is_none()));

        let request = Request::parse(
            r#"{"id":4,"command":"add_item","args":{"name":"Sugar","quantity":2,"priceUsd":3}}"#,
        )
        .unwrap();
        assert!(matches!(request.command, Command::AddItem(ref a) if a.quantity == json!(2)));
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let (id, err) = Request::parse("not json").unwrap_err();
        assert_eq!(id, None);
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let (id, err) = Request::parse(r#"{"id":9,"command":"launch_rockets"}"#).unwrap_err();
        assert_eq!(id, Some(9));
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let (id, _) = Request::parse(r#"{"id":10,"command":"edit_item","args":{"name":"x"}}"#)
            .unwrap_err();
        assert_eq!(id, Some(10));

        let (id, _) = Request::parse(r#"{"id":11,"command":"add_item","args":5}"#).unwrap_err();
        assert_eq!(id, Some(11));
    }

    #[test]
    fn test_handle_line_reports_form_errors() {
        let (ctx, _rx) = context();

        for args in [
            r#"{"name":"Sugar","quantity":1.5,"priceUsd":3}"#,
            r#"{"name":"Sugar","quantity":"","priceUsd":3}"#,
            r#"{"name":"","quantity":1,"priceUsd":3}"#,
            r#"{"name":"Sugar","quantity":1,"priceUsd":"abc"}"#,
        ] {
            let line = format!(r#"{{"id":6,"command":"add_item","args":{}}}"#, args);
            let response = handle_line(&ctx, &line);
            assert!(!response.ok, "{}", args);
            assert_eq!(response.error.unwrap().code, ErrorCode::ValidationError, "{}", args);
        }

        let response = handle_line(
            &ctx,
            r#"{"id":7,"command":"add_item","args":{"name":"Soap","quantity":1,"priceUsd":"abc","priceVes":"80"}}"#,
        );
        assert!(response.ok);
        let data = response.data.unwrap();
        assert_eq!(data["items"][0]["priceVes"], 80.0);
        assert_eq!(data["items"][0]["priceUsd"], 2.0);
    }

    #[test]
    fn test_handle_line_reports_core_errors() {
        let (ctx, _rx) = context();
        let response = handle_line(&ctx, r#"{"id":5,"command":"create_partial_total","args":{}}"#);
        assert!(!response.ok);
        assert_eq!(response.id, Some(5));
        assert_eq!(response.error.unwrap().code, ErrorCode::EmptyBudget);
    }

    #[test]
    fn test_response_wire_format() {
        let json = serde_json::to_value(Response::success(Some(1), json!({"a": 1}))).unwrap();
        assert_eq!(json, json!({"id": 1, "ok": true, "data": {"a": 1}}));

        let json = serde_json::to_value(Response::failure(None, ApiError::internal("boom"))).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], "INTERNAL");
    }

    #[tokio::test]
    async fn test_serve_session() {
        let (ctx, rx) = context();
        let input = [
            r#"{"id":1,"command":"add_item","args":{"name":"Sugar","quantity":2,"priceUsd":3}}"#,
            "garbage",
            "",
            r#"{"id":2,"command":"create_partial_total","args":{"name":"Groceries"}}"#,
            r#"{"id":3,"command":"add_item","args":{"name":"Soap","quantity":1,"priceVes":80}}"#,
            r#"{"id":4,"command":"set_percentage","args":{"percentage":"10"}}"#,
            r#"{"id":5,"command":"get_budget"}"#,
        ]
        .join("\n");

        let mut output = Vec::new();
        serve(&ctx, input.as_bytes(), &mut output, rx).await.unwrap();
        let lines = output_lines(&output);

        // 5 successful responses, 1 rejection, 4 change events.
        assert_eq!(lines.len(), 10);

        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[0]["data"]["items"][0]["totalVes"], 240.0);
        assert_eq!(lines[1]["event"], "budget_changed");

        assert_eq!(lines[2]["ok"], false);
        assert_eq!(lines[2]["error"]["code"], "INVALID_REQUEST");

        let last = lines.last().unwrap();
        assert_eq!(last["id"], 5);
        assert_eq!(last["data"]["aggregates"]["grandTotalUsd"], 8.0);
        assert_eq!(last["data"]["partialTotals"][0]["name"], "Groceries");
        let final_usd = last["data"]["aggregates"]["finalTotalUsd"].as_f64().unwrap();
        assert!((final_usd - 8.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_serve_forwards_background_events() {
        let (ctx, rx) = context();
        ctx.emitter.emit_changed(&ctx.budget.aggregates());

        let mut output = Vec::new();
        serve(&ctx, &b""[..], &mut output, rx).await.unwrap();

        let lines = output_lines(&output);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "budget_changed");
    }
}
