//! Daemon mode – newline-delimited JSON requests over a Unix socket.
//!
//! Every connection gets its own calculator session, so two clients never
//! see each other's entry state.

use engine::types::*;
use engine::{CommandRegistry, KeyMap, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub async fn run_daemon(socket_path: PathBuf, options: EngineOptions, keymap: KeyMap) {
    // Remove stale socket if it exists
    let _ = std::fs::remove_file(&socket_path);

    let listener = match UnixListener::bind(&socket_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: cannot bind socket {}: {}", socket_path.display(), e);
            std::process::exit(2);
        }
    };

    eprintln!("calcctl daemon listening on {}", socket_path.display());
    serve(listener, options, keymap).await;
}

pub async fn serve(listener: UnixListener, options: EngineOptions, keymap: KeyMap) {
    let registry = Arc::new(CommandRegistry::new());
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let session = Session::new(options, keymap.clone());
                let registry = Arc::clone(&registry);
                tokio::spawn(handle_connection(stream, session, registry));
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept error");
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    mut session: Session,
    registry: Arc<CommandRegistry>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let response = handle_request(&line, &mut session, &registry);
        let mut resp_json = serde_json::to_string(&response).unwrap_or_else(|_| "{}".into());
        resp_json.push('\n');
        if writer.write_all(resp_json.as_bytes()).await.is_err() {
            break;
        }
    }
    tracing::debug!("client disconnected");
}

fn error_response(id: String, message: String) -> DaemonResponse {
    DaemonResponse {
        id,
        result: None,
        error: Some(ErrorInfo {
            code: ErrorCode::InvalidInput,
            message,
            details: serde_json::Value::Null,
        }),
    }
}

fn handle_request(
    line: &str,
    session: &mut Session,
    registry: &CommandRegistry,
) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return error_response("unknown".into(), format!("invalid JSON request: {}", e));
        }
    };

    let result = match req.method.as_str() {
        "call" => {
            let cmd_name = req.params.get("cmd").and_then(|v| v.as_str()).unwrap_or("");
            let args = req
                .params
                .get("args")
                .cloned()
                .unwrap_or(serde_json::Value::Object(Default::default()));
            registry.execute(cmd_name, args, session)
        }
        "keys" => registry.execute("keys", req.params.clone(), session),
        "reset" => {
            session.reset();
            registry.execute("state", serde_json::Value::Null, session)
        }
        other => {
            return error_response(req.id, format!("unknown method: {}", other));
        }
    };

    DaemonResponse {
        id: req.id,
        result: Some(result),
        error: None,
    }
}
