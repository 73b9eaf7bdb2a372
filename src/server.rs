use std::{fs, io::ErrorKind, os::unix::fs::FileTypeExt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
};
use tokio_util::sync::CancellationToken;

use crate::{
    orchestrator::Orchestrator,
    protocol::{Ack, ClientMessage, ServerMessage, parse_client_message},
};

/// Serves NDJSON requests on a unix socket until `shutdown` fires or a client sends
/// `{"type":"exit"}`.
pub async fn serve(
    socket_path: &Path,
    orchestrator: Arc<Orchestrator>,
    shutdown: CancellationToken,
) -> Result<()> {
    prepare_socket_path(socket_path)?;
    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("unable to bind socket {}", socket_path.display()))?;
    tracing::info!(target: "server", socket = %socket_path.display(), "server_listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accept_result = listener.accept() => match accept_result {
                Ok((stream, _)) => {
                    let orchestrator = Arc::clone(&orchestrator);
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_client(stream, orchestrator, shutdown).await {
                            tracing::warn!(target: "server", error = %format!("{err:#}"), "client_handling_failed");
                        }
                    });
                }
                Err(err) => tracing::warn!(target: "server", error = %err, "accept_failed"),
            },
        }
    }

    cleanup_socket_path(socket_path)?;
    tracing::info!(target: "server", "server_stopped");
    Ok(())
}

async fn handle_client(
    stream: UnixStream,
    orchestrator: Arc<Orchestrator>,
    shutdown: CancellationToken,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        // EOF only means the client sent its last request; buffered lines still get answers.
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => match line.context("unable to read client line")? {
                Some(line) => line,
                None => break,
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match parse_client_message(line) {
            Ok(ClientMessage::Exit) => {
                tracing::info!(target: "server", "exit_requested");
                shutdown.cancel();
                break;
            }
            Ok(message) => match dispatch(&orchestrator, message, &shutdown).await {
                Some(response) => response,
                None => {
                    tracing::info!(target: "server", "run_cancelled");
                    break;
                }
            },
            Err(err) => {
                tracing::warn!(target: "server", error = %err, "invalid_protocol_message");
                ServerMessage::invalid_request(err.to_string())
            }
        };

        // A client that hung up fails here, and its remaining lines are never run.
        writer
            .write_all(response.to_line()?.as_bytes())
            .await
            .context("client hung up before its response was written")?;
    }

    Ok(())
}

/// Runs one request. `None` when shutdown cancelled it mid-run; whatever the run
/// already committed stays in the session store.
async fn dispatch(
    orchestrator: &Orchestrator,
    message: ClientMessage,
    cancel: &CancellationToken,
) -> Option<ServerMessage> {
    let run = async {
        match message {
            ClientMessage::Assess(request) => {
                ServerMessage::Outcome(orchestrator.assess(request).await)
            }
            ClientMessage::Guide(request) => {
                ServerMessage::Outcome(orchestrator.guide(request).await)
            }
            ClientMessage::Recheck {
                session_id,
                response,
            } => ServerMessage::Outcome(orchestrator.recheck(&session_id, response).await),
            ClientMessage::CompleteStep {
                session_id,
                step_id,
            } => match orchestrator.complete_step(&session_id, step_id).await {
                Ok(completed_steps) => ServerMessage::Ack(Ack::StepCompleted {
                    session_id,
                    completed_steps,
                }),
                Err(err) => ServerMessage::invalid_request(err.to_string()),
            },
            ClientMessage::Exit => ServerMessage::invalid_request("exit is handled by the connection"),
        }
    };

    tokio::select! {
        response = run => Some(response),
        _ = cancel.cancelled() => None,
    }
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_socket() || metadata.is_file() => {
            fs::remove_file(path)
                .with_context(|| format!("unable to remove stale socket {}", path.display()))
        }
        Ok(_) => bail!(
            "socket path exists and is not a file or socket: {}",
            path.display()
        ),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to inspect {}", path.display())),
    }
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
