//! TCP IPC server: accept loop and per-connection handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::ipc::codec::{
    decode_msgpack, encode_msgpack, read_frame, write_frame, MSG_ERROR, MSG_REQUEST, MSG_RESPONSE,
};
use crate::ipc::router::{route_request, IpcRequest, ServiceContext};
use crate::types::{Error, IpcConfig};

/// IPC server exposing the DeviceHub and tools services.
#[derive(Debug)]
pub struct IpcServer {
    context: Arc<ServiceContext>,
    addr: SocketAddr,
    cancel: CancellationToken,
    ipc_config: IpcConfig,
}

impl IpcServer {
    pub fn new(context: Arc<ServiceContext>, addr: SocketAddr, ipc_config: IpcConfig) -> Self {
        Self {
            context,
            addr,
            cancel: CancellationToken::new(),
            ipc_config,
        }
    }

    /// Bind the configured address and run until cancelled.
    pub async fn serve(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener).await
    }

    /// Run the accept loop on an already bound listener.
    pub async fn serve_on(&self, listener: TcpListener) -> std::io::Result<()> {
        let conn_semaphore = Arc::new(Semaphore::new(self.ipc_config.max_connections));
        tracing::info!(
            "IPC server listening on {} (max_connections={})",
            listener.local_addr()?,
            self.ipc_config.max_connections,
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("IPC server shutting down");
                    break;
                }
                accept = listener.accept() => {
                    let (stream, peer) = accept?;

                    // Backpressure when at capacity.
                    let permit = match conn_semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            tracing::warn!(
                                "Connection from {} rejected: at max_connections ({})",
                                peer,
                                self.ipc_config.max_connections,
                            );
                            drop(stream);
                            continue;
                        }
                    };

                    tracing::debug!("IPC connection from {} (active={})",
                        peer,
                        self.ipc_config.max_connections - conn_semaphore.available_permits(),
                    );
                    let context = self.context.clone();
                    let cancel = self.cancel.clone();
                    let ipc_config = self.ipc_config.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, context, cancel, ipc_config, permit).await {
                            tracing::warn!("Connection from {} error: {}", peer, e);
                        }
                    });
                }
            }
        }
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

fn error_payload(id: &str, code: &str, message: String) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "ok": false,
        "error": {
            "code": code,
            "message": message,
        }
    })
}

/// Handle a single TCP connection: read frames → route → write responses.
async fn handle_connection(
    stream: TcpStream,
    context: Arc<ServiceContext>,
    cancel: CancellationToken,
    ipc_config: IpcConfig,
    _permit: OwnedSemaphorePermit, // held for connection lifetime
) -> std::io::Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let read_timeout = ipc_config.read_timeout;
    let write_timeout = ipc_config.write_timeout;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame_result = tokio::time::timeout(read_timeout, read_frame(&mut reader, ipc_config.max_frame_bytes)) => {
                let (msg_type, payload_bytes) = match frame_result {
                    Err(_elapsed) => {
                        tracing::debug!("Read timeout ({:?}), dropping connection", read_timeout);
                        break;
                    }
                    Ok(result) => match result? {
                        Some(f) => f,
                        None => break, // clean EOF
                    },
                };

                if msg_type != MSG_REQUEST {
                    let err_payload = error_payload(
                        "",
                        "INVALID_ARGUMENT",
                        format!("Unexpected message type: 0x{:02X}", msg_type),
                    );
                    timed_write(&mut writer, MSG_ERROR, &encode_msgpack(&err_payload)?, write_timeout).await?;
                    continue;
                }

                let request: IpcRequest = match decode_msgpack(&payload_bytes) {
                    Ok(v) => v,
                    Err(e) => {
                        let err_payload = error_payload("", "INVALID_ARGUMENT", format!("Invalid msgpack: {}", e));
                        timed_write(&mut writer, MSG_ERROR, &encode_msgpack(&err_payload)?, write_timeout).await?;
                        continue;
                    }
                };

                let request_id = request.id.clone();
                tracing::debug!(
                    id = %request_id,
                    service = %request.service,
                    method = %request.method,
                    "IPC request"
                );

                match route_request(&context, request).await {
                    Ok(body) => {
                        let response = serde_json::json!({
                            "id": request_id,
                            "ok": true,
                            "body": body,
                        });
                        timed_write(&mut writer, MSG_RESPONSE, &encode_msgpack(&response)?, write_timeout).await?;
                    }
                    Err(e) => {
                        if !matches!(e, Error::Validation(_) | Error::NotFound(_)) {
                            tracing::warn!(id = %request_id, error = %e, "IPC request failed");
                        }
                        let response = error_payload(&request_id, e.to_ipc_error_code(), e.to_string());
                        timed_write(&mut writer, MSG_ERROR, &encode_msgpack(&response)?, write_timeout).await?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Write a frame with a timeout. Slow consumers lose their connection.
async fn timed_write<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg_type: u8,
    payload: &[u8],
    timeout: Duration,
) -> std::io::Result<()> {
    tokio::time::timeout(timeout, write_frame(writer, msg_type, payload))
        .await
        .map_err(|_| {
            tracing::warn!("Write timeout ({:?}), dropping connection", timeout);
            std::io::Error::new(std::io::ErrorKind::TimedOut, "write timeout")
        })?
}
