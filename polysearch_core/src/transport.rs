use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::mcp_server::JsonRpcHandler;

/// Newline-delimited JSON-RPC over stdio.
pub struct StdioTransport {
    handler: JsonRpcHandler,
}

impl StdioTransport {
    pub fn new(handler: JsonRpcHandler) -> Self {
        Self { handler }
    }

    /// Serve stdin → stdout until EOF.
    pub async fn run(&self) -> io::Result<()> {
        info!("Starting stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, input: R, mut output: W) -> io::Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let mut reader = BufReader::new(input);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!("EOF reached on input");
                        break;
                    }
                    Ok(_) => {
                        if !line.trim().is_empty() {
                            if let Err(e) = tx.send(line.clone()) {
                                error!("Failed to send line: {}", e);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Error reading input: {}", e);
                        break;
                    }
                }
            }
        });

        while let Some(line) = rx.recv().await {
            if let Some(response) = self.process_line(&line).await {
                write_response(&mut output, &response).await?;
            }
        }

        Ok(())
    }

    async fn process_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(request) => self.handler.handle_request(request).await,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                Some(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32700,
                        "message": "Parse error",
                        "data": e.to_string()
                    },
                    "id": null
                }))
            }
        }
    }
}

async fn write_response<W: AsyncWrite + Unpin>(output: &mut W, response: &Value) -> io::Result<()> {
    let response_str = serde_json::to_string(response)?;
    output.write_all(response_str.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    debug!(bytes = response_str.len(), "sent response");
    Ok(())
}
