use crate::constants::MAX_LINE_BYTES;
use ledger_core::{LedgerError, OperationService, Reply, Response, Result};
use std::future::Future;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The caller sent the exit operation.
    Exit,
    /// The caller closed the connection.
    Disconnected,
}

/// Accept connections one at a time and serve each to completion before
/// accepting the next. Mining and repair run inline, so a long request
/// holds up every other caller until it finishes.
///
/// Transport errors end only the affected session; the ledger inside
/// `service` carries over to the next one. Returns once `shutdown` resolves.
/// `shutdown` is only polled between requests: a mine or repair already in
/// progress runs to completion before a ctrl-c takes effect.
pub async fn serve<F>(listener: TcpListener, service: &mut OperationService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(%err, "accept failed");
                    continue;
                }
            },
        };

        info!(%peer, "session opened");
        tokio::select! {
            _ = &mut shutdown => {
                info!(%peer, "shutdown requested mid-session");
                return Ok(());
            }
            outcome = serve_session(stream, service) => match outcome {
                Ok(end) => info!(%peer, ?end, "session closed"),
                Err(err) => warn!(%peer, %err, "session dropped"),
            },
        }
    }
}

/// Read requests line by line, answering each with exactly one line, until
/// the caller exits or hangs up.
pub async fn serve_session<S>(stream: S, service: &mut OperationService) -> Result<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        if read == 0 {
            return Ok(SessionEnd::Disconnected);
        }
        if read == MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
            return Err(LedgerError::Transport(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("request line exceeds {MAX_LINE_BYTES} bytes"),
            )));
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => {
                debug!(request = line.trim_end(), "received");
                service.handle_line(line)
            }
            Err(err) => {
                let err = LedgerError::MalformedRequest(format!("request is not valid UTF-8: {err}"));
                warn!(%err, "rejecting request");
                Reply::Respond(Response::normal(-1, err.to_string()))
            }
        };
        match reply {
            Reply::Respond(response) => {
                let mut out = response.encode()?;
                debug!(response = %out, "sending");
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
            Reply::Close => return Ok(SessionEnd::Exit),
        }
    }
}
