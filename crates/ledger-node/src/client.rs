use ledger_core::{LedgerError, Request, Response, Result};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// One persistent session with a node.
pub struct NodeClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl NodeClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send one request and wait for its response line. The exit operation
    /// has no response, so it yields `None`.
    pub async fn call(&mut self, request: &Request) -> Result<Option<Response>> {
        let mut line = request.encode()?;
        debug!(request = %line, "sending");
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        if matches!(request, Request::Exit) {
            return Ok(None);
        }

        let mut reply = String::new();
        if self.reader.read_line(&mut reply).await? == 0 {
            return Err(LedgerError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "node closed the session before replying",
            )));
        }
        debug!(response = reply.trim_end(), "received");
        Response::decode(&reply).map(Some)
    }

    /// Send the exit operation and shut the write side down.
    pub async fn close(mut self) -> Result<()> {
        self.call(&Request::Exit).await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}
