// src/client.rs

//! Client side of the control protocol.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::{AppError, Result};
use crate::pipeline::control::Query;

/// Connection to a running daemon.
pub struct ControlClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ControlClient {
    /// Connect to the daemon on the loopback interface.
    pub async fn connect(port: u16) -> Result<Self> {
        let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Pages flagged as updated, keyed by URL.
    pub async fn updates(&mut self) -> Result<BTreeMap<String, bool>> {
        self.send(Query::Updates).await?;
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or_else(|| AppError::protocol("connection closed before the updates response"))?;
        Ok(serde_json::from_str(&line)?)
    }

    pub async fn clear_all(&mut self) -> Result<()> {
        self.send(Query::ClearAll).await
    }

    pub async fn recheck(&mut self) -> Result<()> {
        self.send(Query::Recheck).await
    }

    async fn send(&mut self, query: Query) -> Result<()> {
        self.writer
            .write_all(format!("{query}\n").as_bytes())
            .await?;
        self.writer.flush().await?;
        Ok(())
    }
}
