// src/pipeline/control.rs

//! Line-based control endpoint on the loopback interface.
//!
//! | Query        | Effect                         | Response         |
//! |--------------|--------------------------------|------------------|
//! | `updates?`   | read the update registry       | one line of JSON |
//! | `clear all!` | empty and persist the registry | none             |
//! | `recheck!`   | check every page now           | none             |

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{AppError, Result};
use crate::pipeline::scheduler::Scheduler;
use crate::storage::UpdateRegistry;
use crate::storage::registry::to_map;

pub const QUERY_UPDATES: &str = "updates?";
pub const QUERY_CLEAR_ALL: &str = "clear all!";
pub const QUERY_RECHECK: &str = "recheck!";

/// A request understood by the control server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Updates,
    ClearAll,
    Recheck,
}

impl Query {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updates => QUERY_UPDATES,
            Self::ClearAll => QUERY_CLEAR_ALL,
            Self::Recheck => QUERY_RECHECK,
        }
    }
}

impl FromStr for Query {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            QUERY_UPDATES => Ok(Self::Updates),
            QUERY_CLEAR_ALL => Ok(Self::ClearAll),
            QUERY_RECHECK => Ok(Self::Recheck),
            other => Err(AppError::protocol(format!("unknown query `{other}`"))),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts control connections and serves each on its own task.
pub struct ControlServer {
    listener: TcpListener,
    scheduler: Scheduler,
    registry: Arc<UpdateRegistry>,
}

impl ControlServer {
    /// Bind on 127.0.0.1. Port 0 picks a free port.
    pub async fn bind(port: u16, scheduler: Scheduler, registry: Arc<UpdateRegistry>) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
        log::info!("Control server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            scheduler,
            registry,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::warn!("Failed to accept control connection: {}", e);
                    continue;
                }
            };

            let session = Session {
                scheduler: self.scheduler.clone(),
                registry: Arc::clone(&self.registry),
            };
            tokio::spawn(async move {
                if let Err(e) = session.run(stream).await {
                    log::warn!("Control connection {} closed: {}", peer, e);
                }
            });
        }
    }
}

struct Session {
    scheduler: Scheduler,
    registry: Arc<UpdateRegistry>,
}

impl Session {
    /// Answer queries until EOF or an unknown query.
    async fn run(self, stream: TcpStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let query: Query = line.trim_end_matches('\r').parse()?;
            log::debug!("Control query: {}", query);

            match query {
                Query::Updates => {
                    let updates = self.registry.snapshot().await;
                    let mut response = serde_json::to_vec(&to_map(&updates))?;
                    response.push(b'\n');
                    writer.write_all(&response).await?;
                    writer.flush().await?;
                }
                Query::ClearAll => {
                    self.registry.clear().await?;
                    log::info!("Cleared all updates");
                }
                Query::Recheck => {
                    drop(self.scheduler.recheck_all().await);
                }
            }
        }

        Ok(())
    }
}
