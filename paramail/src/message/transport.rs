//! # Transport module
//!
//! The transport is the boundary where the assembled message leaves
//! the library. Delivering over SMTP is left to implementors; the
//! only implementation shipped here keeps messages in memory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::AssembledMessage;

/// The error returned by transports.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// The transport interface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the given assembled message.
    ///
    /// The message carries its envelope recipients and the
    /// credentials to authenticate with.
    async fn send_message(&self, msg: &AssembledMessage) -> Result<(), Error>;
}

/// A message recorded by the [`MemoryTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SentMessage {
    pub message: AssembledMessage,

    /// The MIME serialization of the message.
    pub raw: Vec<u8>,
}

/// A transport recording sent messages in memory.
///
/// Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the recorded messages, in sending order.
    pub fn sent(&self) -> Vec<SentMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_message(&self, msg: &AssembledMessage) -> Result<(), Error> {
        let raw = msg.to_vec()?;

        debug!(
            "recording message for {} recipient(s) via {}:{}",
            msg.recipients().count(),
            msg.credentials.host,
            msg.credentials.port,
        );

        let mut sent = match self.sent.lock() {
            Ok(sent) => sent,
            Err(poisoned) => poisoned.into_inner(),
        };

        sent.push(SentMessage {
            message: msg.clone(),
            raw,
        });

        Ok(())
    }
}
