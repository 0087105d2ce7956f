//! Per-request echo exchange.
//!
//! An `EchoExchange` owns the pending body buffer for exactly one
//! request/response exchange. Body chunks are appended in the order they
//! arrive; once the body is complete the accumulated bytes become the
//! response body.
//!
//! ```text
//! AwaitingData --push_chunk--> AwaitingData
//! AwaitingData --finish------> Responding
//! Responding   --complete----> Closed
//! ```

use bytes::{Bytes, BytesMut};
use serde::Deserialize;

/// How the accumulated body is turned into the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// Echo the received bytes unchanged.
    #[default]
    Raw,
    /// Decode as UTF-8 text, replacing invalid sequences with U+FFFD.
    Utf8,
}

/// Lifecycle of a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Request body chunks are still arriving.
    AwaitingData,
    /// Body complete, response being written.
    Responding,
    /// Response written.
    Closed,
}

/// Invalid state transition on an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeError {
    NotAwaitingData(ExchangeState),
    NotResponding(ExchangeState),
}

impl std::fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::NotAwaitingData(state) => {
                write!(f, "exchange is not accepting body data (state: {:?})", state)
            }
            ExchangeError::NotResponding(state) => {
                write!(f, "exchange is not responding (state: {:?})", state)
            }
        }
    }
}

impl std::error::Error for ExchangeError {}

/// Pending request buffer plus its lifecycle state.
#[derive(Debug)]
pub struct EchoExchange {
    state: ExchangeState,
    buffer: BytesMut,
    chunks: usize,
    encoding: BodyEncoding,
}

impl EchoExchange {
    /// Start a new exchange with an empty buffer.
    pub fn new(encoding: BodyEncoding) -> Self {
        Self {
            state: ExchangeState::AwaitingData,
            buffer: BytesMut::new(),
            chunks: 0,
            encoding,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Bytes accumulated so far.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of chunks appended so far.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Append one received chunk to the pending buffer.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), ExchangeError> {
        if self.state != ExchangeState::AwaitingData {
            return Err(ExchangeError::NotAwaitingData(self.state));
        }
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
        Ok(())
    }

    /// Signal end of body and take the response body.
    ///
    /// The buffer is consumed; the exchange moves to `Responding`.
    pub fn finish(&mut self) -> Result<Bytes, ExchangeError> {
        if self.state != ExchangeState::AwaitingData {
            return Err(ExchangeError::NotAwaitingData(self.state));
        }
        self.state = ExchangeState::Responding;

        let raw = std::mem::take(&mut self.buffer).freeze();
        Ok(match self.encoding {
            BodyEncoding::Raw => raw,
            BodyEncoding::Utf8 if std::str::from_utf8(&raw).is_ok() => raw,
            BodyEncoding::Utf8 => {
                Bytes::from(String::from_utf8_lossy(&raw).into_owned().into_bytes())
            }
        })
    }

    /// Mark the response as fully written.
    pub fn complete(&mut self) -> Result<(), ExchangeError> {
        if self.state != ExchangeState::Responding {
            return Err(ExchangeError::NotResponding(self.state));
        }
        self.state = ExchangeState::Closed;
        Ok(())
    }
}
