//! Outbound delta publishing.

use std::fs::OpenOptions;
use std::io::{self, Write};

use crate::report::Delta;

/// A publish attempt that did not reach its destination.
#[derive(Debug)]
pub enum PublishError {
    Io(io::Error),
    Encode(serde_json::Error),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::Io(e) => write!(f, "Write error: {}", e),
            PublishError::Encode(e) => write!(f, "Encode error: {}", e),
        }
    }
}

impl std::error::Error for PublishError {}

impl From<io::Error> for PublishError {
    fn from(err: io::Error) -> Self {
        PublishError::Io(err)
    }
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Encode(err)
    }
}

/// Downstream consumer of the service's deltas.
pub trait DeltaPublisher {
    fn publish(&mut self, delta: &Delta) -> Result<(), PublishError>;
}

/// Writes each delta as one line of JSON.
pub struct JsonLinesPublisher<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonLinesPublisher<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl JsonLinesPublisher<std::fs::File> {
    /// Appends to `path`, creating it if needed.
    pub fn append_to(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> DeltaPublisher for JsonLinesPublisher<W> {
    fn publish(&mut self, delta: &Delta) -> Result<(), PublishError> {
        serde_json::to_writer(&mut self.out, delta)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<P: DeltaPublisher + ?Sized> DeltaPublisher for Box<P> {
    fn publish(&mut self, delta: &Delta) -> Result<(), PublishError> {
        (**self).publish(delta)
    }
}
