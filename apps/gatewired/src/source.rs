use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gatewire_events::EnvelopeSource;
use gatewire_protocol::{GatewayFrame, RawEnvelope};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tracing::{debug, warn};

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// Reads one gateway frame per line and yields the dispatch frames.
///
/// Control frames are skipped. Lines that are not valid frames are logged
/// and skipped; only I/O errors end the stream with an error.
pub struct FrameReader {
    lines: Lines<BufReader<BoxedReader>>,
    line_no: usize,
    skipped_control: u64,
    skipped_malformed: u64,
}

impl FrameReader {
    /// `-` reads standard input.
    pub async fn open(input: &Path) -> Result<Self> {
        if input.as_os_str() == "-" {
            return Ok(Self::from_reader(tokio::io::stdin()));
        }
        let file = File::open(input)
            .await
            .with_context(|| format!("failed opening capture {input:?}"))?;
        Ok(Self::from_reader(file))
    }

    pub fn from_reader(reader: impl AsyncRead + Unpin + Send + 'static) -> Self {
        let boxed: BoxedReader = Box::new(reader);
        Self {
            lines: BufReader::new(boxed).lines(),
            line_no: 0,
            skipped_control: 0,
            skipped_malformed: 0,
        }
    }

    pub fn skipped_control(&self) -> u64 {
        self.skipped_control
    }

    pub fn skipped_malformed(&self) -> u64 {
        self.skipped_malformed
    }
}

#[async_trait]
impl EnvelopeSource for FrameReader {
    async fn next_envelope(&mut self) -> Option<Result<RawEnvelope>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(err) => {
                    return Some(
                        Err(err).with_context(|| format!("failed reading line {}", self.line_no + 1)),
                    );
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let frame: GatewayFrame = match serde_json::from_str(&line) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(line = self.line_no, error = %err, "skipping malformed frame");
                    self.skipped_malformed += 1;
                    continue;
                }
            };
            let op = frame.op;
            match frame.into_envelope() {
                Some(envelope) => return Some(Ok(envelope)),
                None => {
                    debug!(line = self.line_no, ?op, "skipping non-dispatch frame");
                    self.skipped_control += 1;
                }
            }
        }
    }
}
