//! Console stand-ins for speech recognition and synthesis
//!
//! Typed lines play the role of transcripts; replies are written as text.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use super::{Listen, RecognitionError, Speak};
use crate::{Error, Result};
use crate::config::SpeechConfig;

/// Reads one transcript per line
pub struct LineListener<R> {
    lines: Lines<R>,
}

impl LineListener<BufReader<tokio::io::Stdin>> {
    /// Listen on standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineListener<R> {
    /// Listen on any buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Listen for LineListener<R> {
    async fn listen(&mut self, timeout: Duration) -> std::result::Result<String, RecognitionError> {
        // `next_line` is cancel safe, so a timeout never loses input
        match tokio::time::timeout(timeout, self.lines.next_line()).await {
            Err(_) => Err(RecognitionError::Timeout),
            Ok(Ok(None)) => Err(RecognitionError::Closed),
            Ok(Err(e)) => Err(RecognitionError::Service(e.to_string())),
            Ok(Ok(Some(line))) => {
                let transcript = line.trim().to_lowercase();
                if transcript.is_empty() {
                    Err(RecognitionError::Unintelligible)
                } else {
                    tracing::debug!(%transcript, "heard");
                    Ok(transcript)
                }
            }
        }
    }
}

/// Writes replies to a text stream
pub struct ConsoleSpeaker<W> {
    out: W,
}

impl ConsoleSpeaker<tokio::io::Stdout> {
    /// Speak to standard output
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSpeaker<W> {
    /// Speak to any writer
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Speak for ConsoleSpeaker<W> {
    async fn speak(&mut self, text: &str, settings: &SpeechConfig) -> Result<()> {
        tracing::trace!(rate = settings.rate, volume = settings.volume, "speaking");
        let line = format!("🔊 {text}\n");
        self.out
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::Speech(e.to_string()))?;
        self.out
            .flush()
            .await
            .map_err(|e| Error::Speech(e.to_string()))
    }
}
