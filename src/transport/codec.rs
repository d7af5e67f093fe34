//! Line codec for the stdio wire protocol.
//!
//! Frame format: one UTF-8 JSON document per line, terminated by `\n`
//! (a preceding `\r` is tolerated). Lines longer than the configured limit
//! are drained and reported as [`Frame::Oversized`] so the caller can reject
//! them without losing framing.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without its terminator. Invalid UTF-8 is replaced.
    Line(String),
    /// A line exceeding the limit; carries its length in bytes.
    Oversized(usize),
}

/// Read one frame from the stream.
///
/// Returns `None` on clean EOF. A final unterminated line is still returned.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_line_bytes: usize,
) -> std::io::Result<Option<Frame>> {
    let mut line: Vec<u8> = Vec::new();
    let mut oversized: Option<usize> = None;
    let mut saw_bytes = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if !saw_bytes {
                return Ok(None);
            }
            break;
        }
        saw_bytes = true;

        let (take, consumed, done) = match available.iter().position(|b| *b == b'\n') {
            Some(i) => (i, i + 1, true),
            None => (available.len(), available.len(), false),
        };

        match oversized.as_mut() {
            Some(total) => *total += take,
            None if line.len() + take > max_line_bytes => {
                oversized = Some(line.len() + take);
                line = Vec::new();
            }
            None => line.extend_from_slice(&available[..take]),
        }

        reader.consume(consumed);
        if done {
            break;
        }
    }

    if let Some(total) = oversized {
        return Ok(Some(Frame::Oversized(total)));
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(Frame::Line(String::from_utf8_lossy(&line).into_owned())))
}

/// Write one JSON message followed by a newline, then flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) -> std::io::Result<()> {
    let mut bytes = serde_json::to_vec(message)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    async fn frames(input: &[u8], max: usize) -> Vec<Frame> {
        let mut reader = BufReader::with_capacity(4, input);
        let mut out = Vec::new();
        while let Some(frame) = read_frame(&mut reader, max).await.unwrap() {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn test_splits_lines() {
        let got = frames(b"{\"a\":1}\r\n\n{\"b\":2}", 1024).await;
        assert_eq!(
            got,
            vec![
                Frame::Line("{\"a\":1}".into()),
                Frame::Line(String::new()),
                Frame::Line("{\"b\":2}".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_input_is_eof() {
        assert!(frames(b"", 1024).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_line_keeps_framing() {
        let got = frames(b"0123456789abcdef\nok\n", 8).await;
        assert_eq!(got, vec![Frame::Oversized(16), Frame::Line("ok".into())]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let got = frames(b"\xff\xfe\n", 1024).await;
        assert!(matches!(&got[0], Frame::Line(s) if s.contains('\u{FFFD}')));
    }

    #[tokio::test]
    async fn test_write_frame_appends_newline() {
        let mut buf: Vec<u8> = Vec::new();
        write_frame(&mut buf, &json!({"ok": true})).await.unwrap();
        assert_eq!(buf, b"{\"ok\":true}\n");
    }
}
