// crates/muster-mcp/src/framing.rs
// ============================================================================
// Module: Content-Length Framing
// Description: LSP-style message framing over byte streams.
// Purpose: Read framed or bare-line JSON-RPC messages; always write framed.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Messages are prefixed by HTTP-style header lines terminated by a blank
//! line, then exactly `Content-Length` bytes of UTF-8 JSON. The reader also
//! accepts a fallback: one bare JSON object on a single line (some clients
//! skip framing). The writer always emits `Content-Length: N` framing and
//! never writes anything else to the stream.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::Write;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Framing I/O errors.
///
/// # Invariants
/// - Malformed content is reported through [`ReadOutcome::Malformed`], not
///   through this error type; errors here are transport failures.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Underlying stream failure.
    #[error("framing io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Read Outcome
// ============================================================================

/// Result of one framed read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Stream is closed; the server should shut down.
    Eof,
    /// One parsed message.
    Message(Value),
    /// Bytes were consumed but did not parse as a message.
    Malformed(String),
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Reads one message from the stream.
///
/// Header lines are consumed until a blank line; a `Content-Length` header
/// selects framed mode and exactly that many body bytes are read. A line
/// whose first non-whitespace byte is `{` is parsed as one bare message.
///
/// # Errors
///
/// Returns [`FramingError::Io`] on stream failures.
pub fn read_message(reader: &mut impl BufRead) -> Result<ReadOutcome, FramingError> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|err| FramingError::Io(err.to_string()))?;
        if bytes == 0 {
            return Ok(ReadOutcome::Eof);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if content_length.is_some() {
                break;
            }
            // Blank line without headers: keep scanning for the next frame.
            continue;
        }
        if let Some(value) = strip_header(trimmed) {
            match value.trim().parse::<usize>() {
                Ok(length) => content_length = Some(length),
                Err(_) => {
                    return Ok(ReadOutcome::Malformed(format!(
                        "invalid Content-Length header: {trimmed}"
                    )));
                }
            }
        } else if trimmed.starts_with('{') {
            // Bare JSON line without framing.
            return Ok(match serde_json::from_str::<Value>(trimmed) {
                Ok(message) => ReadOutcome::Message(message),
                Err(err) => ReadOutcome::Malformed(format!("malformed JSON line: {err}")),
            });
        }
        // Unknown headers are skipped.
    }

    let Some(length) = content_length else {
        return Ok(ReadOutcome::Eof);
    };
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).map_err(|err| FramingError::Io(err.to_string()))?;
    Ok(match serde_json::from_slice::<Value>(&body) {
        Ok(message) => ReadOutcome::Message(message),
        Err(err) => ReadOutcome::Malformed(format!("malformed JSON body: {err}")),
    })
}

/// Extracts the value of a `Content-Length` header, case-insensitively.
fn strip_header(line: &str) -> Option<&str> {
    let prefix_len = "content-length:".len();
    let prefix = line.get(..prefix_len)?;
    if prefix.eq_ignore_ascii_case("content-length:") { line.get(prefix_len..) } else { None }
}

// ============================================================================
// SECTION: Writer
// ============================================================================

/// Writes one framed message to the stream and flushes.
///
/// # Errors
///
/// Returns [`FramingError::Io`] on stream failures.
pub fn write_message(writer: &mut impl Write, message: &Value) -> Result<(), FramingError> {
    let body = serde_json::to_vec(message).map_err(|err| FramingError::Io(err.to_string()))?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).map_err(|err| FramingError::Io(err.to_string()))?;
    writer.write_all(&body).map_err(|err| FramingError::Io(err.to_string()))?;
    writer.flush().map_err(|err| FramingError::Io(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::io::Cursor;

    use serde_json::json;

    use super::ReadOutcome;
    use super::read_message;
    use super::write_message;

    #[test]
    fn framed_read_consumes_exactly_content_length_bytes()
    -> Result<(), Box<dyn std::error::Error>> {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let framed = format!("Content-Length: {}\r\n\r\n{body}XTRA", body.len());
        let mut reader = BufReader::new(Cursor::new(framed.into_bytes()));
        let outcome = read_message(&mut reader)?;
        assert_eq!(outcome, ReadOutcome::Message(json!({
            "jsonrpc": "2.0", "id": 1, "method": "ping"
        })));
        // The trailing bytes were not consumed by the framed read.
        let mut rest = String::new();
        std::io::Read::read_to_string(&mut reader, &mut rest)?;
        assert_eq!(rest, "XTRA");
        Ok(())
    }

    #[test]
    fn bare_json_line_is_one_message() -> Result<(), Box<dyn std::error::Error>> {
        let mut reader =
            BufReader::new(Cursor::new(b"{\"method\":\"ping\",\"id\":2}\n".to_vec()));
        let outcome = read_message(&mut reader)?;
        assert_eq!(outcome, ReadOutcome::Message(json!({"method": "ping", "id": 2})));
        Ok(())
    }

    #[test]
    fn header_matching_is_case_insensitive() -> Result<(), Box<dyn std::error::Error>> {
        let body = r#"{"method":"ping"}"#;
        let framed = format!("content-length: {}\r\nX-Other: x\r\n\r\n{body}", body.len());
        let mut reader = BufReader::new(Cursor::new(framed.into_bytes()));
        let outcome = read_message(&mut reader)?;
        assert!(matches!(outcome, ReadOutcome::Message(_)));
        Ok(())
    }

    #[test]
    fn eof_and_malformed_are_distinguished() -> Result<(), Box<dyn std::error::Error>> {
        let mut empty = BufReader::new(Cursor::new(Vec::new()));
        assert_eq!(read_message(&mut empty)?, ReadOutcome::Eof);

        let mut bad_header =
            BufReader::new(Cursor::new(b"Content-Length: nope\r\n\r\n".to_vec()));
        assert!(matches!(read_message(&mut bad_header)?, ReadOutcome::Malformed(_)));

        let mut bad_line = BufReader::new(Cursor::new(b"{not json}\n".to_vec()));
        assert!(matches!(read_message(&mut bad_line)?, ReadOutcome::Malformed(_)));
        Ok(())
    }

    #[test]
    fn writer_always_frames() -> Result<(), Box<dyn std::error::Error>> {
        let message = json!({"jsonrpc": "2.0", "id": 1, "result": {}});
        let mut out = Vec::new();
        write_message(&mut out, &message)?;
        let text = String::from_utf8(out)?;
        let body = serde_json::to_string(&message)?;
        assert_eq!(text, format!("Content-Length: {}\r\n\r\n{body}", body.len()));
        Ok(())
    }
}
