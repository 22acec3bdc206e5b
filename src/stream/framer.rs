// Line framing across arbitrary chunk boundaries

/// Reassembles raw body chunks into complete lines.
///
/// Bytes are buffered until a `\n` arrives and only then decoded, so a
/// multi-byte UTF-8 sequence split between two chunks is never mangled.
/// At rest the buffer holds at most one unterminated line.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append a chunk and return every line it completed, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        // Everything up to the last separator is complete; the tail stays
        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Flush whatever is left once the stream has ended
    pub fn finish(&mut self) -> Vec<String> {
        if self.buffer.is_empty() {
            return Vec::new();
        }

        let rest = std::mem::take(&mut self.buffer);
        rest.split(|&b| b == b'\n').map(decode_line).collect()
    }

    /// Drop the partial line without emitting it
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }

    #[cfg(test)]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
