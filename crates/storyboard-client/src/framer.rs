/// Reassembles arbitrarily-chunked stream bytes into complete text lines.
///
/// The storyboard service streams NDJSON, but the transport is free to split
/// the body at any byte boundary, including inside a multi-byte UTF-8
/// sequence. The framer therefore buffers raw bytes and only decodes once a
/// full line has been extracted. Empty and whitespace-only lines are yielded
/// as-is; discarding them is the decoder's job.
#[derive(Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    /// Appends a chunk and returns every line completed by it, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(idx) = self.buf.iter().position(|&b| b == b'\n') {
            let line_bytes = self.buf[..idx].to_vec();
            self.buf.drain(..=idx);
            lines.push(decode_line(&line_bytes));
        }
        lines
    }

    /// Returns any trailing unterminated content as a final pseudo-line.
    ///
    /// The protocol does not require a delimiter after the last event, so the
    /// session applies this once the stream signals end-of-data.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = decode_line(&self.buf);
        self.buf.clear();
        Some(line)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(chunks: &[&[u8]]) -> Vec<String> {
        let mut framer = LineFramer::default();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.push_chunk(chunk));
        }
        lines.extend(framer.finish());
        lines
    }

    #[test]
    fn chunk_boundaries_are_invisible() {
        let content = b"{\"type\":\"story\"}\n\n{\"type\":\"frame\",\"index\":0}\ntail";
        let whole = collect(&[content]);
        for split in 1..content.len() {
            let parts = collect(&[&content[..split], &content[split..]]);
            assert_eq!(parts, whole, "split at byte {split} changed the lines");
        }
        assert_eq!(
            whole,
            vec![
                "{\"type\":\"story\"}".to_string(),
                String::new(),
                "{\"type\":\"frame\",\"index\":0}".to_string(),
                "tail".to_string(),
            ]
        );
    }

    #[test]
    fn multibyte_utf8_split_across_chunks_survives() {
        let content = "Алдар Көсе\n".as_bytes();
        // Split in the middle of a two-byte sequence.
        let lines = collect(&[&content[..3], &content[3..]]);
        assert_eq!(lines, vec!["Алдар Көсе".to_string()]);
    }

    #[test]
    fn crlf_delimited_lines_are_trimmed() {
        let lines = collect(&[b"a\r\nb\r\n"]);
        assert_eq!(lines, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn finish_is_empty_when_stream_ends_on_a_delimiter() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push_chunk(b"done\n"), vec!["done".to_string()]);
        assert_eq!(framer.finish(), None);
    }
}
