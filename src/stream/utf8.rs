/// Incremental UTF-8 decoder for a chunked byte stream.
///
/// Transport chunk boundaries carry no alignment guarantee, so a multi-byte
/// character may be split across two chunks. The decoder holds the trailing
/// partial sequence back until its continuation bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Trailing bytes of an incomplete sequence, at most three.
    carry: Vec<u8>,
}

impl Utf8StreamDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning every complete character.
    ///
    /// An invalid interior sequence decodes as U+FFFD and decoding continues
    /// past it; an incomplete trailing sequence is carried to the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> String {
        if self.carry.is_empty() {
            return self.decode(chunk);
        }
        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(chunk);
        self.decode(&data)
    }

    /// Flush at end of stream.
    ///
    /// A sequence truncated by upstream termination becomes the replacement
    /// character rather than an error.
    pub fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            return String::new();
        }
        let flushed = String::from_utf8_lossy(&self.carry).into_owned();
        self.carry.clear();
        flushed
    }

    fn decode(&mut self, mut data: &[u8]) -> String {
        let mut out = String::with_capacity(data.len());
        loop {
            match std::str::from_utf8(data) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    // Safety: valid_up_to is guaranteed to be a valid UTF-8 boundary.
                    out.push_str(unsafe { std::str::from_utf8_unchecked(&data[..valid_up_to]) });
                    match err.error_len() {
                        Some(invalid_len) => {
                            out.push('\u{FFFD}');
                            data = &data[valid_up_to + invalid_len..];
                        }
                        None => {
                            self.carry.extend_from_slice(&data[valid_up_to..]);
                            return out;
                        }
                    }
                }
            }
        }
    }
}
