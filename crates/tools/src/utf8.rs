//! Chunk-boundary-safe incremental UTF-8 decoding.
//!
//! A `Utf8Carry` buffers the incomplete trailing sequence of the previous
//! chunk (at most 3 bytes) so multi-byte characters split across reads decode
//! correctly. Invalid sequences become U+FFFD and decoding keeps moving.

#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Decode `bytes` into `out`, resolving any carried prefix first.
    pub fn push(&mut self, out: &mut String, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut remaining = bytes;
        // The carry is at most 3 bytes; complete it with a prefix of this
        // chunk before decoding the rest in place.
        while !self.pending.is_empty() && !remaining.is_empty() {
            let expected = sequence_len(self.pending[0]);
            if expected == 0 {
                out.push('\u{FFFD}');
                self.pending.clear();
                break;
            }
            let needed = expected.saturating_sub(self.pending.len());
            if needed == 0 {
                let held = std::mem::take(&mut self.pending);
                self.decode(out, &held);
                continue;
            }
            if remaining.len() < needed {
                self.pending.extend_from_slice(remaining);
                return;
            }
            let mut scratch = [0u8; 8];
            let held = self.pending.len();
            scratch[..held].copy_from_slice(&self.pending);
            scratch[held..held + needed].copy_from_slice(&remaining[..needed]);
            self.pending.clear();
            let total = held + needed;
            self.decode(out, &scratch[..total]);
            remaining = &remaining[needed..];
        }
        if !remaining.is_empty() {
            self.decode(out, remaining);
        }
    }

    /// Flush any carried suffix lossily so the stream never silently
    /// truncates on completion.
    pub fn finish(&mut self, out: &mut String) {
        if self.pending.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.pending));
        self.pending.clear();
    }

    fn decode(&mut self, out: &mut String, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if valid > 0 {
                        out.push_str(std::str::from_utf8(&bytes[..valid]).unwrap_or(""));
                    }
                    match err.error_len() {
                        Some(len) => {
                            out.push('\u{FFFD}');
                            bytes = &bytes[valid + len..];
                        }
                        None => {
                            self.pending.extend_from_slice(&bytes[valid..]);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn sequence_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::Utf8Carry;

    #[test]
    fn split_multibyte_across_chunks() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();

        carry.push(&mut out, &[0xC3]);
        assert_eq!(out, "");
        assert!(!carry.is_empty());

        carry.push(&mut out, &[0x97]);
        assert_eq!(out, "\u{d7}");
        assert!(carry.is_empty());
    }

    #[test]
    fn resolves_carry_then_decodes_rest_of_chunk() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();

        // First two bytes of U+1F600.
        carry.push(&mut out, &[0xF0, 0x9F]);
        assert_eq!(out, "");

        carry.push(&mut out, &[0x98, 0x80, b'!']);
        assert_eq!(out, "\u{1F600}!");
        assert!(carry.is_empty());
    }

    #[test]
    fn trailing_incomplete_sequence_recreates_carry() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();

        carry.push(&mut out, &[0xE2]);
        assert_eq!(out, "");

        carry.push(&mut out, &[0x82, 0xAC, 0xE2]);
        assert_eq!(out, "\u{20AC}");
        assert!(!carry.is_empty());
    }

    #[test]
    fn invalid_bytes_make_progress() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();

        carry.push(&mut out, &[0xFF, b'f']);
        assert_eq!(out, "\u{FFFD}f");
        assert!(carry.is_empty());
    }

    #[test]
    fn finish_flushes_incomplete_suffix() {
        let mut out = String::new();
        let mut carry = Utf8Carry::new();

        carry.push(&mut out, &[0xE2, 0x82]);
        assert_eq!(out, "");

        carry.finish(&mut out);
        assert_eq!(out, "\u{FFFD}");
        assert!(carry.is_empty());
    }
}
