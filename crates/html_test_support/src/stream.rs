//! Streaming helpers: readers that stress chunk-boundary handling.

use std::io::Read;

/// Hands out at most `step` bytes per read call, forcing the consumer through
/// every chunk boundary (including mid-UTF-8-sequence splits).
pub struct DribbleReader {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl DribbleReader {
    pub fn new(data: impl Into<Vec<u8>>, step: usize) -> Self {
        assert!(step > 0, "dribble step must be positive");
        Self {
            data: data.into(),
            pos: 0,
            step,
        }
    }
}

impl Read for DribbleReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos == self.data.len() {
            return Ok(0);
        }
        let n = self
            .step
            .min(buf.len())
            .min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
