//! Fixed-length frame accumulator.
//!
//! Hosts deliver blocks of arbitrary size; the analysis needs exactly
//! `frame_len` contiguous samples. The accumulator copies incoming samples
//! into a pre-sized frame and hands it out every time it fills up.

pub struct FrameAccumulator {
    frame: Vec<f32>,
    write_pos: usize,
    // Total samples ingested since construction. Never reset, so it can be
    // used as a monotonic stream clock.
    position: u64,
}

impl FrameAccumulator {
    pub fn new(frame_len: usize) -> Self {
        assert!(frame_len > 0, "frame length must be > 0");
        Self {
            frame: vec![0.0; frame_len],
            write_pos: 0,
            position: 0,
        }
    }

    #[inline]
    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Copy `block` into the frame. `on_frame` runs synchronously for every
    /// completed frame with the frame contents (which it may modify) and the
    /// stream position just after the frame's last sample.
    ///
    /// Returns the number of completed frames.
    pub fn ingest<F>(&mut self, block: &[f32], mut on_frame: F) -> usize
    where
        F: FnMut(&mut [f32], u64),
    {
        let frame_len = self.frame.len();
        let mut rest = block;
        let mut completed = 0;

        while !rest.is_empty() {
            let n = (frame_len - self.write_pos).min(rest.len());
            self.frame[self.write_pos..self.write_pos + n].copy_from_slice(&rest[..n]);
            self.write_pos += n;
            self.position += n as u64;
            rest = &rest[n..];

            if self.write_pos == frame_len {
                self.write_pos = 0;
                on_frame(&mut self.frame[..], self.position);
                completed += 1;
            }
        }

        completed
    }

    /// Drop any partially collected frame.
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.frame.fill(0.0);
    }
}
