/// Fixed-capacity ring of per-block RMS values.
///
/// Always fully populated: unused slots hold 0.0 so the temporal metrics are
/// defined from the very first block.
pub struct AmplitudeHistory {
    values: Vec<f32>,
    pos: usize,
}

impl AmplitudeHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be > 0");
        Self {
            values: vec![0.0; capacity],
            pos: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, rms: f32) {
        self.values[self.pos] = rms;
        self.pos = (self.pos + 1) % self.values.len();
    }

    /// Stored values in slot order (not chronological once wrapped).
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
        self.pos = 0;
    }
}
