//! Windowed magnitude spectrum of one analysis frame.
//!
//! All buffers (window table, complex work buffer, FFT scratch, magnitudes)
//! are allocated in `new`; `magnitudes` only touches pre-sized memory, so it
//! is safe to call from the audio thread.

use crate::dsp::utils::hann_window;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub struct SpectralTransform {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_buf: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    mags: Vec<f32>,
}

impl SpectralTransform {
    pub fn new(frame_len: usize) -> Self {
        assert!(frame_len >= 2, "frame length must be >= 2");

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_len);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            fft,
            window: hann_window(frame_len),
            fft_buf: vec![Complex::default(); frame_len],
            fft_scratch: vec![Complex::default(); scratch_len],
            mags: vec![0.0; frame_len / 2],
        }
    }

    #[inline]
    pub fn frame_len(&self) -> usize {
        self.window.len()
    }

    /// Window `frame` in place, transform it and return the `frame_len / 2`
    /// bin magnitudes. The returned slice is overwritten by the next call.
    pub fn magnitudes(&mut self, frame: &mut [f32]) -> &[f32] {
        debug_assert_eq!(frame.len(), self.window.len());

        for ((x, &w), c) in frame
            .iter_mut()
            .zip(self.window.iter())
            .zip(self.fft_buf.iter_mut())
        {
            *x *= w;
            *c = Complex::new(*x, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buf, &mut self.fft_scratch);

        for (m, c) in self.mags.iter_mut().zip(self.fft_buf.iter()) {
            *m = c.norm();
        }

        &self.mags
    }
}
