pub mod accumulator;
pub mod history;
pub mod spectral;
pub mod spectrum;
pub mod temporal;
pub mod utils;

pub use accumulator::FrameAccumulator;
pub use history::AmplitudeHistory;
pub use spectral::{crossover_bin, SpectralMetrics};
pub use spectrum::SpectralTransform;
pub use temporal::TemporalMetrics;
pub use utils::{block_rms, clamp_finite, clamp_unit};
