//! Signal processing: censor span replacement, resampling, vocal isolation,
//! and word-boundary refinement.

pub mod censor;
pub mod refine;
pub mod resample;
pub mod vocal;

pub use censor::CensorMode;
pub use refine::{EnergyRefiner, TimestampRefiner};
pub use resample::LinearResampler;
pub use vocal::VocalFilter;
