pub mod audio;
pub mod detector;
pub mod dsp;
pub mod features;
