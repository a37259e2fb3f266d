pub mod audio;
pub use audio::{REQUIRED_CHANNELS, REQUIRED_SAMPLE_RATE, load_linear16_wav};
