//! Encoding modules for RelayRAFt

pub mod encoder;
pub mod settings;

pub use encoder::{build_encoder_command, encode, EncodeOutput};
pub use settings::EncodeSettings;
