//! Light encoding
//!
//! Scene lights are bucketed by type into fixed-layout records and uploaded
//! as a [`LightBatch`] for one solver call.

mod encoder;
pub mod records;

pub use encoder::{EncodedLights, LightBatch, LightEncoder};
pub use records::{AreaLightRecord, DirectionalLightRecord, PointLightRecord, SpotLightRecord};

/// Light encoding and decoding errors
#[derive(thiserror::Error, Debug)]
pub enum LightEncodeError {
    /// A light has unusable parameters
    #[error("Light {index} is invalid: {reason}")]
    InvalidLight {
        /// Position of the light in the scene list
        index: usize,
        /// What is wrong
        reason: String,
    },

    /// Raw buffer length is not a multiple of the record stride
    #[error("{kind} light buffer of {len} bytes is not a multiple of the {stride} byte stride")]
    InvalidStride {
        /// Light type name
        kind: &'static str,
        /// Buffer length
        len: usize,
        /// Record stride
        stride: usize,
    },
}
