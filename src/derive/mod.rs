//! Derived-variable engine: solar geometry, reference evapotranspiration,
//! heat units and extreme-event flags.

pub mod engine;
pub mod indices;
pub mod solar;
