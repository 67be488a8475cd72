//! Statistical inputs to a simulation: return statistics and confidence
//! calibration.

pub mod calibration;
pub mod returns;
