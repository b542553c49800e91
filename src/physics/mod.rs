pub mod coefficients;
pub mod config;
