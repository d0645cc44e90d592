pub mod logging;
pub mod persistence;
