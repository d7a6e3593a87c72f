pub mod env;
pub mod gzip;
pub mod telemetry;
