pub mod measurement;

pub use measurement::{Conditions, Measurement, MetricType};
