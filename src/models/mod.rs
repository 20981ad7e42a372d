pub mod stress;
pub mod workload;

pub use stress::*;
pub use workload::*;
