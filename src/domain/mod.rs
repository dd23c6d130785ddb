// Domain layer: histogram models, harvest spec records, and ports (interfaces).

pub mod model;
pub mod ports;
pub mod spec;
