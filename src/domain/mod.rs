// Domain layer: records, style tables and the ports the pipeline is built on.

pub mod legend;
pub mod model;
pub mod ports;
pub mod style;
