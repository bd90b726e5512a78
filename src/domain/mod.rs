// Domain layer: student model and ports. Adapters and pipelines depend on this, never the reverse.

pub mod model;
pub mod ports;
