// Domain layer: probe data model and the seams (capability, classifier rule, storage, settings).

pub mod model;
pub mod ports;
