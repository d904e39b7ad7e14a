pub mod aggregator;
pub mod picks;
pub mod predictor;
pub mod reconcile;
pub mod stats;

pub use picks::PickEngine;
pub use reconcile::CorrectnessStore;
