// SiteBatch Infrastructure - Artifact Adapters
// Implements: ArtifactCreator

pub mod simulated_creator;

pub use simulated_creator::{SimulatedArtifactCreator, SimulatorConfig};
