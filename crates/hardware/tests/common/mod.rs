/// Simulator harness.
pub mod harness;

/// Mock collaborators.
pub mod mocks;
