//! Common utilities and types used throughout the Rigel simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Constants:** Architectural register, instruction and SPR constants.
//! 2. **Error Handling:** Fatal simulation, configuration and assembly errors.
//! 3. **Register Management:** Scalar, vector and special-purpose register files.

/// Common constants used throughout the simulator.
pub mod constants;

/// Error types.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use error::{AsmError, ConfigError, SimError};
pub use reg::{RegisterFile, SprFile, VectorValue};
