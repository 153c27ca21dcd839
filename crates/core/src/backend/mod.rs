//! Backend module
//!
//! The queue never talks to a compute runtime directly. Everything it needs
//! (program builds, kernel handles, buffers, events) goes through the
//! [`Backend`] trait.
//!
//! Backend implementations are provided by separate crates:
//! - clqueue-backend-opencl
//! - clqueue-backend-host (CPU reference)

pub mod traits;

pub use traits::{ArgValue, Backend, BuildFailure, DeviceEvent, MemAccess};
