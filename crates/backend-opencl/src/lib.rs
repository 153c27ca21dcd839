//! OpenCL backend for clqueue
//!
//! Drives a single OpenCL device through the `ocl` crate. Programs are built
//! with `clBuildProgram`, and every command goes to one in-order command
//! queue.
//!
//! # Usage
//!
//! ```ignore
//! use clqueue_backend_opencl::OpenCLBackend;
//! use clqueue_core::{ComputeQueue, QueueConfig};
//!
//! let config = QueueConfig::from_env()?;
//! let backend = OpenCLBackend::from_config(&config)?;
//! let mut queue = ComputeQueue::with_config(backend, config);
//! ```

mod device;
mod error;
mod kernel;

pub use device::OpenCLBackend;
pub use error::OpenCLError;
pub use kernel::{OpenCLEvent, OpenCLKernel};

/// Check if an OpenCL device can be used
pub fn is_available() -> bool {
    OpenCLBackend::is_available()
}
