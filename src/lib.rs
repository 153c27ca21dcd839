//! clqueue: typed kernel dispatch over an in-order GPU command queue
//!
//! Builds programs from source files, binds kernel arguments by direction,
//! enqueues kernels and non-blocking read-backs on one in-order queue and
//! hands back a [`TaskFuture`] to synchronize on. Built programs are cached
//! by source path and kernels by (path, kernel name).
//!
//! # Architecture
//!
//! - **clqueue-core**: argument descriptors, backend traits, cache, queue
//! - **clqueue-backend-host**: CPU reference backend, kernels are Rust closures
//! - **clqueue-backend-opencl**: OpenCL backend on the `ocl` crate
//!
//! # Feature Flags
//!
//! - `host` (default): re-export the host backend as [`host`]
//! - `opencl`: re-export the OpenCL backend as [`opencl`]
//!
//! # Example
//!
//! ```ignore
//! use clqueue::prelude::*;
//! use clqueue::opencl::OpenCLBackend;
//!
//! let config = QueueConfig::from_env()?;
//! let mut queue = ComputeQueue::with_config(OpenCLBackend::from_config(&config)?, config);
//!
//! let a = vec![1.0f32; 1024];
//! let b = vec![2.0f32; 1024];
//! let task = queue.submit(
//!     "kernels/vadd.cl",
//!     "vadd",
//!     &NdRange::new(1024usize),
//!     vec![
//!         KernelArg::input(&a),
//!         KernelArg::input(&b),
//!         KernelArg::output_len::<f32>(1024),
//!     ],
//! )?;
//! let c: Vec<f32> = task.get()?[0].to_vec();
//! ```

// ============================================================================
// Re-exports
// ============================================================================

pub use clqueue_core::*;

/// CPU reference backend
#[cfg(feature = "host")]
pub mod host {
    pub use clqueue_backend_host::*;
}

/// OpenCL backend
#[cfg(feature = "opencl")]
pub mod opencl {
    pub use clqueue_backend_opencl::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module with commonly used types and traits
pub mod prelude {
    pub use clqueue_core::prelude::*;

    #[cfg(feature = "host")]
    pub use clqueue_backend_host::{HostBackend, HostError, HostLaunch};

    #[cfg(feature = "opencl")]
    pub use clqueue_backend_opencl::{OpenCLBackend, OpenCLError};
}
