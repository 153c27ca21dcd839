//! CPU reference backend for clqueue
//!
//! Runs kernels as Rust closures registered by name, so queue code can be
//! exercised on machines without an OpenCL runtime. Program source is still
//! read and checked: kernel declarations, bracket balance, `#error`
//! directives and build options are validated like a device compiler would,
//! and failures come back with a build log.
//!
//! ```ignore
//! use clqueue_backend_host::HostBackend;
//!
//! let backend = HostBackend::new().with_kernel("vadd", |launch| {
//!     let a = launch.read::<f32>(0)?;
//!     let b = launch.read::<f32>(1)?;
//!     let ids = launch.global_ids();
//!     let c = launch.view_mut::<f32>(2)?;
//!     for [i, _, _] in ids {
//!         c[i] = a[i] + b[i];
//!     }
//!     Ok(())
//! });
//! ```

mod device;
mod error;
mod launch;
mod memory;
mod source;

pub use device::{HostBackend, HostEvent, HostKernel, HostProgram, HostStats, LOCAL_MEM_SIZE};
pub use error::HostError;
pub use launch::{GlobalIds, HostKernelFn, HostLaunch};
pub use memory::HostBuffer;

/// Check if the host backend is available
///
/// Always true for the host backend.
pub fn is_available() -> bool {
    true
}
