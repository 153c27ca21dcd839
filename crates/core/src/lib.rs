//! clqueue core: typed kernel dispatch over an in-order command queue
//!
//! The crate holds everything that does not depend on a particular compute
//! runtime: argument descriptors, execution shapes, the [`Backend`] trait,
//! the program/kernel cache, the queue itself and the future it returns.
//!
//! # Basic usage
//!
//! ```ignore
//! use clqueue_core::prelude::*;
//!
//! let mut queue = ComputeQueue::new(backend);
//! let a = vec![1.0f32; 1024];
//! let b = vec![2.0f32; 1024];
//!
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
//!
//! let sum: Vec<f32> = task.get()?[0].to_vec();
//! ```

pub mod arg;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod future;
pub mod queue;
pub mod range;

pub use arg::{Direction, KernelArg, OutputValue};
pub use backend::{ArgValue, Backend, BuildFailure, DeviceEvent, MemAccess};
pub use cache::{CacheStats, KernelKey};
pub use config::{DEFAULT_BLOCK_SIZE, QueueConfig};
pub use error::{ConfigError, QueueError};
pub use future::TaskFuture;
pub use queue::ComputeQueue;
pub use range::{Extent, NdRange};

/// Prelude module with commonly used types and traits
pub mod prelude {
    pub use crate::arg::{Direction, KernelArg, OutputValue};
    pub use crate::backend::{Backend, DeviceEvent};
    pub use crate::config::QueueConfig;
    pub use crate::error::QueueError;
    pub use crate::future::TaskFuture;
    pub use crate::queue::ComputeQueue;
    pub use crate::range::{Extent, NdRange};
}
