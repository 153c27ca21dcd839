//! Backend trait definitions
//!
//! These traits define the interface a native compute runtime has to offer
//! so that [`ComputeQueue`](crate::ComputeQueue) can drive it.

use crate::range::NdRange;

/// Access flags of a device buffer, as seen from the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl MemAccess {
    pub fn kernel_can_write(self) -> bool {
        !matches!(self, MemAccess::ReadOnly)
    }
}

/// Value bound to a single kernel parameter
#[derive(Debug)]
pub enum ArgValue<'a, B> {
    /// Global memory buffer
    Buffer(&'a B),
    /// Device-local scratch of the given byte size
    Local(usize),
    /// By-value bytes
    Scalar(&'a [u8]),
}

/// Program build failure with the device build log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    pub log: String,
}

impl BuildFailure {
    pub fn new(log: impl Into<String>) -> Self {
        Self { log: log.into() }
    }
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "program build failed:\n{}", self.log)
    }
}

impl std::error::Error for BuildFailure {}

/// Completion marker of an enqueued command
pub trait DeviceEvent: Clone {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Block until the command has finished
    ///
    /// Calling this on a completed event returns immediately.
    fn wait(&self) -> Result<(), Self::Error>;

    /// Non-blocking completion check
    fn is_complete(&self) -> Result<bool, Self::Error>;
}

/// Compute runtime driven by the queue
///
/// All commands go to one in-order command queue owned by the backend, so a
/// command never starts before every command enqueued earlier has finished.
pub trait Backend {
    type Program;
    type Kernel;
    /// Device buffer handle; clones share the same allocation
    type Buffer: Clone;
    type Event: DeviceEvent<Error = Self::Error>;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short backend name for diagnostics
    fn name(&self) -> &str;

    /// Compile program source for the selected device
    fn build_program(&self, source: &str, options: &str) -> Result<Self::Program, BuildFailure>;

    /// Create a kernel handle for an entry point of a built program
    fn create_kernel(
        &self,
        program: &Self::Program,
        name: &str,
    ) -> Result<Self::Kernel, Self::Error>;

    /// Allocate a device buffer of `size` bytes
    ///
    /// When `host` is given its contents are copied into the buffer before
    /// this returns.
    fn create_buffer(
        &self,
        access: MemAccess,
        size: usize,
        host: Option<&[u8]>,
    ) -> Result<Self::Buffer, Self::Error>;

    /// Bind a value to the kernel parameter at `index`
    fn set_arg(
        &self,
        kernel: &mut Self::Kernel,
        index: u32,
        value: ArgValue<'_, Self::Buffer>,
    ) -> Result<(), Self::Error>;

    /// Enqueue the kernel over `range`
    fn enqueue_kernel(
        &self,
        kernel: &Self::Kernel,
        range: &NdRange,
    ) -> Result<Self::Event, Self::Error>;

    /// Enqueue a non-blocking read of the start of `buffer` into `host`
    ///
    /// # Safety
    /// The device may write into `host` until the returned event completes.
    /// The caller must keep the memory alive and must not read or move it
    /// before then.
    unsafe fn enqueue_read(
        &self,
        buffer: &Self::Buffer,
        host: &mut [u8],
    ) -> Result<Self::Event, Self::Error>;
}
