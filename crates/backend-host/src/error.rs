//! Host backend errors

use thiserror::Error;

/// Error type for host backend operations
///
/// The variants follow the checks a real driver performs, so code that runs
/// on the host backend fails in the same places it would on a device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("kernel `{0}` not found in program")]
    KernelNotFound(String),

    #[error("kernel `{kernel}` has {params} parameters, no argument index {index}")]
    InvalidArgIndex {
        kernel: String,
        index: u32,
        params: usize,
    },

    #[error("argument {index} of kernel `{kernel}` is not set")]
    ArgNotSet { kernel: String, index: usize },

    #[error("invalid buffer size {0}")]
    InvalidBufferSize(usize),

    #[error("local size of {requested} bytes exceeds the {limit} bytes of local memory")]
    LocalMemoryExceeded { requested: usize, limit: usize },

    #[error("host data of {actual} bytes is shorter than the buffer size {expected}")]
    HostDataTooShort { expected: usize, actual: usize },

    #[error("invalid global work size {0:?}")]
    InvalidWorkSize(Vec<usize>),

    #[error("local work size {local:?} does not divide global work size {global:?}")]
    InvalidWorkGroupSize {
        global: Vec<usize>,
        local: Vec<usize>,
    },

    #[error("buffer bound at argument {index} is already in use by this launch")]
    BufferAliased { index: usize },

    #[error("read of {requested} bytes from a buffer of {available} bytes")]
    ReadOutOfBounds { requested: usize, available: usize },

    #[error("argument {index} is not a {expected}")]
    ArgKind { index: usize, expected: &'static str },

    #[error("argument {index} is a read-only buffer")]
    ReadOnlyBuffer { index: usize },

    #[error("argument {index} cannot be viewed as the requested type: {reason}")]
    Cast { index: usize, reason: String },

    #[error("define `{0}` is not set")]
    MissingDefine(String),

    #[error("define `{name}` has non-integer value {value:?}")]
    InvalidDefine { name: String, value: String },

    #[error("kernel failed: {0}")]
    Kernel(String),
}
