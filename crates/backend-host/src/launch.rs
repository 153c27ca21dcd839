//! Argument access for host kernels

use crate::error::HostError;
use crate::memory::HostMemory;
use bytemuck::Pod;
use clqueue_core::{MemAccess, NdRange};
use parking_lot::MutexGuard;
use rustc_hash::FxHashMap;

/// Host kernel implementation
///
/// Called once per launch with every argument bound; the closure loops over
/// [`HostLaunch::global_ids`] itself.
pub type HostKernelFn =
    std::sync::Arc<dyn Fn(&mut HostLaunch<'_>) -> Result<(), HostError> + Send + Sync>;

pub(crate) enum Slot<'a> {
    Buffer {
        memory: MutexGuard<'a, HostMemory>,
        access: MemAccess,
    },
    Local(HostMemory),
    Scalar(&'a [u8]),
}

/// One kernel launch as seen by a host kernel
///
/// Buffers are locked for the whole launch, so writes of the kernel are
/// visible to every later command.
pub struct HostLaunch<'a> {
    kernel: &'a str,
    range: NdRange,
    defines: &'a FxHashMap<String, String>,
    slots: Vec<Slot<'a>>,
}

impl<'a> HostLaunch<'a> {
    pub(crate) fn new(
        kernel: &'a str,
        range: NdRange,
        defines: &'a FxHashMap<String, String>,
        slots: Vec<Slot<'a>>,
    ) -> Self {
        Self {
            kernel,
            range,
            defines,
            slots,
        }
    }

    /// Name of the kernel being run
    pub fn kernel_name(&self) -> &str {
        self.kernel
    }

    /// Range the kernel was enqueued over
    pub fn range(&self) -> &NdRange {
        &self.range
    }

    /// Number of bound arguments
    pub fn arg_count(&self) -> usize {
        self.slots.len()
    }

    /// Global ids of all work items, x fastest, offset applied
    pub fn global_ids(&self) -> GlobalIds {
        GlobalIds::new(&self.range)
    }

    /// Value of a `-D` build option of the program
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }

    pub fn define_usize(&self, name: &str) -> Result<usize, HostError> {
        let value = self
            .define(name)
            .ok_or_else(|| HostError::MissingDefine(name.to_string()))?;
        value.parse().map_err(|_| HostError::InvalidDefine {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Typed view of a buffer or local argument
    pub fn view<T: Pod>(&self, index: usize) -> Result<&[T], HostError> {
        let bytes = match self.slot(index)? {
            Slot::Buffer { memory, .. } => memory.bytes(),
            Slot::Local(memory) => memory.bytes(),
            Slot::Scalar(_) => {
                return Err(HostError::ArgKind {
                    index,
                    expected: "buffer",
                });
            }
        };
        bytemuck::try_cast_slice(bytes).map_err(|e| cast_error(index, e))
    }

    /// Copy of a buffer or local argument
    pub fn read<T: Pod>(&self, index: usize) -> Result<Vec<T>, HostError> {
        self.view(index).map(<[T]>::to_vec)
    }

    /// Mutable typed view of a writable buffer or local argument
    pub fn view_mut<T: Pod>(&mut self, index: usize) -> Result<&mut [T], HostError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(HostError::ArgKind {
                index,
                expected: "bound argument",
            })?;
        let bytes = match slot {
            Slot::Buffer { access, .. } if !access.kernel_can_write() => {
                return Err(HostError::ReadOnlyBuffer { index });
            }
            Slot::Buffer { memory, .. } => memory.bytes_mut(),
            Slot::Local(memory) => memory.bytes_mut(),
            Slot::Scalar(_) => {
                return Err(HostError::ArgKind {
                    index,
                    expected: "buffer",
                });
            }
        };
        bytemuck::try_cast_slice_mut(bytes).map_err(|e| cast_error(index, e))
    }

    /// By-value argument
    pub fn scalar<T: Pod>(&self, index: usize) -> Result<T, HostError> {
        match self.slot(index)? {
            Slot::Scalar(bytes) if bytes.len() == std::mem::size_of::<T>() => {
                Ok(bytemuck::pod_read_unaligned(bytes))
            }
            Slot::Scalar(bytes) => Err(HostError::Cast {
                index,
                reason: format!(
                    "scalar has {} bytes, expected {}",
                    bytes.len(),
                    std::mem::size_of::<T>()
                ),
            }),
            _ => Err(HostError::ArgKind {
                index,
                expected: "scalar",
            }),
        }
    }

    fn slot(&self, index: usize) -> Result<&Slot<'a>, HostError> {
        self.slots.get(index).ok_or(HostError::ArgKind {
            index,
            expected: "bound argument",
        })
    }
}

fn cast_error(index: usize, error: bytemuck::PodCastError) -> HostError {
    HostError::Cast {
        index,
        reason: format!("{:?}", error),
    }
}

/// Iterator over the global ids of a launch
#[derive(Debug, Clone)]
pub struct GlobalIds {
    offset: [usize; 3],
    global: [usize; 3],
    next: usize,
    total: usize,
}

impl GlobalIds {
    fn new(range: &NdRange) -> Self {
        let mut offset = [0; 3];
        if let Some(extent) = range.offset() {
            for (slot, value) in offset.iter_mut().zip(extent.as_slice()) {
                *slot = *value;
            }
        }
        let global = range.global().as_array();
        Self {
            offset,
            global,
            next: 0,
            total: global.iter().product(),
        }
    }
}

impl Iterator for GlobalIds {
    type Item = [usize; 3];

    fn next(&mut self) -> Option<[usize; 3]> {
        if self.next >= self.total {
            return None;
        }
        let i = self.next;
        self.next += 1;

        let [gx, gy, _] = self.global;
        Some([
            self.offset[0] + i % gx,
            self.offset[1] + (i / gx) % gy,
            self.offset[2] + i / (gx * gy),
        ])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GlobalIds {}
