//! Host-side buffer storage

use clqueue_core::MemAccess;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Byte storage aligned to 8 bytes so typed views of any primitive element
/// type are valid
#[derive(Debug, Clone)]
pub(crate) struct HostMemory {
    words: Vec<u64>,
    len: usize,
}

impl HostMemory {
    pub(crate) fn zeroed(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(8)],
            len,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.words)[..self.len]
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.words)[..self.len]
    }
}

/// A buffer in host memory standing in for a device allocation
///
/// Clones share the allocation, like retained `cl_mem` handles.
#[derive(Debug, Clone)]
pub struct HostBuffer {
    memory: Arc<Mutex<HostMemory>>,
    access: MemAccess,
    len: usize,
}

impl HostBuffer {
    pub(crate) fn new(access: MemAccess, memory: HostMemory) -> Self {
        Self {
            len: memory.len(),
            memory: Arc::new(Mutex::new(memory)),
            access,
        }
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Kernel access flags the buffer was created with
    pub fn access(&self) -> MemAccess {
        self.access
    }

    /// Copy of the current contents
    pub fn to_bytes(&self) -> Vec<u8> {
        self.memory.lock().bytes().to_vec()
    }

    /// Whether both handles refer to the same allocation
    pub fn ptr_eq(&self, other: &HostBuffer) -> bool {
        Arc::ptr_eq(&self.memory, &other.memory)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HostMemory> {
        self.memory.lock()
    }

    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, HostMemory>> {
        self.memory.try_lock()
    }
}
