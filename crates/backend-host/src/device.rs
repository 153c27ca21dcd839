//! Host backend implementation

use crate::error::HostError;
use crate::launch::{HostKernelFn, HostLaunch, Slot};
use crate::memory::{HostBuffer, HostMemory};
use crate::source;
use clqueue_core::{ArgValue, Backend, BuildFailure, DeviceEvent, MemAccess, NdRange};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Local memory available to one work group, like `CL_DEVICE_LOCAL_MEM_SIZE`
pub const LOCAL_MEM_SIZE: usize = 64 * 1024;

/// Snapshot of the runtime calls made on a [`HostBackend`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub programs_built: usize,
    pub build_failures: usize,
    pub kernels_created: usize,
    pub buffers_created: usize,
    pub launches: usize,
    pub reads: usize,
}

#[derive(Debug, Default)]
struct HostCounters {
    programs_built: AtomicUsize,
    build_failures: AtomicUsize,
    kernels_created: AtomicUsize,
    buffers_created: AtomicUsize,
    launches: AtomicUsize,
    reads: AtomicUsize,
    events: AtomicU64,
}

impl HostCounters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn next_event(&self) -> HostEvent {
        HostEvent {
            id: self.events.fetch_add(1, Ordering::Relaxed),
        }
    }
}

/// Built program: entry points with their parameter counts, plus the
/// defines of its build options
#[derive(Debug, Clone)]
pub struct HostProgram {
    kernels: FxHashMap<String, usize>,
    defines: Arc<FxHashMap<String, String>>,
}

impl HostProgram {
    /// Kernels declared by the program source
    pub fn kernel_names(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// Value of a `-D` define from the build options
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
enum HostArg {
    Buffer(HostBuffer),
    Local(usize),
    Scalar(Vec<u8>),
}

/// Kernel handle with its bound arguments
#[derive(Clone)]
pub struct HostKernel {
    name: String,
    func: HostKernelFn,
    defines: Arc<FxHashMap<String, String>>,
    args: Vec<Option<HostArg>>,
}

impl HostKernel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl std::fmt::Debug for HostKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKernel")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

/// Completion event of a host command
///
/// Host commands run when they are enqueued, so every event is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    id: u64,
}

impl HostEvent {
    /// Enqueue order of the command
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl DeviceEvent for HostEvent {
    type Error = HostError;

    fn wait(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn is_complete(&self) -> Result<bool, HostError> {
        Ok(true)
    }
}

/// CPU reference backend
///
/// Program source is checked but not compiled; every kernel a program
/// declares must have a Rust implementation registered under its name.
/// Commands execute synchronously on the calling thread, which trivially
/// keeps the in-order guarantee.
#[derive(Clone, Default)]
pub struct HostBackend {
    kernels: FxHashMap<String, HostKernelFn>,
    counters: Arc<HostCounters>,
}

impl HostBackend {
    /// Backend with no kernels registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the implementation of kernel `name`
    pub fn with_kernel<F>(mut self, name: impl Into<String>, kernel: F) -> Self
    where
        F: Fn(&mut HostLaunch<'_>) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.register(name, kernel);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, kernel: F)
    where
        F: Fn(&mut HostLaunch<'_>) -> Result<(), HostError> + Send + Sync + 'static,
    {
        let name = name.into();
        log::trace!("Registering host kernel {}", name);
        self.kernels.insert(name, Arc::new(kernel));
    }

    /// Whether a closure is registered under `name`
    pub fn has_kernel(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Counters of the runtime calls made so far
    ///
    /// Clones of the backend share the counters.
    pub fn stats(&self) -> HostStats {
        let c = &self.counters;
        HostStats {
            programs_built: c.programs_built.load(Ordering::Relaxed),
            build_failures: c.build_failures.load(Ordering::Relaxed),
            kernels_created: c.kernels_created.load(Ordering::Relaxed),
            buffers_created: c.buffers_created.load(Ordering::Relaxed),
            launches: c.launches.load(Ordering::Relaxed),
            reads: c.reads.load(Ordering::Relaxed),
        }
    }

    fn check_range(range: &NdRange) -> Result<(), HostError> {
        let global = range.global();
        if global.as_slice().contains(&0) {
            return Err(HostError::InvalidWorkSize(global.as_slice().to_vec()));
        }

        if let Some(local) = range.local() {
            let fits = local.dims() == global.dims()
                && local
                    .as_slice()
                    .iter()
                    .zip(global.as_slice())
                    .all(|(l, g)| *l != 0 && g % l == 0);
            if !fits {
                return Err(HostError::InvalidWorkGroupSize {
                    global: global.as_slice().to_vec(),
                    local: local.as_slice().to_vec(),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for HostBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.kernels.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HostBackend")
            .field("kernels", &names)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Backend for HostBackend {
    type Program = HostProgram;
    type Kernel = HostKernel;
    type Buffer = HostBuffer;
    type Event = HostEvent;
    type Error = HostError;

    fn name(&self) -> &str {
        "host"
    }

    fn build_program(&self, source: &str, options: &str) -> Result<HostProgram, BuildFailure> {
        let mut log = Vec::new();
        let defines = source::parse_options(options).unwrap_or_else(|errors| {
            log.extend(errors);
            FxHashMap::default()
        });

        let stripped = source::strip(source);
        log.extend(source::check_delimiters(&stripped));
        log.extend(source::error_directives(&stripped));

        let mut kernels = FxHashMap::default();
        for decl in source::kernel_declarations(&stripped) {
            if !self.kernels.contains_key(&decl.name) {
                log.push(format!(
                    "error: no host implementation registered for kernel `{}`",
                    decl.name
                ));
            }
            kernels.insert(decl.name, decl.params);
        }

        if !log.is_empty() {
            HostCounters::bump(&self.counters.build_failures);
            return Err(BuildFailure::new(log.join("\n")));
        }

        HostCounters::bump(&self.counters.programs_built);
        log::debug!("Built host program with {} kernels", kernels.len());
        Ok(HostProgram {
            kernels,
            defines: Arc::new(defines),
        })
    }

    fn create_kernel(&self, program: &HostProgram, name: &str) -> Result<HostKernel, HostError> {
        let not_found = || HostError::KernelNotFound(name.to_string());
        let params = *program.kernels.get(name).ok_or_else(not_found)?;
        let func = self.kernels.get(name).ok_or_else(not_found)?.clone();

        HostCounters::bump(&self.counters.kernels_created);
        Ok(HostKernel {
            name: name.to_string(),
            func,
            defines: Arc::clone(&program.defines),
            args: vec![None; params],
        })
    }

    fn create_buffer(
        &self,
        access: MemAccess,
        size: usize,
        host: Option<&[u8]>,
    ) -> Result<HostBuffer, HostError> {
        if size == 0 {
            return Err(HostError::InvalidBufferSize(size));
        }

        let mut memory = HostMemory::zeroed(size);
        if let Some(data) = host {
            if data.len() < size {
                return Err(HostError::HostDataTooShort {
                    expected: size,
                    actual: data.len(),
                });
            }
            memory.bytes_mut().copy_from_slice(&data[..size]);
        }

        HostCounters::bump(&self.counters.buffers_created);
        Ok(HostBuffer::new(access, memory))
    }

    fn set_arg(
        &self,
        kernel: &mut HostKernel,
        index: u32,
        value: ArgValue<'_, HostBuffer>,
    ) -> Result<(), HostError> {
        let params = kernel.args.len();
        let slot = kernel
            .args
            .get_mut(index as usize)
            .ok_or_else(|| HostError::InvalidArgIndex {
                kernel: kernel.name.clone(),
                index,
                params,
            })?;

        *slot = Some(match value {
            ArgValue::Buffer(buffer) => HostArg::Buffer(buffer.clone()),
            ArgValue::Local(0) => return Err(HostError::InvalidBufferSize(0)),
            ArgValue::Local(size) if size > LOCAL_MEM_SIZE => {
                return Err(HostError::LocalMemoryExceeded {
                    requested: size,
                    limit: LOCAL_MEM_SIZE,
                });
            }
            ArgValue::Local(size) => HostArg::Local(size),
            ArgValue::Scalar(bytes) => HostArg::Scalar(bytes.to_vec()),
        });
        Ok(())
    }

    fn enqueue_kernel(
        &self,
        kernel: &HostKernel,
        range: &NdRange,
    ) -> Result<HostEvent, HostError> {
        Self::check_range(range)?;

        let mut slots = Vec::with_capacity(kernel.args.len());
        for (index, arg) in kernel.args.iter().enumerate() {
            let slot = match arg {
                None => {
                    return Err(HostError::ArgNotSet {
                        kernel: kernel.name.clone(),
                        index,
                    });
                }
                Some(HostArg::Buffer(buffer)) => Slot::Buffer {
                    memory: buffer
                        .try_lock()
                        .ok_or(HostError::BufferAliased { index })?,
                    access: buffer.access(),
                },
                Some(HostArg::Local(size)) => Slot::Local(HostMemory::zeroed(*size)),
                Some(HostArg::Scalar(bytes)) => Slot::Scalar(bytes),
            };
            slots.push(slot);
        }

        log::trace!(
            "Running host kernel {} over {:?}",
            kernel.name,
            range.global().as_slice()
        );
        let mut launch = HostLaunch::new(&kernel.name, *range, &kernel.defines, slots);
        (kernel.func)(&mut launch)?;

        HostCounters::bump(&self.counters.launches);
        Ok(self.counters.next_event())
    }

    unsafe fn enqueue_read(
        &self,
        buffer: &HostBuffer,
        host: &mut [u8],
    ) -> Result<HostEvent, HostError> {
        let memory = buffer.lock();
        if host.len() > memory.len() {
            return Err(HostError::ReadOutOfBounds {
                requested: host.len(),
                available: memory.len(),
            });
        }
        host.copy_from_slice(&memory.bytes()[..host.len()]);

        HostCounters::bump(&self.counters.reads);
        Ok(self.counters.next_event())
    }
}
