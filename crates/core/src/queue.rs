//! In-order compute queue

use crate::arg::{Direction, KernelArg, OutputValue};
use crate::backend::{ArgValue, Backend, DeviceEvent, MemAccess};
use crate::cache::{CacheStats, KernelKey, ProgramCache};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::future::TaskFuture;
use crate::range::NdRange;
use std::path::{Path, PathBuf};

/// Simple kernel dispatch over one in-order command queue
///
/// Programs are built from source files on first use and cached by path;
/// kernel handles are cached by (path, kernel name). Each
/// [`submit`](Self::submit) binds the arguments, enqueues the kernel and the
/// read-backs of its outputs, and returns a [`TaskFuture`] without waiting
/// for the device.
///
/// `submit` takes `&mut self`: sharing a queue between threads needs an
/// outer lock.
pub struct ComputeQueue<B: Backend> {
    backend: B,
    config: QueueConfig,
    cache: ProgramCache<B::Program, B::Kernel>,
    last_event: Option<B::Event>,
}

impl<B: Backend> ComputeQueue<B> {
    /// Queue over `backend` with the default configuration
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, QueueConfig::default())
    }

    /// Queue over `backend` using `config` for build options
    pub fn with_config(backend: B, config: QueueConfig) -> Self {
        log::debug!(
            "Creating compute queue on {} backend (build options: {:?})",
            backend.name(),
            config.build_options
        );
        Self {
            backend,
            config,
            cache: ProgramCache::new(),
            last_event: None,
        }
    }

    /// Add a task to the queue
    ///
    /// Builds the program at `path` if needed, binds `args` to the kernel
    /// `kernel_name` in order, enqueues the kernel over `range` and then a
    /// non-blocking read-back for every `Output`/`InOut` argument.
    ///
    /// Only host to device copies of inputs happen before this returns;
    /// everything else completes asynchronously and is observed through the
    /// returned future.
    pub fn submit(
        &mut self,
        path: impl AsRef<Path>,
        kernel_name: &str,
        range: &NdRange,
        args: Vec<KernelArg<'_>>,
    ) -> Result<TaskFuture<B>, QueueError<B::Error>> {
        if args.is_empty() {
            return Err(QueueError::NoArguments);
        }

        let path = path.as_ref();
        let key = KernelKey::new(path, kernel_name);
        let backend = &self.backend;
        let build_options = self.config.build_options.as_str();

        let kernel = self.cache.kernel(
            &key,
            |path| build_program(backend, path, build_options),
            |program| {
                log::debug!("Creating kernel {}", key);
                backend
                    .create_kernel(program, kernel_name)
                    .map_err(QueueError::Backend)
            },
        )?;

        // Bind arguments positionally. Every argument with a global buffer
        // keeps its buffer next to the host memory its read-back targets.
        let mut buffers = Vec::new();
        let mut pending = Vec::new();
        for (index, arg) in args.into_iter().enumerate() {
            let position = index as u32;
            let direction = arg.direction();
            log::trace!(
                "Binding arg {} of {} ({}, {} bytes)",
                position,
                key,
                direction,
                arg.size()
            );

            match direction {
                Direction::Input | Direction::InOut | Direction::Output => {
                    let access = match direction {
                        Direction::Input => MemAccess::ReadOnly,
                        Direction::InOut => MemAccess::ReadWrite,
                        _ => MemAccess::WriteOnly,
                    };
                    let buffer = backend
                        .create_buffer(access, arg.size(), arg.initial_data())
                        .map_err(QueueError::Backend)?;
                    backend
                        .set_arg(kernel, position, ArgValue::Buffer(&buffer))
                        .map_err(QueueError::Backend)?;

                    if direction.is_output() {
                        pending.push((
                            buffer.clone(),
                            OutputValue::new(index, direction, arg.into_host()),
                        ));
                    }
                    buffers.push(buffer);
                }
                Direction::Local => {
                    backend
                        .set_arg(kernel, position, ArgValue::Local(arg.size()))
                        .map_err(QueueError::Backend)?;
                }
                Direction::Scalar => {
                    backend
                        .set_arg(kernel, position, ArgValue::Scalar(arg.bytes()))
                        .map_err(QueueError::Backend)?;
                }
            }
        }

        log::debug!(
            "Enqueueing {} over {:?} ({} outputs)",
            key,
            range.global().as_slice(),
            pending.len()
        );
        let mut event = backend
            .enqueue_kernel(kernel, range)
            .map_err(QueueError::Backend)?;

        let mut outputs = Vec::with_capacity(pending.len());
        for (buffer, mut output) in pending {
            // SAFETY: `output` owns the destination and moves into the
            // returned future, which waits for the device before releasing
            // it. Moving the `OutputValue` does not move its heap storage.
            let read = unsafe { backend.enqueue_read(&buffer, output.bytes_mut()) };
            match read {
                Ok(read_event) => event = read_event,
                Err(e) => {
                    // Earlier read-backs still target memory owned by
                    // `outputs`; they must finish before it is freed.
                    if let Err(wait_err) = event.wait() {
                        log::warn!("Failed to drain pending reads: {}", wait_err);
                    }
                    return Err(QueueError::Backend(e));
                }
            }
            outputs.push(output);
        }

        self.last_event = Some(event.clone());
        Ok(TaskFuture::new(event, buffers, outputs))
    }

    /// Block until every task submitted so far has finished
    pub fn finish(&self) -> Result<(), B::Error> {
        match &self.last_event {
            Some(event) => event.wait(),
            None => Ok(()),
        }
    }

    /// Backend the queue drives
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Configuration the queue was created with
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Program build and kernel creation counts since creation
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Whether a built program for `path` is cached
    pub fn is_program_cached(&self, path: impl AsRef<Path>) -> bool {
        self.cache.contains_program(path.as_ref())
    }

    /// Whether kernel `kernel_name` of `path` is cached
    pub fn is_kernel_cached(&self, path: impl AsRef<Path>, kernel_name: &str) -> bool {
        self.cache.contains_kernel(&KernelKey::new(path.as_ref(), kernel_name))
    }

    /// Drop all cached programs and kernels
    ///
    /// The next submission of any kernel rebuilds its program.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl<B: Backend> std::fmt::Debug for ComputeQueue<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeQueue")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("programs", &self.cache.program_count())
            .field("kernels", &self.cache.kernel_count())
            .finish()
    }
}

fn build_program<B: Backend>(
    backend: &B,
    path: &Path,
    options: &str,
) -> Result<B::Program, QueueError<B::Error>> {
    let source = std::fs::read_to_string(path).map_err(|source| QueueError::Source {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "Building {:?} ({} bytes) with options {:?}",
        path,
        source.len(),
        options
    );
    backend.build_program(&source, options).map_err(|failure| {
        log::error!("Build log for {:?}:\n{}", path, failure.log);
        QueueError::Build {
            path: PathBuf::from(path),
            log: failure.log,
        }
    })
}
