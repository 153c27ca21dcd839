//! Kernels, events and the command path

use crate::device::OpenCLBackend;
use crate::error::{OpenCLError, core_error};
use clqueue_core::{ArgValue, Backend, BuildFailure, DeviceEvent, MemAccess, NdRange};
use ocl::core::{self, ArgVal};
use ocl::{Buffer, Program, flags};
use std::ffi::c_void;

/// Kernel object of a built program
#[derive(Debug)]
pub struct OpenCLKernel {
    name: String,
    kernel: core::Kernel,
}

impl OpenCLKernel {
    /// Kernel function name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_core(&self) -> &core::Kernel {
        &self.kernel
    }
}

/// Completion event of an enqueued command
#[derive(Debug, Clone)]
pub struct OpenCLEvent(core::Event);

impl OpenCLEvent {
    pub fn as_core(&self) -> &core::Event {
        &self.0
    }
}

impl DeviceEvent for OpenCLEvent {
    type Error = OpenCLError;

    fn wait(&self) -> Result<(), OpenCLError> {
        core::wait_for_event(&self.0).map_err(core_error)
    }

    fn is_complete(&self) -> Result<bool, OpenCLError> {
        core::event_is_complete(&self.0).map_err(core_error)
    }
}

impl Backend for OpenCLBackend {
    type Program = Program;
    type Kernel = OpenCLKernel;
    type Buffer = Buffer<u8>;
    type Event = OpenCLEvent;
    type Error = OpenCLError;

    fn name(&self) -> &str {
        "opencl"
    }

    fn build_program(&self, source: &str, options: &str) -> Result<Program, BuildFailure> {
        Program::builder()
            .src(source)
            .devices(self.device)
            .cmplr_opt(options)
            .build(&self.context)
            .map_err(|e| BuildFailure::new(e.to_string()))
    }

    fn create_kernel(&self, program: &Program, name: &str) -> Result<OpenCLKernel, OpenCLError> {
        let kernel = core::create_kernel(program.as_core(), name).map_err(core_error)?;
        Ok(OpenCLKernel {
            name: name.to_string(),
            kernel,
        })
    }

    fn create_buffer(
        &self,
        access: MemAccess,
        size: usize,
        host: Option<&[u8]>,
    ) -> Result<Buffer<u8>, OpenCLError> {
        if size == 0 {
            return Err("Invalid buffer size 0".into());
        }

        // `copy_host_slice` adds MEM_COPY_HOST_PTR
        let mem_flags = match access {
            MemAccess::ReadOnly => flags::MEM_READ_ONLY,
            MemAccess::WriteOnly => flags::MEM_WRITE_ONLY,
            MemAccess::ReadWrite => flags::MEM_READ_WRITE,
        };

        let mut builder = Buffer::<u8>::builder()
            .queue(self.queue.clone())
            .flags(mem_flags)
            .len(size);
        if let Some(data) = host {
            let data = data.get(..size).ok_or_else(|| {
                format!(
                    "Host data of {} bytes is shorter than the buffer size {}",
                    data.len(),
                    size
                )
            })?;
            builder = builder.copy_host_slice(data);
        }
        Ok(builder.build()?)
    }

    fn set_arg(
        &self,
        kernel: &mut OpenCLKernel,
        index: u32,
        value: ArgValue<'_, Buffer<u8>>,
    ) -> Result<(), OpenCLError> {
        let arg = match &value {
            ArgValue::Buffer(buffer) => ArgVal::mem(buffer.as_core()),
            ArgValue::Local(size) => ArgVal::local::<u8>(size),
            // SAFETY: the runtime copies the value before clSetKernelArg
            // returns, and `bytes` outlives the call.
            ArgValue::Scalar(bytes) => unsafe {
                ArgVal::from_raw(bytes.len(), bytes.as_ptr() as *const c_void, false)
            },
        };
        core::set_kernel_arg(&kernel.kernel, index, arg).map_err(|e| {
            OpenCLError::from(format!(
                "Failed to set argument {} of kernel {}: {}",
                index, kernel.name, e
            ))
        })
    }

    fn enqueue_kernel(
        &self,
        kernel: &OpenCLKernel,
        range: &NdRange,
    ) -> Result<OpenCLEvent, OpenCLError> {
        let mut event = core::Event::null();
        // SAFETY: every argument was bound by the caller, and buffers bound to
        // the kernel are kept alive by the task handle until the queue is past
        // this command.
        unsafe {
            core::enqueue_kernel(
                self.queue.as_core(),
                &kernel.kernel,
                range.work_dim(),
                range.offset().map(|o| o.as_array()),
                &range.global().as_array(),
                range.local().map(|l| l.as_array()),
                None::<&core::Event>,
                Some(&mut event),
            )
        }
        .map_err(core_error)?;
        // Submit now so polling `is_complete` alone observes progress.
        core::flush(self.queue.as_core()).map_err(core_error)?;
        Ok(OpenCLEvent(event))
    }

    unsafe fn enqueue_read(
        &self,
        buffer: &Buffer<u8>,
        host: &mut [u8],
    ) -> Result<OpenCLEvent, OpenCLError> {
        let mut event = core::Event::null();
        // SAFETY: forwarded to the caller, see `Backend::enqueue_read`.
        unsafe {
            core::enqueue_read_buffer(
                self.queue.as_core(),
                buffer.as_core(),
                false,
                0,
                host,
                None::<&core::Event>,
                Some(&mut event),
            )
        }
        .map_err(core_error)?;
        // Submit now so polling `is_complete` alone observes progress.
        core::flush(self.queue.as_core()).map_err(core_error)?;
        Ok(OpenCLEvent(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: &str = r#"
        __kernel void scale(__global float* data, const float factor) {
            int i = get_global_id(0);
            data[i] *= factor;
        }
    "#;

    fn backend() -> Option<OpenCLBackend> {
        if !OpenCLBackend::is_available() {
            println!("OpenCL not available, skipping test");
            return None;
        }
        Some(OpenCLBackend::new().unwrap())
    }

    #[test]
    fn test_build_failure_carries_log() {
        let Some(backend) = backend() else { return };
        let failure = backend
            .build_program("__kernel void broken( {", "")
            .unwrap_err();
        assert!(!failure.log.is_empty());
    }

    #[test]
    fn test_zero_size_buffer() {
        let Some(backend) = backend() else { return };
        assert!(backend.create_buffer(MemAccess::ReadOnly, 0, None).is_err());
    }

    #[test]
    fn test_scale_in_place() {
        let Some(backend) = backend() else { return };
        let program = backend.build_program(SCALE, "").unwrap();
        let mut kernel = backend.create_kernel(&program, "scale").unwrap();

        let data = [1.0f32, 2.0, 3.0, 4.0];
        let buffer = backend
            .create_buffer(MemAccess::ReadWrite, 16, Some(bytemuck::cast_slice(&data)))
            .unwrap();
        backend
            .set_arg(&mut kernel, 0, ArgValue::Buffer(&buffer))
            .unwrap();
        backend
            .set_arg(&mut kernel, 1, ArgValue::Scalar(&3.0f32.to_ne_bytes()))
            .unwrap();
        backend
            .enqueue_kernel(&kernel, &NdRange::new(4usize))
            .unwrap();

        let mut host = vec![0u8; 16];
        let event = unsafe { backend.enqueue_read(&buffer, &mut host) }.unwrap();
        event.wait().unwrap();
        assert!(event.is_complete().unwrap());

        let result: Vec<f32> = bytemuck::pod_collect_to_vec(&host);
        assert_eq!(result, vec![3.0, 6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_missing_kernel_name() {
        let Some(backend) = backend() else { return };
        let program = backend.build_program(SCALE, "").unwrap();
        assert!(backend.create_kernel(&program, "nope").is_err());
    }
}
