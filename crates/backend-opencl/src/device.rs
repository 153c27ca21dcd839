//! Platform and device selection

use crate::error::OpenCLError;
use clqueue_core::QueueConfig;
use ocl::{Context as OclContext, Device as OclDevice, Platform, Queue};

/// OpenCL backend
///
/// Holds the selected platform and device, a context for that device and
/// one in-order command queue every command goes to.
#[derive(Clone)]
pub struct OpenCLBackend {
    pub(crate) platform: Platform,
    pub(crate) device: OclDevice,
    pub(crate) context: OclContext,
    pub(crate) queue: Queue,
}

impl OpenCLBackend {
    /// First device of the default platform
    pub fn new() -> Result<Self, OpenCLError> {
        let platform = Platform::default();
        let device = OclDevice::list_all(platform)?
            .into_iter()
            .next()
            .ok_or("No OpenCL devices found")?;
        Self::with_platform_device(platform, device)
    }

    /// First device whose platform and device names contain the given
    /// substrings
    ///
    /// Empty substrings match anything.
    pub fn select(platform_name: &str, device_name: &str) -> Result<Self, OpenCLError> {
        for platform in Platform::list() {
            let name = platform.name()?;
            if !name.contains(platform_name) {
                continue;
            }

            for device in OclDevice::list_all(platform)? {
                if device.name()?.contains(device_name) {
                    return Self::with_platform_device(platform, device);
                }
            }
        }

        Err(format!(
            "No OpenCL device matching platform {:?} and device {:?}",
            platform_name, device_name
        )
        .into())
    }

    /// Device named by the platform and device substrings of `config`
    pub fn from_config(config: &QueueConfig) -> Result<Self, OpenCLError> {
        Self::select(&config.platform_name, &config.device_name)
    }

    fn with_platform_device(platform: Platform, device: OclDevice) -> Result<Self, OpenCLError> {
        let context = OclContext::builder()
            .platform(platform)
            .devices(device)
            .build()?;
        let queue = Queue::new(&context, device, None)?;

        let backend = Self {
            platform,
            device,
            context,
            queue,
        };
        log::info!(
            "Using OpenCL device {} on {}",
            backend.device_name(),
            backend.platform_name()
        );
        Ok(backend)
    }

    /// Whether any platform exposes at least one device
    pub fn is_available() -> bool {
        for platform in Platform::list() {
            if let Ok(devices) = OclDevice::list_all(platform)
                && !devices.is_empty()
            {
                return true;
            }
        }
        false
    }

    /// Names of all devices of all platforms
    pub fn list_devices() -> Result<Vec<String>, OpenCLError> {
        let mut names = Vec::new();
        for platform in Platform::list() {
            for device in OclDevice::list_all(platform)? {
                names.push(device.name()?);
            }
        }
        Ok(names)
    }

    /// Device name as reported by the driver
    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Platform name as reported by the driver
    pub fn platform_name(&self) -> String {
        self.platform
            .name()
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Underlying `ocl` context
    pub fn ocl_context(&self) -> &OclContext {
        &self.context
    }

    /// In-order command queue all commands go to
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Underlying `ocl` device
    pub fn ocl_device(&self) -> OclDevice {
        self.device
    }
}

impl std::fmt::Debug for OpenCLBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenCLBackend")
            .field("platform", &self.platform_name())
            .field("device", &self.device_name())
            .finish()
    }
}
