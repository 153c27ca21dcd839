//! OpenCL backend errors

/// Error type for OpenCL operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCLError(String);

impl OpenCLError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OpenCLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OpenCL error: {}", self.0)
    }
}

impl std::error::Error for OpenCLError {}

impl From<ocl::Error> for OpenCLError {
    fn from(e: ocl::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<String> for OpenCLError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OpenCLError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Wrap an error of the low-level `ocl::core` API
pub(crate) fn core_error(e: impl std::fmt::Display) -> OpenCLError {
    OpenCLError(e.to_string())
}
