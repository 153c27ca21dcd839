//! Queue configuration

use crate::error::ConfigError;

/// Block size the kernels are built with unless configured otherwise
pub const DEFAULT_BLOCK_SIZE: usize = 2;

/// Queue configuration
///
/// The platform and device names are substrings matched against the
/// runtime's enumeration by backends that select a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Platform name substring (empty matches any platform)
    pub platform_name: String,
    /// Device name substring (empty matches any device)
    pub device_name: String,
    /// Options passed to every program build
    pub build_options: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            platform_name: String::new(),
            device_name: String::new(),
            build_options: block_size_option(DEFAULT_BLOCK_SIZE),
        }
    }
}

impl QueueConfig {
    /// Read overrides from the environment
    ///
    /// - `CLQUEUE_PLATFORM`: platform name substring
    /// - `CLQUEUE_DEVICE`: device name substring
    /// - `CLQUEUE_BUILD_OPTIONS`: full build option string
    /// - `CLQUEUE_BLOCK_SIZE`: block size, ignored when build options are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(platform) = lookup("CLQUEUE_PLATFORM") {
            config.platform_name = platform;
        }
        if let Some(device) = lookup("CLQUEUE_DEVICE") {
            config.device_name = device;
        }

        if let Some(options) = lookup("CLQUEUE_BUILD_OPTIONS") {
            config.build_options = options;
        } else if let Some(value) = lookup("CLQUEUE_BLOCK_SIZE") {
            let block_size = parse_block_size(&value)?;
            config.build_options = block_size_option(block_size);
        }

        log::debug!("Queue config: {:?}", config);
        Ok(config)
    }

    pub fn with_platform(mut self, name: impl Into<String>) -> Self {
        self.platform_name = name.into();
        self
    }

    pub fn with_device(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_build_options(mut self, options: impl Into<String>) -> Self {
        self.build_options = options.into();
        self
    }

    /// Replace the build options with a single `BLOCK_SIZE` definition
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.build_options = block_size_option(block_size);
        self
    }
}

fn block_size_option(block_size: usize) -> String {
    format!("-D BLOCK_SIZE={}", block_size)
}

fn parse_block_size(value: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: "CLQUEUE_BLOCK_SIZE",
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let block_size: usize = value
        .trim()
        .parse()
        .map_err(|_| invalid("not an unsigned integer"))?;
    if block_size == 0 {
        return Err(invalid("must be > 0"));
    }
    Ok(block_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_build_options() {
        let config = QueueConfig::default();
        assert_eq!(config.build_options, "-D BLOCK_SIZE=2");
        assert!(config.platform_name.is_empty());
        assert!(config.device_name.is_empty());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = QueueConfig::from_lookup(lookup_from(&[
            ("CLQUEUE_PLATFORM", "NVIDIA"),
            ("CLQUEUE_DEVICE", "GeForce"),
            ("CLQUEUE_BLOCK_SIZE", "16"),
        ]))
        .unwrap();

        assert_eq!(config.platform_name, "NVIDIA");
        assert_eq!(config.device_name, "GeForce");
        assert_eq!(config.build_options, "-D BLOCK_SIZE=16");
    }

    #[test]
    fn test_explicit_options_win_over_block_size() {
        let config = QueueConfig::from_lookup(lookup_from(&[
            ("CLQUEUE_BUILD_OPTIONS", "-cl-fast-relaxed-math"),
            ("CLQUEUE_BLOCK_SIZE", "16"),
        ]))
        .unwrap();
        assert_eq!(config.build_options, "-cl-fast-relaxed-math");
    }

    #[rstest]
    #[case("0")]
    #[case("-4")]
    #[case("big")]
    fn test_invalid_block_size(#[case] value: &str) {
        let result = QueueConfig::from_lookup(lookup_from(&[("CLQUEUE_BLOCK_SIZE", value)]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "CLQUEUE_BLOCK_SIZE",
                ..
            })
        ));
    }

    #[test]
    fn test_builder_methods() {
        let config = QueueConfig::default()
            .with_platform("AMD")
            .with_device("gfx")
            .with_block_size(8);
        assert_eq!(config.platform_name, "AMD");
        assert_eq!(config.device_name, "gfx");
        assert_eq!(config.build_options, "-D BLOCK_SIZE=8");
    }
}
