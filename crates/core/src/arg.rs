//! Kernel argument descriptors
//!
//! A [`KernelArg`] pairs host data with the direction it travels between
//! host and device. The direction decides how the argument is bound and
//! whether it shows up in the outputs of a submission.

use bytemuck::Pod;
use std::borrow::Cow;

/// Direction of a kernel argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host data copied to a read-only device buffer
    Input,
    /// Device buffer read back into host memory after the kernel
    Output,
    /// Copied to the device and read back afterwards
    InOut,
    /// Device-local scratch memory, no host data
    Local,
    /// Plain value passed by copy, no buffer
    Scalar,
}

impl Direction {
    /// Whether the argument is read back after the kernel runs
    pub fn is_output(self) -> bool {
        matches!(self, Direction::Output | Direction::InOut)
    }

    /// Whether host data is copied into the device buffer at bind time
    pub fn copies_to_device(self) -> bool {
        matches!(self, Direction::Input | Direction::InOut)
    }

    /// Whether the argument is backed by a global device buffer
    pub fn needs_buffer(self) -> bool {
        matches!(
            self,
            Direction::Input | Direction::Output | Direction::InOut
        )
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Input => "in",
            Direction::Output => "out",
            Direction::InOut => "in-out",
            Direction::Local => "local",
            Direction::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// A single kernel argument
///
/// Descriptors are immutable once built. Inputs borrow host memory for the
/// duration of the submission call; outputs own the memory their read-back
/// lands in, which moves into the returned future.
#[derive(Debug, Clone)]
pub struct KernelArg<'a> {
    direction: Direction,
    data: Cow<'a, [u8]>,
    size: usize,
}

impl<'a> KernelArg<'a> {
    /// Read-only input borrowed from host memory
    pub fn input<T: Pod>(data: &'a [T]) -> Self {
        let bytes: &'a [u8] = bytemuck::cast_slice(data);
        Self {
            direction: Direction::Input,
            size: bytes.len(),
            data: Cow::Borrowed(bytes),
        }
    }

    /// Output whose device contents are read back into `host`
    pub fn output<T: Pod>(host: Vec<T>) -> Self {
        Self::owned(Direction::Output, host)
    }

    /// Zero-initialized output of `len` elements
    pub fn output_len<T: Pod>(len: usize) -> Self {
        Self::owned(Direction::Output, vec![T::zeroed(); len])
    }

    /// Input that is also read back after the kernel
    pub fn in_out<T: Pod>(host: Vec<T>) -> Self {
        Self::owned(Direction::InOut, host)
    }

    /// Device-local scratch of `len` elements of `T`
    ///
    /// A byte size that overflows `usize` saturates to `usize::MAX`, which
    /// no backend accepts as a local size.
    pub fn local<T: Pod>(len: usize) -> Self {
        Self {
            direction: Direction::Local,
            data: Cow::Borrowed(&[]),
            size: len.saturating_mul(std::mem::size_of::<T>()),
        }
    }

    /// Value passed by copy
    pub fn scalar<T: Pod>(value: T) -> Self {
        let bytes = bytemuck::bytes_of(&value).to_vec();
        Self {
            direction: Direction::Scalar,
            size: bytes.len(),
            data: Cow::Owned(bytes),
        }
    }

    fn owned<T: Pod>(direction: Direction, host: Vec<T>) -> Self {
        let bytes: Vec<u8> = bytemuck::cast_slice(&host).to_vec();
        Self {
            direction,
            size: bytes.len(),
            data: Cow::Owned(bytes),
        }
    }

    /// Direction the argument travels
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Size in bytes, as handed to the runtime
    pub fn size(&self) -> usize {
        self.size
    }

    /// Host bytes (empty for local scratch)
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Host bytes copied to the device at bind time, if any
    pub(crate) fn initial_data(&self) -> Option<&[u8]> {
        self.direction.copies_to_device().then(|| self.bytes())
    }

    /// Takes the host memory that receives a read-back
    pub(crate) fn into_host(self) -> Vec<u8> {
        self.data.into_owned()
    }
}

/// A materialized output of a finished submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputValue {
    position: usize,
    direction: Direction,
    bytes: Vec<u8>,
}

impl OutputValue {
    pub(crate) fn new(position: usize, direction: Direction, bytes: Vec<u8>) -> Self {
        Self {
            position,
            direction,
            bytes,
        }
    }

    /// Positional index of the argument this value came from
    pub fn position(&self) -> usize {
        self.position
    }

    /// Direction of the argument, `Output` or `InOut`
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Raw bytes read back from the device
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies the bytes into a typed vector
    ///
    /// Trailing bytes that do not fill a whole `T` are dropped.
    pub fn to_vec<T: Pod>(&self) -> Vec<T> {
        let whole = self.bytes.len() - self.bytes.len() % std::mem::size_of::<T>().max(1);
        bytemuck::pod_collect_to_vec(&self.bytes[..whole])
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Direction::Input, false, true, true)]
    #[case(Direction::Output, true, false, true)]
    #[case(Direction::InOut, true, true, true)]
    #[case(Direction::Local, false, false, false)]
    #[case(Direction::Scalar, false, false, false)]
    fn test_direction_flags(
        #[case] direction: Direction,
        #[case] output: bool,
        #[case] copies: bool,
        #[case] buffer: bool,
    ) {
        assert_eq!(direction.is_output(), output);
        assert_eq!(direction.copies_to_device(), copies);
        assert_eq!(direction.needs_buffer(), buffer);
    }

    #[test]
    fn test_input_borrows_host_bytes() {
        let data = [1.0f32, 2.0, 3.0];
        let arg = KernelArg::input(&data);
        assert_eq!(arg.direction(), Direction::Input);
        assert_eq!(arg.size(), 12);
        assert_eq!(arg.initial_data(), Some(bytemuck::cast_slice(&data[..])));
    }

    #[test]
    fn test_output_has_no_initial_copy() {
        let arg = KernelArg::output_len::<u32>(4);
        assert_eq!(arg.size(), 16);
        assert!(arg.initial_data().is_none());
        assert_eq!(arg.into_host(), vec![0u8; 16]);
    }

    #[test]
    fn test_local_and_scalar_sizes() {
        let local = KernelArg::local::<f32>(64);
        assert_eq!(local.size(), 256);
        assert!(local.bytes().is_empty());

        let huge = KernelArg::local::<u64>(usize::MAX / 2);
        assert_eq!(huge.size(), usize::MAX);

        let scalar = KernelArg::scalar(7u64);
        assert_eq!(scalar.size(), 8);
        assert_eq!(scalar.bytes(), &7u64.to_ne_bytes());
    }

    #[test]
    fn test_zero_sized_argument_is_allowed() {
        let empty: [i32; 0] = [];
        assert_eq!(KernelArg::input(&empty).size(), 0);
    }

    #[test]
    fn test_output_value_to_vec() {
        let bytes = bytemuck::cast_slice(&[1i32, -2, 3]).to_vec();
        let value = OutputValue::new(2, Direction::InOut, bytes);
        assert_eq!(value.position(), 2);
        assert_eq!(value.to_vec::<i32>(), vec![1, -2, 3]);
    }
}
