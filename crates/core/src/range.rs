//! Execution shapes
//!
//! Mirrors the offset / global / local triple handed to the runtime when a
//! kernel is enqueued. Absent offset or local sizes map to the runtime's
//! null range.

/// A 1 to 3 dimensional size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    dims: u32,
    sizes: [usize; 3],
}

impl Extent {
    pub fn new_1d(x: usize) -> Self {
        Self {
            dims: 1,
            sizes: [x, 1, 1],
        }
    }

    pub fn new_2d(x: usize, y: usize) -> Self {
        Self {
            dims: 2,
            sizes: [x, y, 1],
        }
    }

    pub fn new_3d(x: usize, y: usize, z: usize) -> Self {
        Self {
            dims: 3,
            sizes: [x, y, z],
        }
    }

    /// Number of meaningful dimensions
    pub fn dims(&self) -> u32 {
        self.dims
    }

    /// Sizes padded with ones up to three dimensions
    pub fn as_array(&self) -> [usize; 3] {
        self.sizes
    }

    /// Sizes of the meaningful dimensions only
    pub fn as_slice(&self) -> &[usize] {
        &self.sizes[..self.dims as usize]
    }

    /// Product of all dimensions
    pub fn volume(&self) -> usize {
        self.as_slice().iter().product()
    }
}

impl From<usize> for Extent {
    fn from(x: usize) -> Self {
        Self::new_1d(x)
    }
}

impl From<[usize; 1]> for Extent {
    fn from([x]: [usize; 1]) -> Self {
        Self::new_1d(x)
    }
}

impl From<[usize; 2]> for Extent {
    fn from([x, y]: [usize; 2]) -> Self {
        Self::new_2d(x, y)
    }
}

impl From<[usize; 3]> for Extent {
    fn from([x, y, z]: [usize; 3]) -> Self {
        Self::new_3d(x, y, z)
    }
}

impl From<(usize, usize)> for Extent {
    fn from((x, y): (usize, usize)) -> Self {
        Self::new_2d(x, y)
    }
}

impl From<(usize, usize, usize)> for Extent {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self::new_3d(x, y, z)
    }
}

/// Work offset, global size and local group size of one kernel launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NdRange {
    offset: Option<Extent>,
    global: Extent,
    local: Option<Extent>,
}

impl NdRange {
    /// Launch over `global` work items with no offset and a runtime-chosen
    /// group size
    pub fn new(global: impl Into<Extent>) -> Self {
        Self {
            offset: None,
            global: global.into(),
            local: None,
        }
    }

    pub fn with_offset(mut self, offset: impl Into<Extent>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn with_local(mut self, local: impl Into<Extent>) -> Self {
        self.local = Some(local.into());
        self
    }

    /// Global work offset, if any
    pub fn offset(&self) -> Option<Extent> {
        self.offset
    }

    /// Global work size
    pub fn global(&self) -> Extent {
        self.global
    }

    /// Work-group size; `None` lets the runtime choose
    pub fn local(&self) -> Option<Extent> {
        self.local
    }

    /// Dimension count passed to the runtime
    pub fn work_dim(&self) -> u32 {
        self.global.dims()
    }

    /// Total number of work items
    pub fn work_items(&self) -> usize {
        self.global.volume()
    }
}
