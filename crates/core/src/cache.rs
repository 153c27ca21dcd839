//! Program and kernel cache
//!
//! Compiled programs are keyed by source path and kernel handles by
//! (path, kernel name). Entries are inserted on first use and are never
//! evicted, so the cache grows with the number of distinct kernels a queue
//! has seen. [`ProgramCache::clear`] is the only way to drop entries.

use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

/// Cache key of a kernel handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelKey {
    path: PathBuf,
    name: String,
}

impl KernelKey {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Source file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kernel function name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for KernelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}; {}", self.path.display(), self.name)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Programs compiled successfully
    pub program_builds: usize,
    /// Program builds that failed
    pub build_failures: usize,
    /// Submissions that found their program already built
    pub program_hits: usize,
    /// Kernel handles created (including recreations after a build)
    pub kernel_creations: usize,
    /// Submissions that reused a cached kernel handle
    pub kernel_hits: usize,
}

/// Unbounded program and kernel cache
pub struct ProgramCache<P, K> {
    programs: FxHashMap<PathBuf, P>,
    kernels: FxHashMap<KernelKey, K>,
    stats: CacheStats,
}

impl<P, K> Default for ProgramCache<P, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, K> ProgramCache<P, K> {
    pub fn new() -> Self {
        Self {
            programs: FxHashMap::default(),
            kernels: FxHashMap::default(),
            stats: CacheStats::default(),
        }
    }

    /// Whether a program built from `path` is cached
    pub fn contains_program(&self, path: &Path) -> bool {
        self.programs.contains_key(path)
    }

    /// Whether the kernel for `key` is cached
    pub fn contains_kernel(&self, key: &KernelKey) -> bool {
        self.kernels.contains_key(key)
    }

    /// Return the kernel for `key`, building and creating what is missing
    ///
    /// `build` runs only when no program is cached for the key's path; a
    /// failed build stores nothing. When the program was built by this call
    /// the kernel handle is recreated with `create` even if one is cached,
    /// since the old handle belongs to a previous program object.
    pub fn kernel<E>(
        &mut self,
        key: &KernelKey,
        build: impl FnOnce(&Path) -> Result<P, E>,
        create: impl FnOnce(&P) -> Result<K, E>,
    ) -> Result<&mut K, E> {
        let (program, rebuilt) = match self.programs.entry(key.path().to_path_buf()) {
            Entry::Occupied(entry) => {
                self.stats.program_hits += 1;
                (entry.into_mut(), false)
            }
            Entry::Vacant(entry) => match build(entry.key()) {
                Ok(program) => {
                    self.stats.program_builds += 1;
                    (entry.insert(program), true)
                }
                Err(e) => {
                    self.stats.build_failures += 1;
                    return Err(e);
                }
            },
        };

        match self.kernels.entry(key.clone()) {
            Entry::Occupied(entry) if !rebuilt => {
                self.stats.kernel_hits += 1;
                Ok(entry.into_mut())
            }
            entry => {
                let kernel = create(program)?;
                self.stats.kernel_creations += 1;

                Ok(match entry {
                    Entry::Occupied(mut entry) => {
                        entry.insert(kernel);
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => entry.insert(kernel),
                })
            }
        }
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    /// Cumulative counters, not reset by `clear`
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every program and kernel; statistics are kept
    pub fn clear(&mut self) {
        self.kernels.clear();
        self.programs.clear();
    }
}
