//! Common test utilities for queue integration tests

#![allow(dead_code)]

use clqueue::host::{HostBackend, HostError, HostLaunch};
use std::path::PathBuf;
use tempfile::TempDir;

pub const EPSILON: f32 = 1e-5;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn vec_approx_eq(a: &[f32], b: &[f32]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| approx_eq(*x, *y))
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const KERNELS: &str = r#"
// Kernels shared by the integration tests

__kernel void vadd(__global const float* a,
                   __global const float* b,
                   __global float* c) {
    int i = get_global_id(0);
    c[i] = a[i] + b[i];
}

__kernel void saxpy(__global float* y, __global const float* x, const float a) {
    int i = get_global_id(0);
    y[i] += a * x[i];
}

__kernel void checksum(__global const uint* data) {
    uint acc = 0;
    for (int i = 0; i < get_global_size(0); ++i) acc ^= data[i];
}

__kernel void split(__global const int* input,
                    __local int* scratch,
                    __global int* evens,
                    const uint n,
                    __global int* odds) {
    int i = get_global_id(0);
    scratch[2 * i] = input[2 * i];
    scratch[2 * i + 1] = input[2 * i + 1];
    barrier(CLK_LOCAL_MEM_FENCE);
    if (i < n) {
        evens[i] = scratch[2 * i];
        odds[i] = scratch[2 * i + 1];
    }
}

__kernel void block_sums(__global const float* input,
                         __global float* sums,
                         __local float* scratch) {
    int lid = get_local_id(0);
    scratch[lid] = input[get_global_id(0)];
    barrier(CLK_LOCAL_MEM_FENCE);
    if (lid == 0) {
        float acc = 0.0f;
        for (int k = 0; k < BLOCK_SIZE; ++k) acc += scratch[k];
        sums[get_group_id(0)] = acc;
    }
}
"#;

/// Temporary directory holding kernel source files
pub struct SourceDir {
    dir: TempDir,
}

impl SourceDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Write `source` to `name` and return its path
    pub fn write(&self, name: &str, source: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, source).unwrap();
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn vadd(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let a = launch.read::<f32>(0)?;
    let b = launch.read::<f32>(1)?;
    let ids = launch.global_ids();
    let c = launch.view_mut::<f32>(2)?;
    for [i, _, _] in ids {
        c[i] = a[i] + b[i];
    }
    Ok(())
}

fn saxpy(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let x = launch.read::<f32>(1)?;
    let a: f32 = launch.scalar(2)?;
    let ids = launch.global_ids();
    let y = launch.view_mut::<f32>(0)?;
    for [i, _, _] in ids {
        y[i] += a * x[i];
    }
    Ok(())
}

fn checksum(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let data = launch.view::<u32>(0)?;
    let _ = data.iter().fold(0, |acc, v| acc ^ v);
    Ok(())
}

fn split(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let input = launch.read::<i32>(0)?;
    let n = launch.scalar::<u32>(3)? as usize;
    let ids = launch.global_ids();

    let scratch = launch.view_mut::<i32>(1)?;
    scratch[..input.len()].copy_from_slice(&input);
    let staged = scratch.to_vec();

    let evens = launch.view_mut::<i32>(2)?;
    for [i, _, _] in ids.clone() {
        if i < n {
            evens[i] = staged[2 * i];
        }
    }
    let odds = launch.view_mut::<i32>(4)?;
    for [i, _, _] in ids {
        if i < n {
            odds[i] = staged[2 * i + 1];
        }
    }
    Ok(())
}

fn block_sums(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let block = launch.define_usize("BLOCK_SIZE")?;
    let input = launch.read::<f32>(0)?;
    let groups = launch.range().work_items() / block;

    let mut sums = Vec::with_capacity(groups);
    for chunk in input.chunks(block).take(groups) {
        let scratch = launch.view_mut::<f32>(2)?;
        scratch[..block].copy_from_slice(chunk);
        sums.push(scratch[..block].iter().sum::<f32>());
    }
    launch.view_mut::<f32>(1)?[..groups].copy_from_slice(&sums);
    Ok(())
}

/// Host backend with every kernel of [`KERNELS`] registered
pub fn host_backend() -> HostBackend {
    HostBackend::new()
        .with_kernel("vadd", vadd)
        .with_kernel("saxpy", saxpy)
        .with_kernel("checksum", checksum)
        .with_kernel("split", split)
        .with_kernel("block_sums", block_sums)
}
