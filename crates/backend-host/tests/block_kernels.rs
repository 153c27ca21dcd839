//! Host kernels that use work groups, local scratch and build defines,
//! driven through the queue

use clqueue_backend_host::{HostBackend, HostError, HostLaunch};
use clqueue_core::{ComputeQueue, KernelArg, NdRange, QueueConfig};
use std::io::Write;
use tempfile::NamedTempFile;

const BLOCK_SUM: &str = r#"
__kernel void block_sum(__global const int* input,
                        __global int* partial,
                        __local int* scratch) {
    int lid = get_local_id(0);
    scratch[lid] = input[get_global_id(0)];
    barrier(CLK_LOCAL_MEM_FENCE);
    for (int s = BLOCK_SIZE / 2; s > 0; s >>= 1) {
        if (lid < s) scratch[lid] += scratch[lid + s];
        barrier(CLK_LOCAL_MEM_FENCE);
    }
    if (lid == 0) partial[get_group_id(0)] = scratch[0];
}
"#;

const TRANSPOSE: &str = r#"
__kernel void transpose(__global const float* src, __global float* dst,
                        const uint width, const uint height) {
    uint x = get_global_id(0);
    uint y = get_global_id(1);
    dst[x * height + y] = src[y * width + x];
}
"#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn source_file(source: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".cl").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

/// Sums each work group of `BLOCK_SIZE` items through the local scratch
fn block_sum(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let block = launch.define_usize("BLOCK_SIZE")?;
    let input = launch.read::<i32>(0)?;
    let groups = launch.range().work_items() / block;

    let mut sums = Vec::with_capacity(groups);
    for group in 0..groups {
        let scratch = launch.view_mut::<i32>(2)?;
        scratch[..block].copy_from_slice(&input[group * block..(group + 1) * block]);
        let mut stride = block / 2;
        while stride > 0 {
            for lid in 0..stride {
                scratch[lid] += scratch[lid + stride];
            }
            stride /= 2;
        }
        sums.push(scratch[0]);
    }

    launch.view_mut::<i32>(1)?[..groups].copy_from_slice(&sums);
    Ok(())
}

fn transpose(launch: &mut HostLaunch<'_>) -> Result<(), HostError> {
    let width = launch.scalar::<u32>(2)? as usize;
    let height = launch.scalar::<u32>(3)? as usize;
    let src = launch.read::<f32>(0)?;
    let ids = launch.global_ids();
    let dst = launch.view_mut::<f32>(1)?;
    for [x, y, _] in ids {
        dst[x * height + y] = src[y * width + x];
    }
    Ok(())
}

#[test]
fn test_block_sum_uses_block_size_define() {
    init_logger();
    let file = source_file(BLOCK_SUM);
    let backend = HostBackend::new().with_kernel("block_sum", block_sum);
    let mut queue = ComputeQueue::with_config(backend, QueueConfig::default().with_block_size(4));

    let input: Vec<i32> = (1..=16).collect();
    let task = queue
        .submit(
            file.path(),
            "block_sum",
            &NdRange::new(16usize).with_local(4usize),
            vec![
                KernelArg::input(&input),
                KernelArg::output_len::<i32>(4),
                KernelArg::local::<i32>(4),
            ],
        )
        .unwrap();

    let outputs = task.get().unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].position(), 1);
    assert_eq!(outputs[0].to_vec::<i32>(), vec![10, 26, 42, 58]);
}

#[test]
fn test_block_sum_without_define_fails_in_kernel() {
    init_logger();
    let file = source_file(BLOCK_SUM);
    let backend = HostBackend::new().with_kernel("block_sum", block_sum);
    let mut queue = ComputeQueue::with_config(
        backend,
        QueueConfig::default().with_build_options("-cl-fast-relaxed-math"),
    );

    let input = vec![1i32; 4];
    let err = queue
        .submit(
            file.path(),
            "block_sum",
            &NdRange::new(4usize),
            vec![
                KernelArg::input(&input),
                KernelArg::output_len::<i32>(1),
                KernelArg::local::<i32>(4),
            ],
        )
        .unwrap_err();
    assert!(err.to_string().contains("BLOCK_SIZE"), "{}", err);
}

#[test]
fn test_transpose_2d() {
    init_logger();
    let file = source_file(TRANSPOSE);
    let backend = HostBackend::new().with_kernel("transpose", transpose);
    let mut queue = ComputeQueue::new(backend);

    // 3 wide, 2 high
    let src = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
    let task = queue
        .submit(
            file.path(),
            "transpose",
            &NdRange::new([3usize, 2]),
            vec![
                KernelArg::input(&src),
                KernelArg::output_len::<f32>(6),
                KernelArg::scalar(3u32),
                KernelArg::scalar(2u32),
            ],
        )
        .unwrap();

    let dst: Vec<f32> = task.get().unwrap()[0].to_vec();
    assert_eq!(dst, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    assert_eq!(queue.backend().stats().buffers_created, 2);
}
