// Failed resource creation surfaces as an error and leaves the device usable.

use strata_renderer::{GpuContext, RenderError};

/// Headless device for testing (gracefully fails if no GPU)
fn headless() -> Option<GpuContext> {
    GpuContext::headless(64, 64, wgpu::TextureFormat::Rgba8Unorm).ok()
}

#[test]
fn broken_shader_is_an_error_not_a_panic() {
    let Some(gpu) = headless() else {
        eprintln!("Skipping broken_shader_is_an_error_not_a_panic (no GPU)");
        return;
    };

    let result = gpu.create_checked("Broken Shader", |device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Broken Shader"),
            source: wgpu::ShaderSource::Wgsl("@fragment fn main() -> @location(0) vec4<f32> { return nope; }".into()),
        })
    });

    match result {
        Err(error @ (RenderError::Validation { .. } | RenderError::Internal { .. })) => {
            assert!(error.to_string().contains("Broken Shader"), "{error}");
        }
        Err(other) => panic!("unexpected error kind: {other}"),
        Ok(_) => panic!("invalid WGSL was accepted"),
    }

    // Every scope was popped, so the next creation starts clean.
    let buffer = gpu.create_checked("After Failure", |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("After Failure"),
            size: 256,
            usage: wgpu::BufferUsages::UNIFORM,
            mapped_at_creation: false,
        })
    });
    assert!(buffer.is_ok());
}

#[test]
fn oversized_texture_is_an_error() {
    let Some(gpu) = headless() else {
        eprintln!("Skipping oversized_texture_is_an_error (no GPU)");
        return;
    };

    let limit = gpu.device.limits().max_texture_dimension_2d;
    let result = gpu.create_checked("Oversized Target", |device| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Oversized Target"),
            size: wgpu::Extent3d {
                width: limit + 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    });
    assert!(matches!(result, Err(RenderError::Validation { .. })));
}
