use crate::texture::GpuTexture;

/// Host-side material: a diffuse texture in RGBA8 (sRGB). Texels with alpha below
/// one half are cut out by both render paths.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialData {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<u8>,
}

impl MaterialData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: rgba.to_vec(),
        }
    }

    /// Two-color checkerboard of `cells` x `cells` squares, one texel each.
    pub fn checker(a: [u8; 4], b: [u8; 4], cells: u32) -> Self {
        let cells = cells.max(1);
        let texels = (0..cells * cells)
            .flat_map(|i| if (i % cells + i / cells) % 2 == 0 { a } else { b })
            .collect();
        Self {
            width: cells,
            height: cells,
            texels,
        }
    }
}

pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    pub diffuse: GpuTexture,
}

impl GpuMaterial {
    /// Layout of the material group: diffuse texture then its sampler.
    pub fn create_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                // --- BINDING 0: Diffuse Texture ---
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                // --- BINDING 1: Sampler ---
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        data: &MaterialData,
    ) -> Self {
        let diffuse = GpuTexture::from_rgba8(
            device,
            queue,
            data.width,
            data.height,
            &data.texels,
            "Material Diffuse Texture",
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
            ],
        });

        Self {
            bind_group,
            diffuse,
        }
    }
}
