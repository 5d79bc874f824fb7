use wgpu::{Device, Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages};

pub struct TextureHelper;

impl TextureHelper {
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float; // Standard depth format

    /// Depth target that can also be bound for reading, e.g. by the deferred lighting pass.
    pub fn create_depth_texture(
        device: &Device,
        width: u32,
        height: u32,
        label: &str,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        Self::create_target(
            device,
            width,
            height,
            Self::DEPTH_FORMAT,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            label,
        )
    }

    pub fn create_target(
        device: &Device,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsages,
        label: &str,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}

/// A sampled 2D texture with its view and sampler.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub const FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

    /// Uploads tightly packed RGBA8 texels.
    pub fn from_rgba8(
        device: &Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        texels: &[u8],
        label: &str,
    ) -> Self {
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: Self::FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// The deferred path's attribute targets. All share the surface size and are
/// rebuilt together on resize.
pub struct GBuffer {
    pub position: wgpu::TextureView,
    pub albedo: wgpu::TextureView,
    pub normal: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    textures: [wgpu::Texture; 4],
}

impl GBuffer {
    pub const POSITION_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
    pub const ALBEDO_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
    pub const NORMAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

    /// Color target formats in `@location` order.
    pub const COLOR_FORMATS: [TextureFormat; 3] = [
        Self::POSITION_FORMAT,
        Self::ALBEDO_FORMAT,
        Self::NORMAL_FORMAT,
    ];

    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let usage = TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING;
        let (position_tex, position) =
            TextureHelper::create_target(device, width, height, Self::POSITION_FORMAT, usage, "G-Buffer Position");
        let (albedo_tex, albedo) =
            TextureHelper::create_target(device, width, height, Self::ALBEDO_FORMAT, usage, "G-Buffer Albedo");
        let (normal_tex, normal) =
            TextureHelper::create_target(device, width, height, Self::NORMAL_FORMAT, usage, "G-Buffer Normal");
        let (depth_tex, depth) = TextureHelper::create_depth_texture(device, width, height, "G-Buffer Depth");

        Self {
            position,
            albedo,
            normal,
            depth,
            textures: [position_tex, albedo_tex, normal_tex, depth_tex],
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.textures[0].width(), self.textures[0].height())
    }
}
