//! Owned GPU texture with a stable process-unique id. The id is what the
//! batch's texture-slot allocator deduplicates on.

use std::sync::atomic::{AtomicU32, Ordering};

use wgpu::{TexelCopyBufferLayout, TexelCopyTextureInfo};

static NEXT_TEXTURE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique handle identifying a texture across batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

impl TextureId {
    fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

pub struct Texture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    id: TextureId,
}

impl Texture {
    /// Uploads tightly packed RGBA8 pixels as a new sampleable texture.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            anyhow::bail!(
                "texture '{label}': {} bytes of pixel data, expected {expected} for {width}x{height} RGBA8",
                pixels.len()
            );
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            _texture: texture,
            view,
            id: TextureId::next(),
        })
    }

    /// Uploads a decoded RGBA image.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &image::RgbaImage,
        label: &str,
    ) -> anyhow::Result<Self> {
        Self::from_rgba8(
            device,
            queue,
            image.as_raw(),
            image.width(),
            image.height(),
            label,
        )
    }

    /// 1×1 opaque white texture; fills unused sampler slots so every slot in
    /// the bind group is backed by something valid.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        Self::from_rgba8(device, queue, &[255, 255, 255, 255], 1, 1, "glint white")
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
