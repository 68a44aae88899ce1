use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

/// Camera collaborator: exposes the projection and view matrices the scene
/// bracket combines into the batch's shared `projection * view` uniform.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
}

impl Camera {
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view }
    }

    /// Pixel-space orthographic camera: X grows right, Y grows up, origin at
    /// the bottom-left of the viewport.
    pub fn orthographic(resolution: PhysicalSize<u32>) -> Self {
        let projection = Mat4::orthographic_lh(
            0.0,
            resolution.width as f32,
            0.0,
            resolution.height as f32,
            -1.0,
            1.0,
        );
        Self::new(projection, Mat4::IDENTITY)
    }

    pub fn perspective(
        fov_y_degrees: f32,
        resolution: PhysicalSize<u32>,
        eye: Vec3,
        target: Vec3,
        up: Vec3,
    ) -> Self {
        let aspect = resolution.width as f32 / resolution.height.max(1) as f32;
        let projection =
            Mat4::perspective_lh(fov_y_degrees.to_radians(), aspect, 0.1, 100.0);
        let view = Mat4::look_at_lh(eye, target, up);
        Self::new(projection, view)
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    pub fn proj_view(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// GPU-side camera state; must match the uniform struct in `batch.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    proj_view: Mat4,
}

impl CameraUniform {
    pub fn new(proj_view: Mat4) -> Self {
        Self { proj_view }
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glint camera uniform buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}
