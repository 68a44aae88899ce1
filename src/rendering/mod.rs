pub mod batch;
pub mod gpu;
pub mod primitives;
pub mod renderer;
pub mod vertex;
