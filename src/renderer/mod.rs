pub mod depth;
pub mod gpu;
pub mod gpu_backend;
pub mod mesh;
pub mod pipeline_builder;
pub mod primitives;
pub mod software;
pub mod texture;
pub mod vertex;

pub use depth::Depth;
pub use gpu::GpuContext;
pub use gpu_backend::WgpuBackend;
pub use mesh::{Mesh, MeshId, MeshStore};
pub use pipeline_builder::PipelineBuilder;
pub use primitives::{cube_mesh, plane_mesh};
pub use software::{rgba_image, BackendEvent, SoftwareBackend};
pub use texture::{Blitter, GpuTarget};
pub use vertex::Vertex;
