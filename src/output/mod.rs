mod debug;
mod format;
mod mesh;

pub use debug::write_debug_masks;
pub use format::save_atlas_image;
pub use mesh::write_mesh;
