mod fragment;
mod packer;

pub use fragment::AtlasFragment;
pub use packer::{AtlasPacker, BuildReport, PackerConfig};
