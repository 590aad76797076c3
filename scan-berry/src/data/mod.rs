//! 灰度网格, 扫描元信息与切片栈.

mod grid;
mod meta;
mod texture;
pub mod volume;
pub mod window;

pub use grid::IntensityGrid;
pub use meta::{SampleDepth, ScanMeta, TextureFormat};
pub use texture::{rgb_texture, Gray16Image, Texture, TextureRaw, TextureVis};
pub use volume::{Plane, Reslice, SliceCursor, VolumeStack};
pub use window::{invert, invert_with, normalize, normalize_to, DisplayWindow, FlatPolicy};
