//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::{TransformError, TransformResult};

pub use crate::data::{
    invert, normalize, DisplayWindow, FlatPolicy, IntensityGrid, Plane, SampleDepth, ScanMeta,
    SliceCursor, TextureRaw, TextureVis, VolumeStack,
};

pub use crate::color::{Channel, GradientMapper, GradientSpec};
pub use crate::filter::{gaussian, sobel};
pub use crate::fusion::{fuse, FusionPattern};
pub use crate::render::{Frame, Overlay, RenderConfig, ViewMatrix};
pub use crate::segment::{segment, Segmentation};
pub use crate::snake::{Contour, Point, SnakeParams, SnakeReport};

pub use crate::consts::{FIELD_SIGMA, FUSION_CANVAS};
