#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对医学扫描切片 (单张图像或切片栈) 实施一次性的数值变换,
//! 并把结果交给外部渲染器显示.
//!
//! 该 crate 不读写文件, 不管理窗口或图形上下文. 扫描文件由外部加载器解码为
//! [`IntensityGrid`] 和 [`ScanMeta`], 变换结果 (灰度网格, 颜色网格, 掩码或轮廓点序列)
//! 由调用方决定如何显示或保存.
//!
//! # 注意
//!
//! 1. 所有变换都读取输入并返回新的输出, 不会就地修改输入. 同一网格可以在多次渲染之间只读共享.
//! 2. 输入在入口处检测到的数值退化 (如常量图像) 会立即以 [`TransformError`] 上报,
//!   不会静默地产生 NaN/Inf.
//! 3. 在非期望情况下 (如在空维度上寻址), 程序会直接 panic, 而不会导致内存错误.
//!
//! # 开发计划
//!
//! ### 灰度归一化, 显示窗口与灰度反转 ✅
//!
//! 常量图像的归一化行为由 `FlatPolicy` 决定.
//!
//! 实现位于 `scan-berry/src/data/window.rs`.
//!
//! ### 三角形渐变伪彩色 ✅
//!
//! 查找表按灰度定义域缓存, 不逐帧重建.
//!
//! 实现位于 `scan-berry/src/color.rs`.
//!
//! ### Sobel 边缘与高斯平滑 ✅
//!
//! 边缘寻址函数由所有滤波器共享, 不复制填充后的图像.
//!
//! 实现位于 `scan-berry/src/filter`.
//!
//! ### 直方图最大垂距阈值分割 ✅
//!
//! 同时给出逐像素分析表, 可在 `serde` 特性下序列化.
//!
//! 实现位于 `scan-berry/src/segment.rs`.
//!
//! ### 主动轮廓 ✅
//!
//! 1. 双三次卷积插值及其解析偏导. ✅
//! 2. 系统矩阵一次分解, 每轮迭代只做回代 (而非显式求逆). ✅
//! 3. 收敛判断使用最近若干轮位置的环形缓冲, 每轮都检查. ✅
//!
//! 实现位于 `scan-berry/src/snake`.
//!
//! ### 多平面重建与三平面导航 ✅
//!
//! 实现位于 `scan-berry/src/data/volume.rs`.
//!
//! ### 交错融合 ✅
//!
//! 实现位于 `scan-berry/src/fusion.rs`.
//!
//! ### 渲染配置 ✅
//!
//! 用显式的每帧配置替代对象上的布尔开关.
//!
//! 实现位于 `scan-berry/src/render.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 像素悬停读数. ✅
//! 2. 背景三角遮罩. ✅
//! 3. 纹理导出 (`image` 缓冲). ✅
//! 4. 显示变换矩阵. ✅

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 灰度网格, 扫描元信息与切片栈.
mod data;

pub use data::{
    invert, invert_with, normalize, normalize_to, rgb_texture, DisplayWindow, FlatPolicy,
    Gray16Image, IntensityGrid, Plane, Reslice, SampleDepth, ScanMeta, SliceCursor, Texture,
    TextureFormat, TextureRaw, TextureVis, VolumeStack,
};

pub mod color;
pub mod consts;
pub mod filter;
pub mod fusion;
pub mod render;
pub mod segment;
pub mod snake;

mod error;
pub use error::{TransformError, TransformResult};

pub mod prelude;
