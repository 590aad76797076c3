//! 转换为渲染器可直接上传的纹理缓冲. 该模块不做任何文件读写.

use super::grid::IntensityGrid;
use super::meta::SampleDepth;
use crate::consts::gray::{BLACK, WHITE};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use ndarray::{ArrayView2, ArrayView3};

/// 16-bit 单通道纹理.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// 按原样转换得到的纹理, 像素类型由采样深度决定.
#[derive(Clone, Debug)]
pub enum Texture {
    /// 8-bit 单通道.
    Luma8(GrayImage),

    /// 16-bit 单通道.
    Luma16(Gray16Image),
}

/// 表明一个可以 **按原样** 转换为纹理的对象.
///
/// 超出采样深度范围的值会被钳制, 小数部分四舍五入.
pub trait TextureRaw {
    /// 按原样转换为纹理.
    fn to_texture_raw(&self) -> Texture;
}

/// 表明一个可以以 **可视化友好** 模式转换为 8-bit 纹理的对象.
///
/// 对于 [`IntensityGrid`], 会把 `[0, max_representable]` 线性压缩到 `[0, 255]`;
/// 对于浮点梯度幅值等无声明范围的数据, 会按实际最大值压缩.
pub trait TextureVis {
    /// 转换为可视化用 8-bit 灰度纹理.
    fn to_texture_vis(&self) -> GrayImage;
}

#[inline]
fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(BLACK as f64, WHITE as f64) as u8
}

#[inline]
fn clamp_u16(v: f64) -> u16 {
    v.round().clamp(0.0, u16::MAX as f64) as u16
}

/// 以 `scale` 缩放后生成 8-bit 灰度纹理. 纹理第 `h` 行对应网格第 `h` 行.
fn gray8(data: ArrayView2<f64>, scale: f64) -> GrayImage {
    let (height, width) = data.dim();
    let mut buf = GrayImage::new(width as u32, height as u32);
    for ((h, w), &v) in data.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, Luma([clamp_u8(v * scale)]));
    }
    buf
}

impl TextureRaw for IntensityGrid {
    fn to_texture_raw(&self) -> Texture {
        match self.depth() {
            SampleDepth::U8 => Texture::Luma8(gray8(self.data(), 1.0)),
            SampleDepth::U16 => {
                let (height, width) = self.shape();
                let mut buf = Gray16Image::new(width as u32, height as u32);
                for ((h, w), &v) in self.indexed_iter() {
                    buf.put_pixel(w as u32, h as u32, Luma([clamp_u16(v)]));
                }
                Texture::Luma16(buf)
            }
        }
    }
}

impl TextureVis for IntensityGrid {
    fn to_texture_vis(&self) -> GrayImage {
        gray8(self.data(), WHITE as f64 / self.max_representable())
    }
}

impl TextureVis for ArrayView2<'_, f64> {
    fn to_texture_vis(&self) -> GrayImage {
        let max = self.iter().copied().fold(0.0_f64, f64::max);
        let scale = if max > 0.0 { WHITE as f64 / max } else { 0.0 };
        gray8(self.view(), scale)
    }
}

/// 将 (高, 宽, 3) 的颜色网格转换为 8-bit RGB 纹理. 超出 `[0, 255]` 的值被钳制.
///
/// 如果第三维长度不为 3, 则程序 panic.
pub fn rgb_texture(data: ArrayView3<f64>) -> RgbImage {
    let (height, width, channels) = data.dim();
    assert_eq!(channels, 3, "颜色网格必须是三通道");
    let mut buf = RgbImage::new(width as u32, height as u32);
    for h in 0..height {
        for w in 0..width {
            let px = [0, 1, 2].map(|c| clamp_u8(data[(h, w, c)]));
            buf.put_pixel(w as u32, h as u32, Rgb(px));
        }
    }
    buf
}
