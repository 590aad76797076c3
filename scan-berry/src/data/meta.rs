//! 加载器提供的扫描元信息.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 采样深度. 决定显示用灰度范围 `[0, max_representable]`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleDepth {
    /// 8-bit 无符号整数.
    U8,

    /// 16-bit 无符号整数.
    U16,
}

impl SampleDepth {
    /// 根据每采样位数构建. 仅支持 1 到 16 位, 其它情况返回 `None`.
    ///
    /// 不超过 8 位的采样按 8-bit 存储, 其余按 16-bit 存储.
    pub fn from_bits(bits: u16) -> Option<SampleDepth> {
        match bits {
            1..=8 => Some(Self::U8),
            9..=16 => Some(Self::U16),
            _ => None,
        }
    }

    /// 该深度能表示的最大值.
    #[inline]
    pub fn max_representable(&self) -> f64 {
        match self {
            Self::U8 => u8::MAX as f64,
            Self::U16 => u16::MAX as f64,
        }
    }
}

/// 渲染器上传纹理时使用的像素数据类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TextureFormat {
    /// 8-bit 无符号整数.
    UnsignedByte,

    /// 16-bit 无符号整数.
    UnsignedShort,

    /// 浮点数. 存在非平凡的斜率/截距标定时使用.
    Float,
}

/// 单个切片的元信息, 由外部加载器提供.
///
/// `slice_thickness` 和 `slice_spacing` 仅用于显示缩放, 与算法正确性无关.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanMeta {
    /// 每采样位数.
    pub bits_per_sample: u16,

    /// 图像宽 (列数).
    pub width: usize,

    /// 图像高 (行数).
    pub height: usize,

    /// 标定斜率.
    pub rescale_slope: f64,

    /// 标定截距.
    pub rescale_intercept: f64,

    /// 层厚 (毫米).
    pub slice_thickness: f64,

    /// 层间距 (毫米).
    pub slice_spacing: f64,
}

impl ScanMeta {
    /// 采样深度. 位数不受支持时返回 `None`.
    #[inline]
    pub fn depth(&self) -> Option<SampleDepth> {
        SampleDepth::from_bits(self.bits_per_sample)
    }

    /// 渲染器应使用的纹理像素类型.
    ///
    /// 只有截距非零 **且** 斜率不为 1 时才视为浮点数据.
    pub fn texture_format(&self) -> TextureFormat {
        if self.rescale_intercept != 0.0 && self.rescale_slope != 1.0 {
            TextureFormat::Float
        } else if self.bits_per_sample == 8 {
            TextureFormat::UnsignedByte
        } else {
            TextureFormat::UnsignedShort
        }
    }

    /// 将存储值换算为物理值 (如 CT HU).
    #[inline]
    pub fn to_physical(&self, stored: f64) -> f64 {
        stored * self.rescale_slope + self.rescale_intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(bits: u16, slope: f64, intercept: f64) -> ScanMeta {
        ScanMeta {
            bits_per_sample: bits,
            width: 4,
            height: 4,
            rescale_slope: slope,
            rescale_intercept: intercept,
            slice_thickness: 1.0,
            slice_spacing: 0.5,
        }
    }

    #[test]
    fn test_depth_from_bits() {
        assert_eq!(SampleDepth::from_bits(8), Some(SampleDepth::U8));
        assert_eq!(SampleDepth::from_bits(12), Some(SampleDepth::U16));
        assert_eq!(SampleDepth::from_bits(16), Some(SampleDepth::U16));
        assert_eq!(SampleDepth::from_bits(0), None);
        assert_eq!(SampleDepth::from_bits(32), None);
        assert_eq!(SampleDepth::U16.max_representable(), 65535.0);
    }

    #[test]
    fn test_texture_format() {
        assert_eq!(meta(8, 1.0, 0.0).texture_format(), TextureFormat::UnsignedByte);
        assert_eq!(meta(16, 1.0, 0.0).texture_format(), TextureFormat::UnsignedShort);
        // 需要两个条件同时满足.
        assert_eq!(meta(16, 1.0, -1024.0).texture_format(), TextureFormat::UnsignedShort);
        assert_eq!(meta(16, 2.0, -1024.0).texture_format(), TextureFormat::Float);
    }

    #[test]
    fn test_to_physical() {
        let m = meta(16, 1.0, -1024.0);
        assert_eq!(m.to_physical(1024.0), 0.0);
        assert_eq!(m.to_physical(0.0), -1024.0);
    }
}
