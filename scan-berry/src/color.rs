//! 伪彩色: 三角形灰度渐变查找表.
//!
//! 从图像最大灰度 (权重 0) 开始向下遍历, 灰度不低于中点时权重每步增加 `step`,
//! 低于中点后每步减少 `step`. 权重因此先升后降, 在中点附近达到峰值.

use crate::data::IntensityGrid;
use crate::error::{TransformError, TransformResult};
use ndarray::{Array2, Array3, ArrayView2, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 渐变参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GradientSpec {
    /// 相邻灰度之间的权重变化量.
    pub step: f64,
}

impl Default for GradientSpec {
    fn default() -> Self {
        Self { step: 2.0 }
    }
}

/// 以整数灰度为下标的渐变查找表, 定义域为 `[0, max]`.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientLut {
    table: Vec<f64>,
    mid: usize,
}

impl GradientLut {
    /// 为定义域 `[0, max]` 构建查找表. 中点为 `max * 127 / 255` (向下取整).
    pub fn build(max: usize, spec: GradientSpec) -> Self {
        let mid = max * 127 / 255;
        let mut table = vec![0.0; max + 1];
        let mut color = 0.0;
        for key in (0..=max).rev() {
            table[key] = color;
            if key >= mid {
                color += spec.step;
            } else {
                color -= spec.step;
            }
        }
        Self { table, mid }
    }

    /// 定义域上限.
    #[inline]
    pub fn max(&self) -> usize {
        self.table.len() - 1
    }

    /// 渐变的转折灰度.
    #[inline]
    pub fn mid(&self) -> usize {
        self.mid
    }

    /// 底层表.
    #[inline]
    pub fn table(&self) -> &[f64] {
        &self.table
    }

    /// 查找灰度 `v` 的权重. `v` 先四舍五入, 再钳制到定义域内.
    #[inline]
    pub fn get(&self, v: f64) -> f64 {
        let idx = v.round().clamp(0.0, self.max() as f64) as usize;
        self.table[idx]
    }

    /// 逐像素查表, 返回单通道权重网格.
    pub fn apply(&self, data: ArrayView2<f64>) -> Array2<f64> {
        data.mapv(|v| self.get(v))
    }
}

/// 带缓存的渐变映射器. 查找表只在灰度定义域变化时重建, 不会逐像素或逐帧重建.
#[derive(Clone, Debug, Default)]
pub struct GradientMapper {
    spec: GradientSpec,
    lut: Option<GradientLut>,
}

impl GradientMapper {
    /// 以 `spec` 创建映射器.
    #[inline]
    pub fn new(spec: GradientSpec) -> Self {
        Self { spec, lut: None }
    }

    /// 当前缓存的查找表.
    #[inline]
    pub fn lut(&self) -> Option<&GradientLut> {
        self.lut.as_ref()
    }

    /// 获取定义域 `[0, max]` 的查找表, 必要时重建.
    pub fn lut_for(&mut self, max: usize) -> &GradientLut {
        let spec = self.spec;
        if self.lut.as_ref().map_or(true, |lut| lut.max() != max) {
            log::debug!("重建渐变查找表, 定义域 [0, {max}]");
            self.lut = Some(GradientLut::build(max, spec));
        }
        self.lut.get_or_insert_with(|| GradientLut::build(max, spec))
    }

    /// 对网格做渐变映射. 定义域取网格实际最大值 (负数视为 0).
    ///
    /// 最大值非有限或超过采样深度可表示的最大值时返回 [`TransformError::InvalidParameter`].
    pub fn map(&mut self, grid: &IntensityGrid) -> TransformResult<Array2<f64>> {
        let hi = grid.min_max().map_or(0.0, |(_, hi)| hi.round());
        if !(hi <= grid.max_representable()) {
            return Err(TransformError::InvalidParameter("灰度超出采样深度的表示范围"));
        }
        Ok(self.lut_for(hi.max(0.0) as usize).apply(grid.data()))
    }
}

/// 颜色通道.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// 红.
    Red,

    /// 绿.
    Green,

    /// 蓝.
    Blue,
}

impl Channel {
    #[inline]
    const fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// 将单通道网格写入三通道图像 (高, 宽, 3) 的 `channel` 通道, 其余通道为零.
pub fn broadcast_channel(data: ArrayView2<f64>, channel: Channel) -> Array3<f64> {
    let (h, w) = data.dim();
    let mut rgb = Array3::<f64>::zeros((h, w, 3));
    rgb.index_axis_mut(Axis(2), channel.index()).assign(&data);
    rgb
}
