//! 基于直方图最大垂距的阈值分割.
//!
//! 以出现次数最多的灰度 `p_max` 和出现次数最少 (非零) 的灰度 `p_min`
//! 为锚点连成直线, 在两锚点之间选取到该直线垂直距离最大的灰度作为阈值.

use crate::data::IntensityGrid;
use crate::error::{TransformError, TransformResult};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 整数灰度直方图, 定义域为左闭右开区间 `[lo, lo + counts.len())`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Histogram {
    lo: i64,
    counts: Vec<u64>,
}

impl Histogram {
    /// 直接初始化. `counts[i]` 为灰度 `lo + i` 的出现次数.
    #[inline]
    pub fn new(lo: i64, counts: Vec<u64>) -> Self {
        Self { lo, counts }
    }

    /// 统计网格在 `[min(grid), max(grid))` 上的直方图. 像素值先四舍五入到整数.
    ///
    /// 注意最大值本身不在定义域内. 常量网格返回 [`TransformError::DegenerateRange`];
    /// 存在非有限值, 或值域跨度超过采样深度可表示的最大值时返回
    /// [`TransformError::InvalidParameter`].
    pub fn from_grid(grid: &IntensityGrid) -> TransformResult<Self> {
        let (min, max) = grid.strict_min_max()?;
        if !(min.is_finite() && max.is_finite()) {
            return Err(TransformError::InvalidParameter("直方图不接受非有限值"));
        }
        if max - min > grid.max_representable() {
            return Err(TransformError::InvalidParameter("值域超出采样深度的表示范围"));
        }
        let (lo, hi) = (min.round() as i64, max.round() as i64);
        if hi <= lo {
            return Err(TransformError::DegenerateRange(min));
        }
        let mut counts = vec![0u64; (hi - lo) as usize];
        for bin in grid.iter().map(|v| v.round() as i64) {
            if bin < hi {
                counts[(bin - lo) as usize] += 1;
            }
        }
        Ok(Self { lo, counts })
    }

    /// 灰度 `bin` 的出现次数. 定义域外为 0.
    #[inline]
    pub fn count(&self, bin: i64) -> u64 {
        usize::try_from(bin - self.lo)
            .ok()
            .and_then(|i| self.counts.get(i).copied())
            .unwrap_or(0)
    }

    /// 按升序迭代 `(灰度, 次数)`.
    #[inline]
    pub fn bins(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| (self.lo + i as i64, *c))
    }

    /// 出现次数最多的灰度. 并列时取最小的灰度; 空直方图返回 `None`.
    pub fn peak(&self) -> Option<i64> {
        self.bins().min_by_key(|&(_, c)| Reverse(c)).map(|(b, _)| b)
    }

    /// 出现次数最少但非零的灰度. 并列时取最小的灰度; 全零时返回 `None`.
    pub fn rarest(&self) -> Option<i64> {
        self.bins()
            .filter(|&(_, c)| c > 0)
            .min_by_key(|&(_, c)| c)
            .map(|(b, _)| b)
    }
}

/// 从 `p_max` 出发向 `p_min` 逐个遍历 (含两端), 返回到锚点连线垂直距离最大的灰度.
/// 并列时取最先遍历到 (即最靠近 `p_max`) 的灰度.
///
/// 两锚点重合时返回 [`TransformError::DegenerateHistogram`].
pub fn select_threshold(hist: &Histogram) -> TransformResult<i64> {
    let (p_max, p_min) = match (hist.peak(), hist.rarest()) {
        (Some(p_max), Some(p_min)) => (p_max, p_min),
        _ => return Err(TransformError::DegenerateHistogram(hist.lo)),
    };
    if p_max == p_min {
        return Err(TransformError::DegenerateHistogram(p_max));
    }

    // 直线 A * x + B * y + C = 0 过 (p_min, y1) 与 (p_max, y2).
    let (x1, y1) = (p_min as f64, hist.count(p_min) as f64);
    let (x2, y2) = (p_max as f64, hist.count(p_max) as f64);
    let a = y2 - y1;
    let b = -(x2 - x1);
    let c = -(a * x1 + b * y1);
    let norm = a.hypot(b);

    let step = (p_min - p_max).signum();
    let walk = (0..=(p_min - p_max).abs()).map(|i| p_max + i * step);
    let (threshold, dist) = walk
        .map(|k| (k, (a * k as f64 + b * hist.count(k) as f64 + c).abs() / norm))
        .min_by_key(|&(_, d)| Reverse(OrderedFloat(d)))
        .ok_or(TransformError::DegenerateHistogram(p_max))?;

    log::debug!("锚点 p_max = {p_max}, p_min = {p_min}, 阈值 {threshold} (距离 {dist:.4})");
    Ok(threshold)
}

/// 二值化: 小于 `threshold` 的像素置 0, 其余置为 `max_representable`.
pub fn binarize(grid: &IntensityGrid, threshold: f64) -> IntensityGrid {
    let on = grid.max_representable();
    grid.map(|v| if v < threshold { 0.0 } else { on })
}

/// 单个像素的分析记录. `x` 为列, `y` 为行.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisRecord {
    /// 列坐标.
    pub x: usize,

    /// 行坐标.
    pub y: usize,

    /// 二值化结果.
    pub mask: f64,

    /// 原始像素值.
    pub value: f64,
}

/// 逐像素 (行优先) 的分析表. 是分割的可审计副产物, 由调用方决定是否持久化.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisTable {
    records: Vec<AnalysisRecord>,
}

impl AnalysisTable {
    /// 将掩码与原图逐像素配对.
    ///
    /// 如果两者形状不同, 返回 [`TransformError::ShapeMismatch`].
    pub fn pair(mask: &IntensityGrid, source: &IntensityGrid) -> TransformResult<Self> {
        if mask.shape() != source.shape() {
            let (mh, mw) = mask.shape();
            let (sh, sw) = source.shape();
            return Err(TransformError::ShapeMismatch {
                expected: vec![sh, sw],
                actual: vec![mh, mw],
            });
        }
        let records = mask
            .indexed_iter()
            .zip(source.iter())
            .map(|(((y, x), &m), &value)| AnalysisRecord {
                x,
                y,
                mask: m,
                value,
            })
            .collect();
        Ok(Self { records })
    }

    /// 记录个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 判断是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全部记录.
    #[inline]
    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    /// 获取能迭代全部记录的迭代器.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.records.iter()
    }
}

#[cfg(feature = "serde")]
impl AnalysisTable {
    /// 以 bincode 序列化, 供调用方持久化.
    pub fn to_bytes(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    /// 从 [`Self::to_bytes`] 的输出还原.
    pub fn from_bytes(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

/// 分割结果.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// 选出的阈值.
    pub threshold: f64,

    /// 二值掩码, 取值只有 0 和 `max_representable`.
    pub mask: IntensityGrid,

    /// 逐像素分析表.
    pub table: AnalysisTable,
}

/// 对网格做直方图阈值分割.
///
/// 常量网格返回 [`TransformError::DegenerateRange`];
/// 锚点重合返回 [`TransformError::DegenerateHistogram`].
pub fn segment(grid: &IntensityGrid) -> TransformResult<Segmentation> {
    let hist = Histogram::from_grid(grid)?;
    let threshold = select_threshold(&hist)? as f64;
    let mask = binarize(grid, threshold);
    let table = AnalysisTable::pair(&mask, grid)?;
    Ok(Segmentation {
        threshold,
        mask,
        table,
    })
}
