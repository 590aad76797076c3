//! 灰度归一化, 显示窗口与灰度反转.

use super::grid::IntensityGrid;
use super::meta::SampleDepth;
use crate::error::TransformResult;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 常量图像 (`max == min`) 归一化时的处理策略.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlatPolicy {
    /// 输出全零图像.
    #[default]
    Zero,

    /// 输出所有像素都为 `max_representable / 2` (向下取整) 的图像.
    Midpoint,

    /// 返回 [`TransformError::DegenerateRange`](crate::TransformError::DegenerateRange).
    Reject,
}

/// 将 `v` 从 `[min, max]` 线性映射到 `[lo, hi]`, 并四舍五入到整数.
///
/// 调用方保证 `max > min`.
#[inline]
fn remap(v: f64, (min, max): (f64, f64), (lo, hi): (f64, f64)) -> f64 {
    (lo + (v - min) / (max - min) * (hi - lo)).round()
}

/// 将网格线性映射到目标采样深度的完整范围: `min -> 0`, `max -> max_representable`.
///
/// 映射单调不减; 对非常量输入, 输出恰好占满 `[0, max_representable]`.
/// 常量输入按 `policy` 处理.
pub fn normalize_to(
    grid: &IntensityGrid,
    depth: SampleDepth,
    policy: FlatPolicy,
) -> TransformResult<IntensityGrid> {
    let top = depth.max_representable();
    let range = match grid.strict_min_max() {
        Ok(range) => range,
        Err(e) => {
            let fill = match policy {
                FlatPolicy::Zero => 0.0,
                FlatPolicy::Midpoint => (top / 2.0).floor(),
                FlatPolicy::Reject => return Err(e),
            };
            log::warn!("归一化输入为常量图像, 以 {fill} 填充");
            return Ok(IntensityGrid::filled(grid.shape(), fill, depth));
        }
    };
    let data = grid.data().mapv(|v| remap(v, range, (0.0, top)));
    Ok(IntensityGrid::new(data, depth))
}

/// 以网格自身的采样深度和默认的 [`FlatPolicy::Zero`] 归一化.
#[inline]
pub fn normalize(grid: &IntensityGrid) -> IntensityGrid {
    match normalize_to(grid, grid.depth(), FlatPolicy::Zero) {
        Ok(g) => g,
        // `FlatPolicy::Zero` 不会产生错误.
        Err(_) => IntensityGrid::filled(grid.shape(), 0.0, grid.depth()),
    }
}

/// 显示窗口, 以网格最大值的比例 `p_min`, `p_max` 给出输出范围.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayWindow {
    p_min: f64,
    p_max: f64,
}

impl DisplayWindow {
    /// 构建显示窗口.
    ///
    /// 要求 `0 <= p_min < p_max <= 1`, 否则返回 `None`.
    pub fn new(p_min: f64, p_max: f64) -> Option<DisplayWindow> {
        if 0.0 <= p_min && p_min < p_max && p_max <= 1.0 {
            Some(Self { p_min, p_max })
        } else {
            None
        }
    }

    /// 构建一个压暗低灰度部分的窗口. 该窗口把图像映射到最大值的 70% 到 100%.
    #[inline]
    pub const fn upper_band() -> DisplayWindow {
        Self {
            p_min: 0.7,
            p_max: 1.0,
        }
    }

    /// 窗下限比例.
    #[inline]
    pub fn p_min(&self) -> f64 {
        self.p_min
    }

    /// 窗上限比例.
    #[inline]
    pub fn p_max(&self) -> f64 {
        self.p_max
    }

    /// 在观测范围 `(min, max)` 下, 求 `v` 经该窗口映射后的值.
    ///
    /// 如果 `v` 无意义 (如 inf, NaN) 或 `max <= min`, 则返回 `None`.
    pub fn eval(&self, v: f64, (min, max): (f64, f64)) -> Option<f64> {
        if !v.is_finite() || max <= min {
            return None;
        }
        Some(remap(v, (min, max), self.bounds(max)))
    }

    /// 输出范围 `[p_min * max, p_max * max]`.
    #[inline]
    fn bounds(&self, max: f64) -> (f64, f64) {
        (self.p_min * max, self.p_max * max)
    }

    /// 对整个网格实施窗口映射.
    ///
    /// 常量网格返回 [`TransformError::DegenerateRange`](crate::TransformError::DegenerateRange).
    pub fn apply(&self, grid: &IntensityGrid) -> TransformResult<IntensityGrid> {
        let range = grid.strict_min_max()?;
        let bounds = self.bounds(range.1);
        Ok(grid.map(|v| remap(v, range, bounds)))
    }
}

/// 灰度反转: `out = max + min - in`, 即关于网格自身观测范围中点的反射.
///
/// 空网格原样返回.
pub fn invert(grid: &IntensityGrid) -> IntensityGrid {
    match grid.min_max() {
        Some(range) => invert_with(grid, range),
        None => grid.clone(),
    }
}

/// 以事先捕获的 `(min, max)` 实施灰度反转.
#[inline]
pub fn invert_with(grid: &IntensityGrid, (min, max): (f64, f64)) -> IntensityGrid {
    grid.map(|v| max + min - v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use ndarray::array;

    fn grid(data: ndarray::Array2<f64>) -> IntensityGrid {
        IntensityGrid::new(data, SampleDepth::U8)
    }

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_display_window_invalid_input() {
        assert!(DisplayWindow::new(0.5, 0.5).is_none());
        assert!(DisplayWindow::new(-0.1, 0.5).is_none());
        assert!(DisplayWindow::new(0.2, 1.1).is_none());
        assert!(DisplayWindow::new(f64::NAN, 1.0).is_none());
        assert!(DisplayWindow::new(0.7, 1.0).is_some());
    }

    #[test]
    fn test_normalize_full_range_and_monotonic() {
        let g = IntensityGrid::new(array![[100.0, 300.0], [200.0, 1100.0]], SampleDepth::U16);
        let n = normalize(&g);
        assert_eq!(n.min_max(), Some((0.0, 65535.0)));

        let n8 = normalize_to(&g, SampleDepth::U8, FlatPolicy::Reject).unwrap();
        assert_eq!(n8.min_max(), Some((0.0, 255.0)));
        assert_eq!(n8.depth(), SampleDepth::U8);

        let src: Vec<f64> = g.iter().copied().collect();
        let out: Vec<f64> = n.iter().copied().collect();
        for i in 0..src.len() {
            for j in 0..src.len() {
                if src[i] <= src[j] {
                    assert!(out[i] <= out[j]);
                }
            }
        }
    }

    #[test]
    fn test_normalize_flat() {
        let g = IntensityGrid::filled((2, 2), 42.0, SampleDepth::U8);
        assert!(normalize(&g).iter().all(|v| *v == 0.0));
        let mid = normalize_to(&g, SampleDepth::U8, FlatPolicy::Midpoint).unwrap();
        assert!(mid.iter().all(|v| *v == 127.0));
        let err = normalize_to(&g, SampleDepth::U8, FlatPolicy::Reject).unwrap_err();
        assert!(matches!(err, TransformError::DegenerateRange(_)));
    }

    #[test]
    fn test_window_generic() {
        let w = DisplayWindow::new(0.5, 1.0).unwrap();
        let g = grid(array![[0.0, 50.0], [100.0, 200.0]]);
        let out = w.apply(&g).unwrap();
        assert_eq!(out.data(), array![[100.0, 125.0], [150.0, 200.0]].view());

        // 相同参数下重复应用不再变化.
        let again = w.apply(&out).unwrap();
        assert_eq!(again, out);

        assert_eq!(w.eval(f64::NAN, (0.0, 200.0)), None);
        assert_eq!(w.eval(1.0, (5.0, 5.0)), None);
        assert!(float_eq(w.eval(200.0, (0.0, 200.0)).unwrap(), 200.0));
    }

    #[test]
    fn test_window_flat_rejected() {
        let g = IntensityGrid::filled((2, 2), 9.0, SampleDepth::U8);
        assert_eq!(
            DisplayWindow::upper_band().apply(&g),
            Err(TransformError::DegenerateRange(9.0))
        );
    }

    #[test]
    fn test_invert_involution() {
        let g = grid(array![[3.0, 10.0, 250.0], [17.0, 99.0, 4.0]]);
        let range = g.min_max().unwrap();
        let once = invert_with(&g, range);
        assert_eq!(once[(0, 0)], 250.0);
        assert_eq!(once[(0, 2)], 3.0);
        assert_eq!(invert_with(&once, range), g);
        // 反转不改变观测范围, 因此重新捕获范围也能还原.
        assert_eq!(invert(&invert(&g)), g);
    }

    #[test]
    fn test_window_then_invert_composes() {
        let g = grid(array![[0.0, 50.0], [100.0, 200.0]]);
        let w = DisplayWindow::new(0.5, 1.0).unwrap();
        let a = invert(&w.apply(&g).unwrap());
        assert_eq!(a.data(), array![[200.0, 175.0], [150.0, 100.0]].view());
        assert_eq!(g[(1, 1)], 200.0);
    }
}
