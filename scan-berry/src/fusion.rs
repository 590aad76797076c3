//! 两幅配准图像的交错融合.
//!
//! 融合结果的上半部分完全来自第一幅图像; 下半部分按 [`FusionPattern`] 在两幅图像间交替取值.

use crate::data::IntensityGrid;
use crate::error::{TransformError, TransformResult};
use crate::Idx2d;
use ndarray::{s, Array2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 下半部分的交替方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FusionPattern {
    /// 逐行交替: 第 `i` 行 (`i >= h / 2`) 在 `i - h / 2` 为奇数时取第二幅图像.
    #[default]
    Rows,

    /// 逐像素交替: 下半部分按行优先顺序编号, 奇数号像素取第二幅图像.
    Pixels,
}

impl FusionPattern {
    /// `(i, j)` 处是否取第二幅图像.
    #[inline]
    fn takes_second(self, (i, j): Idx2d, (h, w): Idx2d) -> bool {
        let half = h / 2;
        if i < half {
            return false;
        }
        match self {
            FusionPattern::Rows => (i - half) % 2 == 1,
            FusionPattern::Pixels => ((i - half) * w + j) % 2 == 1,
        }
    }
}

fn check_shape(a: &IntensityGrid, b: &IntensityGrid) -> TransformResult<()> {
    if a.shape() == b.shape() {
        return Ok(());
    }
    let ((ah, aw), (bh, bw)) = (a.shape(), b.shape());
    Err(TransformError::ShapeMismatch {
        expected: vec![ah, aw],
        actual: vec![bh, bw],
    })
}

/// 以默认的 [`FusionPattern::Rows`] 融合.
#[inline]
pub fn fuse(a: &IntensityGrid, b: &IntensityGrid) -> TransformResult<IntensityGrid> {
    fuse_with(a, b, FusionPattern::default())
}

/// 按 `pattern` 融合两幅同形状图像. 结果沿用 `a` 的采样深度.
///
/// 形状不同时返回 [`TransformError::ShapeMismatch`].
pub fn fuse_with(
    a: &IntensityGrid,
    b: &IntensityGrid,
    pattern: FusionPattern,
) -> TransformResult<IntensityGrid> {
    check_shape(a, b)?;
    let shape = a.shape();
    let data = Array2::from_shape_fn(shape, |pos| {
        if pattern.takes_second(pos, shape) {
            b[pos]
        } else {
            a[pos]
        }
    });
    Ok(IntensityGrid::new(data, a.depth()))
}

/// 将网格放入 `canvas` 大小的全零画布左上角, 如 [`crate::consts::FUSION_CANVAS`].
///
/// 画布在任一维度上小于网格时返回 [`TransformError::ShapeMismatch`].
pub fn embed(grid: &IntensityGrid, canvas: Idx2d) -> TransformResult<IntensityGrid> {
    let (h, w) = grid.shape();
    if canvas.0 < h || canvas.1 < w {
        return Err(TransformError::ShapeMismatch {
            expected: vec![h, w],
            actual: vec![canvas.0, canvas.1],
        });
    }
    let mut data = Array2::<f64>::zeros(canvas);
    data.slice_mut(s![..h, ..w]).assign(&grid.data());
    Ok(IntensityGrid::new(data, grid.depth()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FUSION_CANVAS;
    use crate::data::SampleDepth;

    fn constant(shape: Idx2d, v: f64) -> IntensityGrid {
        IntensityGrid::filled(shape, v, SampleDepth::U8)
    }

    #[test]
    fn test_rows() {
        let out = fuse(&constant((6, 3), 1.0), &constant((6, 3), 2.0)).unwrap();
        let col: Vec<f64> = (0..6).map(|i| out[(i, 0)]).collect();
        assert_eq!(col, vec![1.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        for i in 0..6 {
            assert!((0..3).all(|j| out[(i, j)] == out[(i, 0)]));
        }
    }

    #[test]
    fn test_odd_height() {
        // h = 5, half = 2: 第 3 行取第二幅图像.
        let out = fuse(&constant((5, 1), 1.0), &constant((5, 1), 2.0)).unwrap();
        let col: Vec<f64> = (0..5).map(|i| out[(i, 0)]).collect();
        assert_eq!(col, vec![1.0, 1.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_pixels() {
        let out = fuse_with(
            &constant((4, 3), 1.0),
            &constant((4, 3), 2.0),
            FusionPattern::Pixels,
        )
        .unwrap();
        assert!((0..3).all(|j| out[(0, j)] == 1.0 && out[(1, j)] == 1.0));
        assert_eq!(out[(2, 0)], 1.0);
        assert_eq!(out[(2, 1)], 2.0);
        assert_eq!(out[(2, 2)], 1.0);
        // 宽度为奇数, 编号跨行连续.
        assert_eq!(out[(3, 0)], 2.0);
        assert_eq!(out[(3, 1)], 1.0);
    }

    #[test]
    fn test_self_fusion_identity() {
        let g = IntensityGrid::new(
            Array2::from_shape_fn((7, 5), |(h, w)| (h * 5 + w) as f64),
            SampleDepth::U8,
        );
        for pattern in [FusionPattern::Rows, FusionPattern::Pixels] {
            assert_eq!(fuse_with(&g, &g, pattern).unwrap(), g);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let err = fuse(&constant((4, 4), 0.0), &constant((4, 5), 0.0)).unwrap_err();
        assert_eq!(
            err,
            TransformError::ShapeMismatch {
                expected: vec![4, 4],
                actual: vec![4, 5],
            }
        );
    }

    #[test]
    fn test_embed() {
        let g = constant((2, 3), 9.0);
        let out = embed(&g, FUSION_CANVAS).unwrap();
        assert_eq!(out.shape(), FUSION_CANVAS);
        assert_eq!(out[(1, 2)], 9.0);
        assert_eq!(out[(2, 2)], 0.0);
        assert_eq!(out[(1, 3)], 0.0);
        assert!(embed(&g, (1, 10)).is_err());
    }
}
