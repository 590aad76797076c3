//! Sobel 梯度幅值.

use super::Border;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2};

/// 水平方向 Sobel 核.
pub const SOBEL_X: [[f64; 3]; 3] = [[-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]];

/// 垂直方向 Sobel 核.
pub const SOBEL_Y: [[f64; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// 以 `pos` 为中心的 3x3 邻域梯度幅值 `sqrt(gx^2 + gy^2)`. 越界像素环形寻址.
fn magnitude(data: &ArrayView2<f64>, (h, w): Idx2d) -> f64 {
    let (len_h, len_w) = data.dim();
    let (mut gx, mut gy) = (0.0, 0.0);
    for (a, (kx, ky)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
        let r = Border::Wrap.index(h as isize + a as isize - 1, len_h);
        for b in 0..3 {
            let c = Border::Wrap.index(w as isize + b as isize - 1, len_w);
            let v = data[(r, c)];
            gx += kx[b] * v;
            gy += ky[b] * v;
        }
    }
    gx.hypot(gy)
}

/// 计算 Sobel 梯度幅值图像. 输出与输入形状相同, 数值为浮点数, 不做进一步缩放.
///
/// 边缘以环形方式寻址: 第 `-1` 行即最后一行, 第 `-1` 列即最后一列.
/// 常量图像的输出处处为零.
pub fn sobel(data: ArrayView2<f64>) -> Array2<f64> {
    Array2::from_shape_fn(data.dim(), |pos| magnitude(&data, pos))
}

/// 借助 `rayon`, 并行计算 Sobel 梯度幅值图像. 结果与 [`sobel`] 完全相同.
#[cfg(feature = "rayon")]
pub fn par_sobel(data: ArrayView2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(data.dim());
    ndarray::Zip::indexed(&mut out).par_for_each(|pos, o| *o = magnitude(&data, pos));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_uniform_is_zero() {
        for value in [0.0, 1.0, 255.0, 65535.0] {
            let data = Array2::from_elem((5, 7), value);
            assert!(sobel(data.view()).iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn test_two_column_step_wraps() {
        // 4x4, 左两列为 0, 右两列为 255. 由于环形寻址, 第 3 列与第 0 列相邻,
        // 因此每一列都位于一条边界上.
        let data = Array2::from_shape_fn((4, 4), |(_, w)| if w < 2 { 0.0 } else { 255.0 });
        let out = sobel(data.view());
        assert!(out.iter().all(|v| *v == 765.0));
    }

    #[test]
    fn test_wide_step_interior_zero() {
        // 4x8, 左四列为 0, 右四列为 255.
        let data = Array2::from_shape_fn((4, 8), |(_, w)| if w < 4 { 0.0 } else { 255.0 });
        let out = sobel(data.view());
        for h in 0..4 {
            for w in [1, 2, 5, 6] {
                assert_eq!(out[(h, w)], 0.0);
            }
            // 0/255 边界和环形边界.
            for w in [0, 3, 4, 7] {
                assert_eq!(out[(h, w)], 765.0);
            }
        }
    }

    #[test]
    fn test_horizontal_step_uses_y_kernel() {
        let data = Array2::from_shape_fn((6, 3), |(h, _)| if h < 3 { 0.0 } else { 10.0 });
        let out = sobel(data.view());
        // 行内各点的权重和为 1 + 2 + 1.
        assert_eq!(out[(2, 1)], 40.0);
        assert_eq!(out[(1, 1)], 0.0);
        assert_eq!(out[(0, 1)], 40.0);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_sobel_same() {
        let data = Array2::from_shape_fn((17, 23), |(h, w)| ((h * 31 + w * 7) % 13) as f64);
        assert_eq!(sobel(data.view()), par_sobel(data.view()));
    }
}
