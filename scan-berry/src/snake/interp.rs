//! 双三次卷积插值 (Keys, `a = -0.5`), 同时给出解析的一阶偏导.

use super::Point;
use crate::filter::Border;
use ndarray::ArrayView2;

const A: f64 = -0.5;

/// 卷积核 `W(t)`.
#[inline]
fn weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// 卷积核导数 `W'(t)`.
#[inline]
fn weight_prime(t: f64) -> f64 {
    let s = t.signum();
    let t = t.abs();
    if t <= 1.0 {
        s * (3.0 * (A + 2.0) * t - 2.0 * (A + 3.0)) * t
    } else if t < 2.0 {
        s * ((3.0 * A * t - 10.0 * A) * t + 8.0 * A)
    } else {
        0.0
    }
}

/// 网格上的连续插值曲面. `x` 为列坐标, `y` 为行坐标, 越界的采样点钳制到边缘.
pub(crate) struct Bicubic<'a> {
    data: ArrayView2<'a, f64>,
}

impl<'a> Bicubic<'a> {
    /// 调用方保证 `data` 非空.
    pub(crate) fn new(data: ArrayView2<'a, f64>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    /// 以 `p` 为中心的 4x4 邻域加权和. `wx`, `wy` 分别作用于列和行方向.
    fn convolve(&self, p: Point, wx: fn(f64) -> f64, wy: fn(f64) -> f64) -> f64 {
        let (h, w) = self.data.dim();
        let (x0, y0) = (p.x.floor(), p.y.floor());
        let (dx, dy) = (p.x - x0, p.y - y0);
        let (x0, y0) = (x0 as isize, y0 as isize);

        let mut acc = 0.0;
        for m in -1..=2isize {
            let ky = wy(dy - m as f64);
            if ky == 0.0 {
                continue;
            }
            let row = Border::Clamp.index(y0 + m, h);
            for n in -1..=2isize {
                let col = Border::Clamp.index(x0 + n, w);
                acc += ky * wx(dx - n as f64) * self.data[(row, col)];
            }
        }
        acc
    }

    /// 插值.
    #[cfg(test)]
    fn value(&self, p: Point) -> f64 {
        self.convolve(p, weight, weight)
    }

    /// 一阶偏导 `(df/dx, df/dy)`.
    #[inline]
    pub(crate) fn gradient(&self, p: Point) -> (f64, f64) {
        (
            self.convolve(p, weight_prime, weight),
            self.convolve(p, weight, weight_prime),
        )
    }
}
