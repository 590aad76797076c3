//! 可分离高斯平滑.

use super::Border;
use crate::error::{TransformError, TransformResult};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// 标准差为 `sigma` 的归一化一维高斯核, 半径为 `floor(4 * sigma + 0.5)`.
///
/// `sigma` 必须为正的有限值.
pub fn gaussian_kernel(sigma: f64) -> TransformResult<Array1<f64>> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(TransformError::InvalidParameter("高斯核的 sigma 必须为正"));
    }
    let radius = (4.0 * sigma + 0.5) as isize;
    let mut k = Array1::from_iter((-radius..=radius).map(|x| {
        let x = x as f64;
        (-0.5 * x * x / (sigma * sigma)).exp()
    }));
    let sum = k.sum();
    k /= sum;
    Ok(k)
}

/// 沿 `axis` 做一维相关, 越界像素以半像素对称反射寻址.
fn correlate_axis(data: ArrayView2<f64>, kernel: &Array1<f64>, axis: Axis) -> Array2<f64> {
    let radius = (kernel.len() / 2) as isize;
    let len = data.len_of(axis);
    Array2::from_shape_fn(data.dim(), |(h, w)| {
        let center = if axis == Axis(0) { h } else { w };
        kernel
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let j = Border::Reflect.index(center as isize + i as isize - radius, len);
                let pos = if axis == Axis(0) { (j, w) } else { (h, j) };
                k * data[pos]
            })
            .sum()
    })
}

/// 高斯平滑. 输出与输入形状相同.
///
/// `sigma == 0` 时原样返回输入的副本; 负数或非有限的 `sigma` 返回
/// [`TransformError::InvalidParameter`].
pub fn gaussian(data: ArrayView2<f64>, sigma: f64) -> TransformResult<Array2<f64>> {
    if sigma == 0.0 {
        return Ok(data.to_owned());
    }
    let kernel = gaussian_kernel(sigma)?;
    if data.is_empty() {
        return Ok(data.to_owned());
    }
    let rows = correlate_axis(data, &kernel, Axis(0));
    Ok(correlate_axis(rows.view(), &kernel, Axis(1)))
}
