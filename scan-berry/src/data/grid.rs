use super::meta::{SampleDepth, ScanMeta};
use crate::error::{TransformError, TransformResult};
use crate::Idx2d;
use itertools::{Itertools, MinMaxResult};
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, Ix2};
use num::ToPrimitive;
use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拥有所有权的二维灰度网格, 按 (高, 宽) 即 (行, 列) 组织.
///
/// 网格声明的采样范围为 `[0, max_representable]`, 由采样深度决定.
/// 网格一旦创建, 形状不可变; 所有变换都读取输入并返回新网格, 不会就地修改,
/// 因此同一网格可以在多次渲染之间只读共享.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityGrid {
    data: Array2<f64>,
    depth: SampleDepth,
}

impl Index<Idx2d> for IntensityGrid {
    type Output = f64;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IntensityGrid {
    /// 直接初始化.
    #[inline]
    pub fn new(data: Array2<f64>, depth: SampleDepth) -> Self {
        Self { data, depth }
    }

    /// 用行优先排列的采样值构建网格.
    ///
    /// 如果 `samples` 的长度与 `shape` 不符, 返回 [`TransformError::ShapeMismatch`];
    /// 如果存在无法表示为 `f64` 的采样, 返回 [`TransformError::InvalidParameter`].
    pub fn from_samples<T: ToPrimitive>(
        (h, w): Idx2d,
        samples: &[T],
        depth: SampleDepth,
    ) -> TransformResult<Self> {
        if samples.len() != h * w {
            return Err(TransformError::ShapeMismatch {
                expected: vec![h * w],
                actual: vec![samples.len()],
            });
        }
        let buf = samples
            .iter()
            .map(|s| s.to_f64())
            .collect::<Option<Vec<f64>>>()
            .ok_or(TransformError::InvalidParameter("采样值无法转换为 f64"))?;
        // 长度已检查, 不会失败.
        let data = Array2::from_shape_vec((h, w), buf).map_err(|_| {
            TransformError::ShapeMismatch {
                expected: vec![h, w],
                actual: vec![samples.len()],
            }
        })?;
        Ok(Self { data, depth })
    }

    /// 按加载器元信息构建网格.
    pub fn from_meta<T: ToPrimitive>(meta: &ScanMeta, samples: &[T]) -> TransformResult<Self> {
        let depth = meta
            .depth()
            .ok_or(TransformError::InvalidParameter("不支持的采样位数"))?;
        Self::from_samples((meta.height, meta.width), samples, depth)
    }

    /// 构建所有像素都为 `value` 的网格.
    #[inline]
    pub fn filled(shape: Idx2d, value: f64, depth: SampleDepth) -> Self {
        Self {
            data: Array2::from_elem(shape, value),
            depth,
        }
    }

    /// 以相同采样深度包装新数据. 仅供形状不变的变换使用.
    #[inline]
    pub(crate) fn with_data(&self, data: Array2<f64>) -> Self {
        debug_assert_eq!(data.dim(), self.data.dim());
        Self {
            data,
            depth: self.depth,
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<f64> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f64> {
        self.data
    }

    /// 采样深度.
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// 采样深度能表示的最大值, 如 255 或 65535.
    #[inline]
    pub fn max_representable(&self) -> f64 {
        self.depth.max_representable()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 获得图像的高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().0
    }

    /// 获得图像的宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&f64> {
        self.data.get(pos)
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f64, Ix2> {
        self.data.iter()
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f64)> {
        self.data.indexed_iter()
    }

    /// 图像实际出现的 (最小值, 最大值). 空图像返回 `None`.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        match self.data.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// 同 [`Self::min_max`], 但在值域退化 (空图像或常量图像) 时返回错误.
    pub(crate) fn strict_min_max(&self) -> TransformResult<(f64, f64)> {
        match self.min_max() {
            None => Err(TransformError::DegenerateRange(f64::NAN)),
            Some((lo, hi)) if lo == hi => Err(TransformError::DegenerateRange(lo)),
            Some(pair) => Ok(pair),
        }
    }

    /// 对每个像素实施 `f`, 返回同形状的新网格.
    #[inline]
    pub fn map<F: FnMut(f64) -> f64>(&self, f: F) -> Self {
        self.with_data(self.data.mapv(f))
    }

    /// 将存储值按元信息换算为物理值 (如 CT HU).
    pub fn to_physical(&self, meta: &ScanMeta) -> Array2<f64> {
        self.data.mapv(|v| meta.to_physical(v))
    }

    /// 读取窗口坐标处的像素值.
    ///
    /// `x` 为从左向右的列坐标, `y_from_top` 为窗口中自上而下的坐标.
    /// 纹理第 0 行显示在窗口底部, 因此实际读取的行为 `height - y_from_top`.
    /// 只有行列都严格落在 `(0, height)`, `(0, width)` 内时才返回值.
    pub fn probe(&self, x: usize, y_from_top: usize) -> Option<f64> {
        let row = self.height().checked_sub(y_from_top)?;
        let inside = 0 < row && row < self.height() && 0 < x && x < self.width();
        inside.then(|| self.data[(row, x)])
    }

    /// 背景遮罩: 将下三角 (含对角线, 即 `col <= row` 的像素) 置零,
    /// 其余像素保持不变.
    pub fn mask_lower_triangle(&self) -> Self {
        let mut data = self.data.clone();
        data.indexed_iter_mut()
            .filter(|((row, col), _)| col <= row)
            .for_each(|(_, v)| *v = 0.0);
        self.with_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_samples() {
        let g = IntensityGrid::from_samples((2, 3), &[1u16, 2, 3, 4, 5, 6], SampleDepth::U16).unwrap();
        assert_eq!(g.shape(), (2, 3));
        assert_eq!(g[(1, 0)], 4.0);
        assert_eq!(g.min_max(), Some((1.0, 6.0)));

        let err = IntensityGrid::from_samples((2, 2), &[1u8, 2, 3], SampleDepth::U8);
        assert!(matches!(err, Err(TransformError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_from_meta_rejects_depth() {
        let meta = ScanMeta {
            bits_per_sample: 32,
            width: 1,
            height: 1,
            rescale_slope: 1.0,
            rescale_intercept: 0.0,
            slice_thickness: 1.0,
            slice_spacing: 0.0,
        };
        assert!(matches!(
            IntensityGrid::from_meta(&meta, &[0u32]),
            Err(TransformError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_strict_min_max() {
        let g = IntensityGrid::filled((3, 3), 7.0, SampleDepth::U8);
        assert_eq!(g.strict_min_max(), Err(TransformError::DegenerateRange(7.0)));
    }

    #[test]
    fn test_probe() {
        let g = IntensityGrid::new(
            array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0], [6.0, 7.0, 8.0]],
            SampleDepth::U8,
        );
        // y_from_top = 2 -> row 1.
        assert_eq!(g.probe(1, 2), Some(4.0));
        assert_eq!(g.probe(2, 1), Some(8.0));
        assert_eq!(g.probe(0, 2), None);
        assert_eq!(g.probe(1, 3), None);
        assert_eq!(g.probe(1, 9), None);
    }

    #[test]
    fn test_mask_lower_triangle() {
        let g = IntensityGrid::filled((3, 4), 200.0, SampleDepth::U8);
        let m = g.mask_lower_triangle();
        let expected = array![
            [0.0, 200.0, 200.0, 200.0],
            [0.0, 0.0, 200.0, 200.0],
            [0.0, 0.0, 0.0, 200.0],
        ];
        assert_eq!(m.data(), expected.view());
        // 输入不变.
        assert!(g.iter().all(|v| *v == 200.0));
    }
}
