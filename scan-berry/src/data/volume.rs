//! 切片栈与多平面重建.

use super::grid::IntensityGrid;
use super::meta::SampleDepth;
use crate::error::{TransformError, TransformResult};
use crate::{Idx2d, Idx3d};
use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

/// 有序的等形状切片栈, 按 (切片, 高, 宽) 组织.
///
/// `slice_thickness` 和 `slice_spacing` 仅用于显示缩放.
#[derive(Clone, Debug)]
pub struct VolumeStack {
    data: Array3<f64>,
    depth: SampleDepth,
    slice_thickness: f64,
    slice_spacing: f64,
}

impl VolumeStack {
    /// 将有序切片堆叠为体数据.
    ///
    /// 切片序列为空或切片的高, 宽为零时返回 [`TransformError::InvalidParameter`];
    /// 任一切片形状与第一张不同时返回 [`TransformError::ShapeMismatch`].
    /// 采样深度取第一张切片的深度.
    pub fn new(
        slices: &[IntensityGrid],
        slice_thickness: f64,
        slice_spacing: f64,
    ) -> TransformResult<Self> {
        let first = slices
            .first()
            .ok_or(TransformError::InvalidParameter("切片栈不能为空"))?;
        let (h, w) = first.shape();
        if h == 0 || w == 0 {
            return Err(TransformError::InvalidParameter("切片的高和宽必须为正"));
        }
        if let Some(bad) = slices.iter().find(|s| s.shape() != (h, w)) {
            let (bh, bw) = bad.shape();
            return Err(TransformError::ShapeMismatch {
                expected: vec![h, w],
                actual: vec![bh, bw],
            });
        }

        let mut data = Array3::<f64>::zeros((slices.len(), h, w));
        for (mut dst, src) in data.axis_iter_mut(Axis(0)).zip(slices) {
            dst.assign(&src.data());
        }
        Ok(Self {
            data,
            depth: first.depth(),
            slice_thickness,
            slice_spacing,
        })
    }

    /// 将 `(文件名, 切片)` 按文件名升序排序后堆叠.
    pub fn from_named_slices<S: AsRef<str>>(
        mut named: Vec<(S, IntensityGrid)>,
        slice_thickness: f64,
        slice_spacing: f64,
    ) -> TransformResult<Self> {
        named.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));
        let slices: Vec<IntensityGrid> = named.into_iter().map(|(_, g)| g).collect();
        Self::new(&slices, slice_thickness, slice_spacing)
    }

    /// 体数据形状 (切片数, 高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 单张切片形状 (高, 宽).
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 层厚 (毫米).
    #[inline]
    pub fn slice_thickness(&self) -> f64 {
        self.slice_thickness
    }

    /// 层间距 (毫米).
    #[inline]
    pub fn slice_spacing(&self) -> f64 {
        self.slice_spacing
    }

    /// 相邻切片在显示坐标中的间隔, 以切片高度为单位长度:
    /// `(slice_thickness + slice_spacing) / height`.
    #[inline]
    pub fn depth_scale(&self) -> f64 {
        (self.slice_thickness + self.slice_spacing) / self.slice_shape().0 as f64
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// 获取第 `z_index` 张原始切片. 越界时返回 [`TransformError::IndexOutOfRange`].
    pub fn slice_at(&self, z_index: usize) -> TransformResult<ArrayView2<'_, f64>> {
        checked_axis(self.data.view(), z_index)
    }

    /// 以原始切片的采样深度复制出第 `z_index` 张切片.
    pub fn grid_at(&self, z_index: usize) -> TransformResult<IntensityGrid> {
        Ok(IntensityGrid::new(self.slice_at(z_index)?.to_owned(), self.depth))
    }

    /// 对每张切片实施 `f` (例如逐张归一化), 得到新的切片栈.
    ///
    /// `f` 不得改变切片形状, 否则返回 [`TransformError::ShapeMismatch`].
    pub fn map_slices<F>(&self, f: F) -> TransformResult<Self>
    where
        F: Fn(&IntensityGrid) -> TransformResult<IntensityGrid>,
    {
        let slices = (0..self.len_z())
            .map(|z| self.grid_at(z).and_then(|g| f(&g)))
            .collect::<TransformResult<Vec<_>>>()?;
        self.restack(slices)
    }

    /// 借助 `rayon`, 并行地对每张切片实施 `f`. 结果与 [`Self::map_slices`] 相同.
    #[cfg(feature = "rayon")]
    pub fn par_map_slices<F>(&self, f: F) -> TransformResult<Self>
    where
        F: Fn(&IntensityGrid) -> TransformResult<IntensityGrid> + Sync + Send,
    {
        use rayon::prelude::*;

        let slices = (0..self.len_z())
            .into_par_iter()
            .map(|z| self.grid_at(z).and_then(|g| f(&g)))
            .collect::<TransformResult<Vec<_>>>()?;
        self.restack(slices)
    }

    fn restack(&self, slices: Vec<IntensityGrid>) -> TransformResult<Self> {
        let (h, w) = self.slice_shape();
        if let Some(bad) = slices.iter().find(|s| s.shape() != (h, w)) {
            let (bh, bw) = bad.shape();
            return Err(TransformError::ShapeMismatch {
                expected: vec![h, w],
                actual: vec![bh, bw],
            });
        }
        Self::new(&slices, self.slice_thickness, self.slice_spacing)
    }

    /// 多平面重建. 结果中的每个体素都与原体数据中的对应体素严格相等.
    pub fn reslice(&self) -> Reslice {
        // 轴置换: (z, h, w) -> (h, z, w) 和 (w, z, h).
        let frontal = self
            .data
            .view()
            .permuted_axes([1, 0, 2])
            .as_standard_layout()
            .into_owned();
        let sagittal = self
            .data
            .view()
            .permuted_axes([2, 0, 1])
            .as_standard_layout()
            .into_owned();
        log::debug!(
            "重建完成: coronal {:?}, frontal {:?}, sagittal {:?}",
            self.data.dim(),
            frontal.dim(),
            sagittal.dim()
        );
        Reslice {
            coronal: self.data.clone(),
            frontal,
            sagittal,
        }
    }
}

/// 取 `arr` 第 0 轴上的第 `index` 张切片, 越界时返回错误.
fn checked_axis(arr: ArrayView3<'_, f64>, index: usize) -> TransformResult<ArrayView2<'_, f64>> {
    let len = arr.len_of(Axis(0));
    if index < len {
        Ok(arr.index_axis_move(Axis(0), index))
    } else {
        Err(TransformError::IndexOutOfRange { index, len })
    }
}

/// 多平面重建结果. 三个体数据分别以各自平面的索引为第 0 轴.
#[derive(Clone, Debug)]
pub struct Reslice {
    /// 原始切片, `coronal[z][y][x]`, 形状 (n, 高, 宽).
    coronal: Array3<f64>,

    /// `frontal[y][z][x] == stack[z][y][x]`, 形状 (高, n, 宽).
    frontal: Array3<f64>,

    /// `sagittal[x][z][y] == stack[z][y][x]`, 形状 (宽, n, 高).
    sagittal: Array3<f64>,
}

/// 重建体数据所在的平面.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Plane {
    /// 原始切片方向.
    Coronal,

    /// 沿宽度方向重建.
    Sagittal,

    /// 沿高度方向重建.
    Frontal,
}

impl Reslice {
    /// 获得平面 `plane` 对应的体数据.
    #[inline]
    pub fn volume(&self, plane: Plane) -> ArrayView3<'_, f64> {
        match plane {
            Plane::Coronal => self.coronal.view(),
            Plane::Sagittal => self.sagittal.view(),
            Plane::Frontal => self.frontal.view(),
        }
    }

    /// 平面 `plane` 上可导航的层数.
    #[inline]
    pub fn len_of(&self, plane: Plane) -> usize {
        self.volume(plane).len_of(Axis(0))
    }

    /// 直接访问平面 `plane` 的第 `index` 层. 越界时返回 [`TransformError::IndexOutOfRange`].
    #[inline]
    pub fn layer(&self, plane: Plane, index: usize) -> TransformResult<ArrayView2<'_, f64>> {
        checked_axis(self.volume(plane), index)
    }

    /// 按光标位置取出三个平面当前层 (coronal, sagittal, frontal).
    ///
    /// 光标由 [`SliceCursor`] 钳制, 因此永不越界.
    pub fn layers_at(&self, cursor: &SliceCursor) -> [ArrayView2<'_, f64>; 3] {
        [Plane::Coronal, Plane::Sagittal, Plane::Frontal].map(|p| {
            self.volume(p)
                .index_axis_move(Axis(0), cursor.get(p).min(self.len_of(p) - 1))
        })
    }

    /// 创建对应的三平面导航光标, 初始位置均为 0.
    #[inline]
    pub fn cursor(&self) -> SliceCursor {
        SliceCursor {
            pos: [0; 3],
            len: [
                self.len_of(Plane::Coronal),
                self.len_of(Plane::Sagittal),
                self.len_of(Plane::Frontal),
            ],
        }
    }
}

/// 三平面导航光标. 每个索引都被钳制在 `[0, len - 1]` 内,
/// 越界的移动请求会被静默忽略.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SliceCursor {
    pos: [usize; 3],
    len: [usize; 3],
}

impl SliceCursor {
    #[inline]
    const fn slot(plane: Plane) -> usize {
        match plane {
            Plane::Coronal => 0,
            Plane::Sagittal => 1,
            Plane::Frontal => 2,
        }
    }

    /// 平面 `plane` 的当前层索引.
    #[inline]
    pub fn get(&self, plane: Plane) -> usize {
        self.pos[Self::slot(plane)]
    }

    /// 将平面 `plane` 的层索引前进一层. 已在最后一层时保持不动.
    pub fn step_forward(&mut self, plane: Plane) -> usize {
        let i = Self::slot(plane);
        if self.pos[i] + 1 < self.len[i] {
            self.pos[i] += 1;
        }
        self.pos[i]
    }

    /// 将平面 `plane` 的层索引后退一层. 已在第 0 层时保持不动.
    pub fn step_back(&mut self, plane: Plane) -> usize {
        let i = Self::slot(plane);
        self.pos[i] = self.pos[i].saturating_sub(1);
        self.pos[i]
    }

    /// 直接跳转, 超出范围的 `index` 被钳制到最后一层.
    pub fn jump(&mut self, plane: Plane, index: usize) -> usize {
        let i = Self::slot(plane);
        self.pos[i] = index.min(self.len[i].saturating_sub(1));
        self.pos[i]
    }
}
