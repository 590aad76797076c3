//! 每帧的渲染配置, 以及交给外部渲染器的显示变换矩阵.
//!
//! 显示哪种变换由调用方每帧通过 [`RenderConfig`] 显式给出, 库内不保存任何开关状态.

use crate::color::{broadcast_channel, Channel, GradientMapper};
use crate::consts::FIELD_SIGMA;
use crate::data::{invert, DisplayWindow, IntensityGrid};
use crate::error::TransformResult;
use crate::segment::{segment, Segmentation};
use crate::snake::{solve_grid, Contour, SnakeParams, SnakeReport};
use ndarray::{Array2, Array3};
use std::ops::Mul;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 在基础图像之上叠加的变换. 每帧只选一种.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Overlay {
    /// 不做额外变换.
    #[default]
    Plain,

    /// 渐变伪彩色, 写入指定通道.
    Gradient(Channel),

    /// 背景三角遮罩.
    BackgroundMask,

    /// Sobel 边缘.
    Edges,

    /// 直方图阈值分割.
    Threshold,

    /// 主动轮廓.
    Contour {
        /// 初始轮廓.
        init: Contour,

        /// 求解参数.
        params: SnakeParams,

        /// 准备外部场时的高斯平滑标准差.
        sigma: f64,
    },
}

impl Overlay {
    /// 以默认参数和 [`FIELD_SIGMA`] 从 `init` 出发的主动轮廓.
    pub fn contour(init: Contour) -> Self {
        Overlay::Contour {
            init,
            params: SnakeParams::default(),
            sigma: FIELD_SIGMA,
        }
    }
}

/// 一帧的渲染配置.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    /// 显示窗口. `None` 表示不做窗口映射.
    pub window: Option<DisplayWindow>,

    /// 是否反转灰度. 在窗口映射之后进行.
    pub invert: bool,

    /// 叠加变换.
    pub overlay: Overlay,
}

/// 交给外部渲染器的一帧.
#[derive(Clone, Debug)]
pub enum Frame {
    /// 灰度图像.
    Gray(IntensityGrid),

    /// (高, 宽, 3) 的颜色网格.
    Color(Array3<f64>),

    /// 浮点梯度幅值.
    Edges(Array2<f64>),

    /// 分割结果.
    Segmented(Segmentation),

    /// 基础图像与其上的轮廓.
    Contour {
        /// 基础图像.
        base: IntensityGrid,

        /// 求解结果.
        report: SnakeReport,
    },
}

impl RenderConfig {
    /// 对 `grid` 依次实施窗口, 反转和叠加变换. `grid` 本身不会被修改.
    pub fn render(
        &self,
        grid: &IntensityGrid,
        mapper: &mut GradientMapper,
    ) -> TransformResult<Frame> {
        let mut base = match &self.window {
            Some(window) => window.apply(grid)?,
            None => grid.clone(),
        };
        if self.invert {
            base = invert(&base);
        }

        let frame = match &self.overlay {
            Overlay::Plain => Frame::Gray(base),
            Overlay::Gradient(channel) => {
                let weights = mapper.map(&base)?;
                Frame::Color(broadcast_channel(weights.view(), *channel))
            }
            Overlay::BackgroundMask => Frame::Gray(base.mask_lower_triangle()),
            Overlay::Edges => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "rayon")] {
                        Frame::Edges(crate::filter::par_sobel(base.data()))
                    } else {
                        Frame::Edges(crate::filter::sobel(base.data()))
                    }
                }
            }
            Overlay::Threshold => Frame::Segmented(segment(&base)?),
            Overlay::Contour {
                init,
                params,
                sigma,
            } => {
                let report = solve_grid(&base, *sigma, init, params)?;
                Frame::Contour { base, report }
            }
        };
        Ok(frame)
    }
}

/// 列主序 4x4 显示变换矩阵, 可直接作为 uniform 上传.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewMatrix([f32; 16]);

impl Default for ViewMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewMatrix {
    /// 单位矩阵.
    pub const fn identity() -> Self {
        let mut m = [0.0_f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Self(m)
    }

    /// 关于直线 `x = xp` 的镜像.
    pub fn mirror_x(xp: f32) -> Self {
        let mut m = Self::identity().0;
        m[0] = -1.0;
        m[12] = 2.0 * xp;
        Self(m)
    }

    /// 按 `(sx, sy)` 缩放.
    pub const fn scale(sx: f32, sy: f32) -> Self {
        let mut m = Self::identity().0;
        m[0] = sx;
        m[5] = sy;
        Self(m)
    }

    /// 上下翻转.
    pub fn flip_y() -> Self {
        Self::scale(1.0, -1.0)
    }

    /// 复合变换: 先实施 `other`, 再实施 `self`.
    pub fn compose(&self, other: &ViewMatrix) -> ViewMatrix {
        let (a, b) = (&self.0, &other.0);
        let mut m = [0.0_f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                m[col * 4 + row] = (0..4)
                    .map(|k| a[k * 4 + row] * b[col * 4 + k])
                    .sum::<f32>();
            }
        }
        Self(m)
    }

    /// 变换平面上的点 `(x, y)`.
    pub fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let m = &self.0;
        (m[0] * x + m[4] * y + m[12], m[1] * x + m[5] * y + m[13])
    }

    /// 底层列主序数组.
    #[inline]
    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }
}

impl Mul for ViewMatrix {
    type Output = ViewMatrix;

    fn mul(self, rhs: ViewMatrix) -> ViewMatrix {
        self.compose(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::GradientSpec;
    use crate::data::SampleDepth;
    use crate::snake::Point;

    /// 沿反对角线递增, 各灰度的出现次数为 1, 2, ..., 8, ..., 1.
    fn ramp() -> IntensityGrid {
        IntensityGrid::new(
            Array2::from_shape_fn((8, 8), |(h, w)| (h + w) as f64 * 16.0),
            SampleDepth::U8,
        )
    }

    #[test]
    fn test_plain_does_not_touch_input() {
        let g = ramp();
        let mut mapper = GradientMapper::default();
        let Frame::Gray(out) = RenderConfig::default().render(&g, &mut mapper).unwrap() else {
            panic!("应为灰度帧");
        };
        assert_eq!(out, g);

        let cfg = RenderConfig {
            invert: true,
            ..RenderConfig::default()
        };
        let Frame::Gray(out) = cfg.render(&g, &mut mapper).unwrap() else {
            panic!("应为灰度帧");
        };
        assert_eq!(out[(0, 0)], 224.0);
        assert_eq!(g[(0, 0)], 0.0);
    }

    #[test]
    fn test_overlays_select_frame() {
        let g = ramp();
        let mut mapper = GradientMapper::new(GradientSpec::default());
        let frame = |overlay: Overlay, mapper: &mut GradientMapper| {
            RenderConfig {
                window: Some(DisplayWindow::upper_band()),
                invert: false,
                overlay,
            }
            .render(&g, mapper)
            .unwrap()
        };

        let Frame::Color(color) = frame(Overlay::Gradient(Channel::Red), &mut mapper) else {
            panic!("应为颜色帧");
        };
        assert_eq!(color.dim(), (8, 8, 3));
        assert!(mapper.lut().is_some());
        assert!(matches!(frame(Overlay::Edges, &mut mapper), Frame::Edges(_)));
        assert!(matches!(frame(Overlay::Threshold, &mut mapper), Frame::Segmented(_)));

        let Frame::Gray(masked) = frame(Overlay::BackgroundMask, &mut mapper) else {
            panic!("应为灰度帧");
        };
        assert_eq!(masked[(3, 3)], 0.0);
        assert!(masked[(0, 5)] > 0.0);

        let overlay = Overlay::contour(Contour::circle(Point::new(4.0, 4.0), 2.0, 8).unwrap());
        let Frame::Contour { report, .. } = frame(overlay, &mut mapper) else {
            panic!("应为轮廓帧");
        };
        assert_eq!(report.contour.len(), 8);
    }

    #[test]
    fn test_view_matrix() {
        let p = (3.0, 2.0);
        assert_eq!(ViewMatrix::identity().apply(p), p);
        assert_eq!(ViewMatrix::mirror_x(5.0).apply(p), (7.0, 2.0));
        assert_eq!(ViewMatrix::flip_y().apply(p), (3.0, -2.0));

        // 先缩放, 再镜像.
        let m = ViewMatrix::mirror_x(1.0) * ViewMatrix::scale(2.0, 3.0);
        assert_eq!(m.apply(p), (-4.0, 6.0));
        assert_eq!(m.as_array()[12], 2.0);
        assert_eq!(ViewMatrix::identity() * m, m);
    }
}
