//! 主动轮廓 (snake).
//!
//! 闭合轮廓在内部能量 (弹性 `alpha`, 刚性 `beta`) 和外部场吸引力的共同作用下迭代形变.
//! 系统矩阵 `A + gamma * I` 在一次求解中只分解一次, 之后每轮迭代只做回代.
//!
//! 坐标约定: 轮廓点的 `x` 为列坐标, `y` 为行坐标, 与网格的 `(h, w)` 索引相反.

mod interp;
mod system;

use crate::data::IntensityGrid;
use crate::error::{TransformError, TransformResult};
use crate::filter::gaussian;
use interp::Bicubic;
use ndarray::{Array1, Array2, ArrayView2, Zip};
use system::{system_matrix, SystemSolver};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 平面上的点.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// 列坐标.
    pub x: f64,

    /// 行坐标.
    pub y: f64,
}

impl Point {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 闭合轮廓, 至少 3 个点. 最后一个点与第一个点相连.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    /// 构成闭合轮廓所需的最少点数.
    pub const MIN_POINTS: usize = 3;

    /// 用给定点序列构建轮廓.
    ///
    /// 点数少于 [`Self::MIN_POINTS`] 或存在非有限坐标时返回
    /// [`TransformError::InvalidParameter`].
    pub fn from_points(points: Vec<Point>) -> TransformResult<Self> {
        if points.len() < Self::MIN_POINTS {
            return Err(TransformError::InvalidParameter("轮廓至少需要 3 个点"));
        }
        if !points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(TransformError::InvalidParameter("轮廓坐标必须为有限值"));
        }
        Ok(Self { points })
    }

    /// 以 `center` 为圆心, `radius` 为半径, 均匀取 `n` 个点的圆. 第一个点位于圆心正右方.
    pub fn circle(center: Point, radius: f64, n: usize) -> TransformResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(TransformError::InvalidParameter("圆的半径必须为正"));
        }
        let step = std::f64::consts::TAU / n as f64;
        Self::from_points(
            (0..n)
                .map(|i| {
                    let t = i as f64 * step;
                    Point::new(center.x + radius * t.cos(), center.y + radius * t.sin())
                })
                .collect(),
        )
    }

    #[inline]
    fn from_xy(x: &Array1<f64>, y: &Array1<f64>) -> Self {
        let points = x.iter().zip(y.iter()).map(|(&x, &y)| Point::new(x, y)).collect();
        Self { points }
    }

    /// 点数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 轮廓至少有 3 个点, 因此总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 全部点.
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// 获取能迭代全部点的迭代器.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// 依次给出全部 `n` 条边, 最后一条为闭合边 `(last, first)`.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    fn xs(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    fn ys(&self) -> Array1<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// 主动轮廓参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnakeParams {
    /// 弹性权重.
    pub alpha: f64,

    /// 刚性权重.
    pub beta: f64,

    /// 步长 (惯性) 权重.
    pub gamma: f64,

    /// 单步位移的软上限.
    pub max_px_move: f64,

    /// 最大迭代次数.
    pub max_iterations: usize,

    /// 收敛阈值.
    pub convergence: f64,

    /// 参与收敛判断的历史迭代数.
    pub convergence_order: usize,
}

impl Default for SnakeParams {
    fn default() -> Self {
        Self {
            alpha: 0.015,
            beta: 10.0,
            gamma: 0.001,
            max_px_move: 4.0,
            max_iterations: 10,
            convergence: 1e-4,
            convergence_order: 10,
        }
    }
}

impl SnakeParams {
    /// 检查参数. 不检查系统矩阵是否奇异, 该检查在求解时进行.
    pub fn validate(&self) -> TransformResult<()> {
        let finite = [self.alpha, self.beta, self.gamma, self.convergence]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(TransformError::InvalidParameter("能量权重必须为有限值"));
        }
        if !(self.max_px_move.is_finite() && self.max_px_move > 0.0) {
            return Err(TransformError::InvalidParameter("max_px_move 必须为正"));
        }
        if self.convergence_order == 0 {
            return Err(TransformError::InvalidParameter("convergence_order 至少为 1"));
        }
        Ok(())
    }
}

/// 一次求解的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnakeReport {
    /// 最终轮廓, 点数与初始轮廓相同.
    pub contour: Contour,

    /// 实际执行的迭代次数.
    pub iterations: usize,

    /// 是否因收敛而提前终止.
    pub converged: bool,
}

/// 准备外部场: 缩放到 `[0, 1]` 后做高斯平滑.
pub fn prepare_field(grid: &IntensityGrid, sigma: f64) -> TransformResult<Array2<f64>> {
    let scale = grid.max_representable();
    gaussian(grid.data().mapv(|v| v / scale).view(), sigma)
}

/// 以 `field` 为外部场, 从 `init` 出发求解主动轮廓.
///
/// `field` 最大值为正时先除以最大值. 系统矩阵奇异时返回
/// [`TransformError::SingularSystem`], 其余参数问题返回 [`TransformError::InvalidParameter`].
pub fn solve(
    field: ArrayView2<f64>,
    init: &Contour,
    params: &SnakeParams,
) -> TransformResult<SnakeReport> {
    params.validate()?;
    if field.is_empty() {
        return Err(TransformError::InvalidParameter("外部场为空"));
    }

    let max = field.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let field = if max > 0.0 {
        field.mapv(|v| v / max)
    } else {
        field.to_owned()
    };
    let surface = Bicubic::new(field.view());

    let n = init.len();
    let SnakeParams {
        alpha,
        beta,
        gamma,
        ..
    } = *params;
    let singular = || TransformError::SingularSystem {
        points: n,
        alpha,
        beta,
        gamma,
    };
    let solver =
        SystemSolver::factorize(system_matrix(n, alpha, beta, gamma)).ok_or_else(singular)?;

    let (mut x, mut y) = (init.xs(), init.ys());
    let order = params.convergence_order;
    let mut x_hist = Array2::<f64>::zeros((order, n));
    let mut y_hist = Array2::<f64>::zeros((order, n));

    for i in 0..params.max_iterations {
        let (fx, fy): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y.iter())
            .map(|(&px, &py)| surface.gradient(Point::new(px, py)))
            .unzip();

        let xn = solver
            .solve(&(&x * gamma + &Array1::from(fx)))
            .ok_or_else(singular)?;
        let yn = solver
            .solve(&(&y * gamma + &Array1::from(fy)))
            .ok_or_else(singular)?;

        let step = params.max_px_move;
        Zip::from(&mut x).and(&xn).for_each(|p, &t| *p += step * (t - *p).tanh());
        Zip::from(&mut y).and(&yn).for_each(|p, &t| *p += step * (t - *p).tanh());

        // 与已记录的历史位置比较, 取各历史中最大单点位移的最小值.
        let filled = i.min(order);
        let dist = x_hist
            .rows()
            .into_iter()
            .zip(y_hist.rows())
            .take(filled)
            .map(|(xs, ys)| {
                xs.iter()
                    .zip(ys.iter())
                    .zip(x.iter().zip(y.iter()))
                    .map(|((hx, hy), (cx, cy))| (hx - cx).abs() + (hy - cy).abs())
                    .fold(0.0_f64, f64::max)
            })
            .fold(f64::INFINITY, f64::min);
        log::trace!("第 {i} 轮迭代完成, 历史最小位移 {dist:e}");
        if dist < params.convergence {
            log::debug!("主动轮廓在第 {} 轮收敛", i + 1);
            return Ok(SnakeReport {
                contour: Contour::from_xy(&x, &y),
                iterations: i + 1,
                converged: true,
            });
        }

        // 环形缓冲, 只保留最近 `order` 轮.
        x_hist.row_mut(i % order).assign(&x);
        y_hist.row_mut(i % order).assign(&y);
    }

    log::debug!("主动轮廓达到迭代上限 {}", params.max_iterations);
    Ok(SnakeReport {
        contour: Contour::from_xy(&x, &y),
        iterations: params.max_iterations,
        converged: false,
    })
}

/// 便捷入口: 由网格准备外部场后求解.
pub fn solve_grid(
    grid: &IntensityGrid,
    sigma: f64,
    init: &Contour,
    params: &SnakeParams,
) -> TransformResult<SnakeReport> {
    let field = prepare_field(grid, sigma)?;
    solve(field.view(), init, params)
}
