//! 运行时错误.

use thiserror::Error;

/// 数值变换的运行时错误.
///
/// 所有变换都是一次性的确定性计算, 不会在内部重试.
/// 在入口处检测到的数值退化会立即以具体的错误类型上报, 而不是静默地产生 NaN/Inf.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// 图像为常量 (或值域为空), 线性映射的分母为零.
    #[error("图像值域退化: 最小值与最大值均为 {0}")]
    DegenerateRange(f64),

    /// 直方图的两个锚点 (最多/最少出现次数的灰度) 重合, 无法确定分割直线.
    #[error("直方图退化: 锚点重合于灰度 {0}")]
    DegenerateHistogram(i64),

    /// 主动轮廓的系统矩阵 `A + gamma * I` 不可逆.
    #[error("系统矩阵奇异: {points} 个轮廓点, alpha = {alpha}, beta = {beta}, gamma = {gamma}")]
    SingularSystem {
        /// 轮廓点个数.
        points: usize,
        /// 弹性权重.
        alpha: f64,
        /// 刚性权重.
        beta: f64,
        /// 步长权重.
        gamma: f64,
    },

    /// 输入形状不一致.
    #[error("形状不一致: 期望 {expected:?}, 实际 {actual:?}")]
    ShapeMismatch {
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        actual: Vec<usize>,
    },

    /// 直接访问时索引越界. 导航操作会钳制索引, 不会产生该错误.
    #[error("索引 {index} 越界, 长度为 {len}")]
    IndexOutOfRange {
        /// 请求的索引.
        index: usize,
        /// 该维度长度.
        len: usize,
    },

    /// 参数非法.
    #[error("参数非法: {0}")]
    InvalidParameter(&'static str),
}

/// 数值变换运行时结果.
pub type TransformResult<T> = Result<T, TransformError>;
