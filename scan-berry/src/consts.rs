//! 通用常量.

use crate::Idx2d;

/// 融合结果所在画布的大小 (高, 宽).
pub const FUSION_CANVAS: Idx2d = (512, 256);

/// 准备主动轮廓外部场时默认的高斯平滑标准差.
pub const FIELD_SIGMA: f64 = 5.0;

/// 单通道颜色.
pub mod gray {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;
}
