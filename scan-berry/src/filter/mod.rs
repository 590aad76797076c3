//! 邻域滤波. 所有滤波器都通过同一个越界寻址函数处理边缘, 不复制填充后的图像.

mod gaussian;
mod sobel;

pub use gaussian::{gaussian, gaussian_kernel};
pub use sobel::{sobel, SOBEL_X, SOBEL_Y};

#[cfg(feature = "rayon")]
pub use sobel::par_sobel;

/// 越界索引的寻址方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Border {
    /// 环形寻址: `-1 -> len - 1`, `len -> 0`.
    Wrap,

    /// 半像素对称反射: `d c b a | a b c d | d c b a`.
    Reflect,

    /// 钳制到最近的合法索引.
    Clamp,
}

impl Border {
    /// 将可能越界的索引 `i` 映射到 `[0, len)` 内.
    ///
    /// `len` 必须大于 0, 否则程序 panic.
    pub fn index(self, i: isize, len: usize) -> usize {
        assert!(len > 0, "不能在空维度上寻址");
        let n = len as isize;
        let mapped = match self {
            Border::Wrap => i.rem_euclid(n),
            Border::Reflect => {
                let k = i.rem_euclid(2 * n);
                if k < n {
                    k
                } else {
                    2 * n - 1 - k
                }
            }
            Border::Clamp => i.clamp(0, n - 1),
        };
        mapped as usize
    }
}

#[cfg(test)]
mod tests {
    use super::Border;

    #[test]
    fn test_wrap() {
        let v: Vec<usize> = (-5..9).map(|i| Border::Wrap.index(i, 4)).collect();
        assert_eq!(v, vec![3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_reflect() {
        let v: Vec<usize> = (-4..8).map(|i| Border::Reflect.index(i, 3)).collect();
        // 周期为 6: ... c b a | a b c | c b a ...
        assert_eq!(v, vec![2, 2, 1, 0, 0, 1, 2, 2, 1, 0, 0, 1]);
        assert_eq!(Border::Reflect.index(-1, 1), 0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Border::Clamp.index(-3, 5), 0);
        assert_eq!(Border::Clamp.index(7, 5), 4);
        assert_eq!(Border::Clamp.index(2, 5), 2);
    }
}
