//! 闭合轮廓的五对角循环系统矩阵, 以及 "一次分解, 多次求解" 的线性方程组求解器.

use ndarray::{Array1, Array2, OwnedRepr};
use ndarray_linalg::{FactorizeInto, LUFactorized, ReciprocalConditionNum, Solve};

/// 闭合轮廓上 `n` 个点的内部能量矩阵 `A = -alpha * D1 + beta * D2`.
///
/// `D1` 为二阶差分 (对角线 -2, 相邻 +1), `D2` 为四阶差分 (对角线 6, 相邻 -4, 隔一 +1).
/// 所有下标按 `n` 取模, 因此点数很少时重叠的偏移会累加.
pub(crate) fn internal_matrix(n: usize, alpha: f64, beta: f64) -> Array2<f64> {
    let mut a = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for (offset, d1, d2) in [(0, -2.0, 6.0), (1, 1.0, -4.0), (2, 0.0, 1.0)] {
            let fwd = (i + offset) % n;
            let back = (i + n - offset % n) % n;
            let v = -alpha * d1 + beta * d2;
            if offset == 0 {
                a[(i, i)] += v;
            } else {
                a[(i, fwd)] += v;
                a[(i, back)] += v;
            }
        }
    }
    a
}

/// `A + gamma * I`.
pub(crate) fn system_matrix(n: usize, alpha: f64, beta: f64, gamma: f64) -> Array2<f64> {
    let mut a = internal_matrix(n, alpha, beta);
    a.diag_mut().mapv_inplace(|v| v + gamma);
    a
}

/// 倒条件数低于该值时视为奇异.
const RCOND_EPS: f64 = 1e-12;

/// 系统矩阵的 LU 分解.
pub(crate) struct SystemSolver {
    lu: LUFactorized<OwnedRepr<f64>>,
}

impl SystemSolver {
    /// 分解 `a`. 矩阵奇异 (或病态到无法可靠求解) 时返回 `None`.
    pub(crate) fn factorize(a: Array2<f64>) -> Option<Self> {
        if a.is_empty() || !a.is_square() {
            return None;
        }
        let lu = a.factorize_into().ok()?;
        let rcond = lu.rcond().ok()?;
        if !(rcond > RCOND_EPS) {
            log::debug!("系统矩阵病态, 倒条件数 {rcond:e}");
            return None;
        }
        Some(Self { lu })
    }

    /// 求解 `a * x = b`.
    pub(crate) fn solve(&self, b: &Array1<f64>) -> Option<Array1<f64>> {
        self.lu.solve(b).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_internal_matrix_rows() {
        let a = internal_matrix(6, 1.0, 1.0);
        // 第 0 行: 对角 2 + 6, 相邻 -1 - 4, 隔一 +1.
        assert_eq!(a.row(0).to_vec(), vec![8.0, -5.0, 1.0, 0.0, 1.0, -5.0]);
        // 循环矩阵: 对称, 行和为零.
        assert_eq!(a, a.t());
        assert!(a.rows().into_iter().all(|r| r.sum() == 0.0));
    }

    #[test]
    fn test_small_loop_accumulates() {
        // n = 3 时, +2 与 -1 偏移重合.
        let a = internal_matrix(3, 0.0, 1.0);
        assert_eq!(a.row(0).to_vec(), vec![6.0, -3.0, -3.0]);
    }

    #[test]
    fn test_solve() {
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let x = array![1.0, -2.0, 0.5];
        let b = a.dot(&x);
        let solver = SystemSolver::factorize(a).unwrap();
        let got = solver.solve(&b).unwrap();
        assert!(got.iter().zip(x.iter()).all(|(g, e)| float_eq(*g, *e)));
    }

    #[test]
    fn test_singular() {
        assert!(SystemSolver::factorize(system_matrix(8, 0.015, 10.0, 0.0)).is_none());
        assert!(SystemSolver::factorize(array![[1.0, 2.0], [2.0, 4.0]]).is_none());
        assert!(SystemSolver::factorize(system_matrix(8, 0.015, 10.0, 0.001)).is_some());
        assert!(SystemSolver::factorize(Array2::zeros((0, 0))).is_none());
    }
}
