//! 立方体结构元的三维二值形态学运算.
//!
//! 全 1 立方体结构元可以分解为三个轴向的一维线段, 因此膨胀与腐蚀都按
//! `z`, `h`, `w` 三个方向依次做一维滑窗, 每条扫描线用前缀和求窗口内前景数.
//!
//! 边长为 `k` 的立方体在腐蚀时覆盖偏移 `-(k / 2) ..= (k - 1) / 2`,
//! 膨胀时使用其反射. 体积外的体素在两种运算中都视为背景,
//! 所以窗口越出体积的体素在腐蚀后必为背景.

use ndarray::{Array3, ArrayView1, ArrayView3, ArrayViewMut1, Axis, Zip};

use super::error::MaskError;
use super::MaskResult;

/// 一维滑窗的种类.
#[derive(Copy, Clone, Debug)]
enum Sweep {
    /// 窗口内存在前景即为前景.
    Dilate,

    /// 窗口完全位于体积内且全为前景才为前景.
    Erode,
}

impl Sweep {
    /// 边长为 `size` 的线段结构元相对于中心的闭区间偏移 `(lo, hi)`.
    #[inline]
    fn offsets(self, size: usize) -> (isize, isize) {
        let before = (size / 2) as isize;
        let after = ((size - 1) / 2) as isize;
        match self {
            Sweep::Erode => (-before, after),
            Sweep::Dilate => (-after, before),
        }
    }
}

#[inline]
fn check_kernel(size: usize) -> MaskResult<()> {
    if size == 0 {
        Err(MaskError::InvalidKernel(size))
    } else {
        Ok(())
    }
}

/// 对单条扫描线 `s` 做一维滑窗, 结果写入 `o`. `prefix` 为复用的前缀和缓冲.
fn sweep_lane(
    mut o: ArrayViewMut1<'_, bool>,
    s: ArrayView1<'_, bool>,
    prefix: &mut Vec<usize>,
    size: usize,
    kind: Sweep,
) {
    let (lo, hi) = kind.offsets(size);
    let n = s.len() as isize;
    prefix.clear();
    prefix.push(0usize);
    for &b in s.iter() {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + usize::from(b));
    }

    for (i, slot) in o.iter_mut().enumerate() {
        let (from, to) = (i as isize + lo, i as isize + hi);
        let (a, b) = (from.max(0) as usize, (to.min(n - 1) + 1) as usize);
        let hits = prefix[b] - prefix[a];
        *slot = match kind {
            Sweep::Dilate => hits > 0,
            Sweep::Erode => from >= 0 && to < n && hits == size,
        };
    }
}

/// 沿 `axis` 对 `src` 的每条扫描线做一次一维滑窗.
fn sweep_axis(src: ArrayView3<'_, bool>, axis: Axis, size: usize, kind: Sweep) -> Array3<bool> {
    let mut out = Array3::from_elem(src.raw_dim(), false);
    let len = src.len_of(axis) + 1;
    let zip = Zip::from(out.lanes_mut(axis)).and(src.lanes(axis));

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            zip.par_for_each(|o, s| sweep_lane(o, s, &mut Vec::with_capacity(len), size, kind));
        } else {
            let mut prefix = Vec::with_capacity(len);
            zip.for_each(|o, s| sweep_lane(o, s, &mut prefix, size, kind));
        }
    }
    out
}

fn separable(grid: ArrayView3<'_, bool>, size: usize, kind: Sweep) -> Array3<bool> {
    if size == 1 {
        return grid.to_owned();
    }
    let pass_z = sweep_axis(grid, Axis(0), size, kind);
    let pass_h = sweep_axis(pass_z.view(), Axis(1), size, kind);
    sweep_axis(pass_h.view(), Axis(2), size, kind)
}

/// 以边长为 `size` 的全 1 立方体为结构元做二值膨胀.
///
/// `size` 为 0 时返回 `Err(MaskError::InvalidKernel)`.
pub fn binary_dilation(grid: ArrayView3<'_, bool>, size: usize) -> MaskResult<Array3<bool>> {
    check_kernel(size)?;
    Ok(separable(grid, size, Sweep::Dilate))
}

/// 以边长为 `size` 的全 1 立方体为结构元做二值腐蚀. 体积外视为背景.
///
/// `size` 为 0 时返回 `Err(MaskError::InvalidKernel)`.
pub fn binary_erosion(grid: ArrayView3<'_, bool>, size: usize) -> MaskResult<Array3<bool>> {
    check_kernel(size)?;
    Ok(separable(grid, size, Sweep::Erode))
}

/// 二值闭运算: 先膨胀, 再腐蚀. 两步使用同一个边长为 `size` 的立方体.
///
/// `size == 1` 时结果与输入完全相同.
pub fn binary_closing(grid: ArrayView3<'_, bool>, size: usize) -> MaskResult<Array3<bool>> {
    let dilated = binary_dilation(grid, size)?;
    binary_erosion(dilated.view(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    /// 直接按定义在立方体窗口上逐点计算, 作为对照.
    fn brute_force(grid: ArrayView3<'_, bool>, size: usize, kind: Sweep) -> Array3<bool> {
        let (lo, hi) = kind.offsets(size);
        let (dz, dh, dw) = grid.dim();
        let inside = |p: isize, n: usize| p >= 0 && (p as usize) < n;
        Array3::from_shape_fn(grid.raw_dim(), |(z, h, w)| {
            let mut any = false;
            let mut all = true;
            for oz in lo..=hi {
                for oh in lo..=hi {
                    for ow in lo..=hi {
                        let (pz, ph, pw) = (z as isize + oz, h as isize + oh, w as isize + ow);
                        let v = inside(pz, dz)
                            && inside(ph, dh)
                            && inside(pw, dw)
                            && grid[(pz as usize, ph as usize, pw as usize)];
                        any |= v;
                        all &= v;
                    }
                }
            }
            match kind {
                Sweep::Dilate => any,
                Sweep::Erode => all,
            }
        })
    }

    fn pseudo_random_grid(shape: (usize, usize, usize), seed: u64) -> Array3<bool> {
        let mut state = seed;
        Array3::from_shape_fn(shape, |_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % 3 == 0
        })
    }

    #[test]
    fn test_zero_kernel_rejected() {
        let g = Array3::from_elem((2, 2, 2), true);
        assert_eq!(
            binary_closing(g.view(), 0).unwrap_err(),
            MaskError::InvalidKernel(0)
        );
        assert!(binary_dilation(g.view(), 0).is_err());
        assert!(binary_erosion(g.view(), 0).is_err());
    }

    #[test]
    fn test_unit_kernel_is_identity() {
        let g = pseudo_random_grid((5, 6, 7), 7);
        assert_eq!(binary_closing(g.view(), 1).unwrap(), g);
        assert_eq!(binary_dilation(g.view(), 1).unwrap(), g);
        assert_eq!(binary_erosion(g.view(), 1).unwrap(), g);
    }

    #[test]
    fn test_separable_matches_brute_force() {
        for (seed, size) in [(1, 2), (2, 3), (3, 4), (4, 5)] {
            let g = pseudo_random_grid((6, 7, 8), seed);
            for kind in [Sweep::Dilate, Sweep::Erode] {
                assert_eq!(
                    separable(g.view(), size, kind),
                    brute_force(g.view(), size, kind),
                    "size = {size}, kind = {kind:?}"
                );
            }
        }
    }

    #[test]
    fn test_closing_fills_interior_hole() {
        let mut g = Array3::from_elem((11, 11, 11), false);
        g.slice_mut(s![2..9, 2..9, 2..9]).fill(true);
        g[(5, 5, 5)] = false;
        let closed = binary_closing(g.view(), 3).unwrap();
        assert!(closed[(5, 5, 5)]);
        // 远离边界的实心立方体形状不变.
        let mut expected = Array3::from_elem((11, 11, 11), false);
        expected.slice_mut(s![2..9, 2..9, 2..9]).fill(true);
        assert_eq!(closed, expected);
    }

    #[test]
    fn test_closing_bridges_small_gap() {
        let mut g = Array3::from_elem((9, 9, 15), false);
        g.slice_mut(s![2..7, 2..7, 2..7]).fill(true);
        g.slice_mut(s![2..7, 2..7, 8..13]).fill(true);
        let closed = binary_closing(g.view(), 3).unwrap();
        assert!(closed[(4, 4, 7)]);
        assert_eq!(
            super::super::components::count_components(closed.view()),
            1
        );
    }

    #[test]
    fn test_erosion_clears_volume_border() {
        let g = Array3::from_elem((5, 5, 5), true);
        let closed = binary_closing(g.view(), 3).unwrap();
        assert!(!closed[(0, 2, 2)]);
        assert!(!closed[(2, 4, 2)]);
        assert!(closed[(2, 2, 2)]);
        assert_eq!(closed.iter().filter(|&&b| b).count(), 27);
    }
}
