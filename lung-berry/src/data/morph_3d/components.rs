//! 6-连通分量标记与按体素数排序.

use std::collections::VecDeque;

use binary_heap_plus::BinaryHeap;
use ndarray::{Array3, ArrayView3};

use crate::Idx3d;

/// 获取 `pos` 前后上下左右六个点的坐标.
///
/// 在 `shape` 范围外的坐标会被过滤掉.
#[inline]
fn diamond_neighbours(
    (z, h, w): Idx3d,
    (len_z, len_h, len_w): Idx3d,
) -> impl Iterator<Item = Idx3d> {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
    .into_iter()
    .filter(move |&(a, b, c)| a < len_z && b < len_h && c < len_w)
}

/// 三维连通分量标记结果.
///
/// 标签 `0` 代表背景, 正整数标签按照各分量首个体素的行优先 `(z, h, w)`
/// 扫描顺序依次分配.
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    labels: Array3<u32>,

    /// `sizes[label]` 为该分量的体素个数. `sizes[0]` 恒为 0.
    sizes: Vec<usize>,
}

impl ComponentLabels {
    /// 标签网格的不可变视图.
    #[inline]
    pub fn labels(&self) -> ArrayView3<'_, u32> {
        self.labels.view()
    }

    /// 分量大小表. 下标为标签, 背景 (下标 0) 的大小被强制为 0.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// 非背景分量个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len() - 1
    }

    /// 是否不存在任何非背景分量.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 标签为 `label` 的分量体素个数. 标签不存在时返回 0.
    #[inline]
    pub fn size_of(&self, label: u32) -> usize {
        self.sizes.get(label as usize).copied().unwrap_or(0)
    }

    /// 按体素个数降序选出至多 `k` 个分量标签. 体素个数相同时标签小者优先.
    ///
    /// 若非背景分量不足 `k` 个, 则返回全部分量.
    pub fn largest(&self, k: usize) -> Vec<u32> {
        // 堆顶为体素最多 (同大小时标签最小) 的分量.
        let mut heap: BinaryHeap<u32, _> = BinaryHeap::new_by(|a: &u32, b: &u32| {
            self.sizes[*a as usize]
                .cmp(&self.sizes[*b as usize])
                .then_with(|| b.cmp(a))
        });
        heap.reserve(self.len());
        for label in 1..self.sizes.len() as u32 {
            heap.push(label);
        }
        (0..k).map_while(|_| heap.pop()).collect()
    }

    /// 组合选中分量: 体素为 `true` 当且仅当其标签在 `chosen` 中.
    pub fn select(&self, chosen: &[u32]) -> Array3<bool> {
        let mut keep = vec![false; self.sizes.len()];
        for &label in chosen.iter().filter(|&&l| l != 0) {
            if let Some(slot) = keep.get_mut(label as usize) {
                *slot = true;
            }
        }
        self.labels.mapv(|l| keep[l as usize])
    }
}

/// 按照 6-邻接 (面相邻) 规则标记 `grid` 中所有前景连通分量.
///
/// 两个体素 `p1` 和 `p2` 属于同一个分量, 当且仅当存在一条从 `p1` 到 `p2`
/// 的 6-相邻路径, 且路径上的所有体素都是前景.
pub fn label_components(grid: ArrayView3<'_, bool>) -> ComponentLabels {
    let shape = grid.dim();
    let mut labels = Array3::<u32>::zeros(shape);
    let mut sizes = vec![0usize];
    let mut bfs_q = VecDeque::with_capacity(64);

    for (pos, &fg) in grid.indexed_iter() {
        if !fg || labels[pos] != 0 {
            continue;
        }
        let label = sizes.len() as u32;
        let mut size = 0usize;

        // 入队即标记, 避免重复入队.
        labels[pos] = label;
        bfs_q.push_back(pos);
        while let Some(cur) = bfs_q.pop_front() {
            size += 1;
            for neigh in diamond_neighbours(cur, shape) {
                if grid[neigh] && labels[neigh] == 0 {
                    labels[neigh] = label;
                    bfs_q.push_back(neigh);
                }
            }
        }
        sizes.push(size);
    }

    debug_assert_eq!(
        sizes.iter().sum::<usize>(),
        grid.iter().filter(|&&b| b).count()
    );
    ComponentLabels { labels, sizes }
}

/// 统计 `grid` 中 6-连通前景分量的个数.
pub fn count_components(grid: ArrayView3<'_, bool>) -> usize {
    label_components(grid).len()
}

/// 检查两个标签网格是否表示同一种划分 (忽略标签编号本身).
#[cfg(test)]
pub(crate) fn same_partition(a: ArrayView3<'_, u32>, b: ArrayView3<'_, u32>) -> bool {
    use ndarray::Zip;
    use std::collections::HashMap;

    let mut forward = HashMap::new();
    let mut ok = a.dim() == b.dim();
    Zip::from(a).and(b).for_each(|&x, &y| {
        ok &= *forward.entry(x).or_insert(y) == y;
    });
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn grid_with(shape: Idx3d, cubes: &[(Idx3d, usize)]) -> Array3<bool> {
        let mut g = Array3::from_elem(shape, false);
        for &((z, h, w), side) in cubes {
            g.slice_mut(s![z..z + side, h..h + side, w..w + side])
                .fill(true);
        }
        g
    }

    #[test]
    fn test_empty_grid() {
        let g = Array3::from_elem((3, 4, 5), false);
        let labels = label_components(g.view());
        assert!(labels.is_empty());
        assert_eq!(labels.sizes(), &[0]);
        assert!(labels.largest(2).is_empty());
        assert!(labels.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_face_connectivity_only() {
        // 两个体素仅共享一条棱, 在 6-邻接下不连通.
        let mut g = Array3::from_elem((2, 2, 2), false);
        g[(0, 0, 0)] = true;
        g[(0, 1, 1)] = true;
        assert_eq!(count_components(g.view()), 2);

        // 仅共享一个角.
        let mut g = Array3::from_elem((2, 2, 2), false);
        g[(0, 0, 0)] = true;
        g[(1, 1, 1)] = true;
        assert_eq!(count_components(g.view()), 2);

        // 共享一个面.
        g[(0, 0, 1)] = true;
        g[(0, 1, 1)] = true;
        g[(1, 1, 1)] = true;
        assert_eq!(count_components(g.view()), 1);
    }

    #[test]
    fn test_raster_order_labels_and_sizes() {
        let g = grid_with((10, 10, 10), &[((6, 6, 6), 3), ((0, 0, 0), 2), ((0, 5, 0), 1)]);
        let labels = label_components(g.view());
        assert_eq!(labels.len(), 3);
        // 首个体素的行优先顺序: (0,0,0) -> (0,5,0) -> (6,6,6).
        assert_eq!(labels.labels()[(0, 0, 0)], 1);
        assert_eq!(labels.labels()[(0, 5, 0)], 2);
        assert_eq!(labels.labels()[(7, 7, 7)], 3);
        assert_eq!(labels.sizes(), &[0, 8, 1, 27]);
        assert_eq!(labels.size_of(3), 27);
        assert_eq!(labels.size_of(42), 0);
    }

    #[test]
    fn test_largest_with_ties() {
        let g = grid_with(
            (12, 12, 12),
            &[((0, 0, 0), 2), ((0, 4, 0), 3), ((0, 9, 0), 2), ((6, 6, 6), 3)],
        );
        let labels = label_components(g.view());
        assert_eq!(labels.sizes(), &[0, 8, 27, 8, 27]);
        assert_eq!(labels.largest(2), vec![2, 4]);
        assert_eq!(labels.largest(3), vec![2, 4, 1]);
        assert_eq!(labels.largest(10), vec![2, 4, 1, 3]);
        assert_eq!(labels.largest(0), Vec::<u32>::new());
    }

    #[test]
    fn test_select() {
        let g = grid_with((6, 6, 6), &[((0, 0, 0), 2), ((3, 3, 3), 3)]);
        let labels = label_components(g.view());
        let only_big = labels.select(&[2]);
        assert_eq!(only_big.iter().filter(|&&b| b).count(), 27);
        assert!(!only_big[(0, 0, 0)]);
        assert!(only_big[(4, 4, 4)]);

        // 背景标签与不存在的标签被忽略.
        let none = labels.select(&[0, 99]);
        assert!(none.iter().all(|&b| !b));
    }

    #[test]
    fn test_labeling_is_deterministic() {
        let g = grid_with((8, 8, 8), &[((0, 0, 0), 3), ((4, 4, 4), 4), ((0, 6, 0), 2)]);
        let a = label_components(g.view());
        let b = label_components(g.view());
        assert_eq!(a.labels(), b.labels());
        assert!(same_partition(a.labels(), b.labels()));
    }
}
