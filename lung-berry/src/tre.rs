//! 目标配准误差 (Target Registration Error, TRE).
//!
//! 对两组一一对应的标志点 (物理坐标, 毫米) 逐对计算欧氏距离.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::landmark::{Landmark, LandmarkResult, LandmarkSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[inline]
fn euclidean([x0, y0, z0]: &Landmark, [x1, y1, z1]: &Landmark) -> f64 {
    ((x0 - x1).powi(2) + (y0 - y1).powi(2) + (z0 - z1).powi(2)).sqrt()
}

/// 计算逐对距离及其平均值.
///
/// 两组标志点个数不同时返回 `Err(LandmarkError::ShapeMismatch)`,
/// 为空时返回 `Err(LandmarkError::Empty)`.
pub fn calculate_tre(a: &LandmarkSet, b: &LandmarkSet) -> LandmarkResult<(Vec<f64>, f64)> {
    a.check_paired(b)?;
    let distances: Vec<f64> = a.iter().zip(b.iter()).map(|(p, q)| euclidean(p, q)).collect();
    let mean = distances.iter().sum::<f64>() / distances.len() as f64;
    Ok((distances, mean))
}

/// TRE 统计报告.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TreReport {
    distances: Vec<f64>,
    mean: f64,
    std: f64,
    min: f64,
    median: f64,
    max: f64,
}

impl TreReport {
    /// 计算 `a` 与 `b` 之间的 TRE 及其统计量. 错误条件同 [`calculate_tre`].
    pub fn new(a: &LandmarkSet, b: &LandmarkSet) -> LandmarkResult<Self> {
        let (distances, mean) = calculate_tre(a, b)?;
        let n = distances.len() as f64;
        let std = (distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();

        let mut sorted: Vec<OrderedFloat<f64>> = distances.iter().copied().map(OrderedFloat).collect();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1].0 + sorted[mid].0) / 2.0
        } else {
            sorted[mid].0
        };
        // 非空已由 `calculate_tre` 保证.
        let (min, max) = (sorted[0].0, sorted[sorted.len() - 1].0);

        Ok(Self {
            distances,
            mean,
            std,
            min,
            median,
            max,
        })
    }

    /// 逐对距离, 顺序与输入一致.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// 平均距离.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 距离的总体标准差.
    #[inline]
    pub fn std(&self) -> f64 {
        self.std
    }

    /// 最小距离.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 距离中位数.
    #[inline]
    pub fn median(&self) -> f64 {
        self.median
    }

    /// 最大距离.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl fmt::Display for TreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TRE = {:.2} ± {:.2} mm (min {:.2}, median {:.2}, max {:.2}, n = {})",
            self.mean,
            self.std,
            self.min,
            self.median,
            self.max,
            self.distances.len()
        )
    }
}
