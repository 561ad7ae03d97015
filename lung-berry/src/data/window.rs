//! 强度阈值窗口.

use crate::consts::{DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 强度阈值窗口, 包含下限 `lower` 和上限 `upper`, 两端均为闭区间.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdWindow {
    lower: f32,
    upper: f32,
}

impl Default for ThresholdWindow {
    #[inline]
    fn default() -> Self {
        Self::from_lung_default()
    }
}

impl ThresholdWindow {
    /// 构建阈值窗口.
    ///
    /// 任一边界为 NaN, 或 `lower > upper` 时返回 `None`.
    pub fn new(lower: f32, upper: f32) -> Option<ThresholdWindow> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            None
        } else {
            Some(Self { lower, upper })
        }
    }

    /// 构建 DIR-Lab COPD 扫描上提取肺实质的默认窗口, 即 `[100, 500]`.
    #[inline]
    pub const fn from_lung_default() -> ThresholdWindow {
        Self {
            lower: DEFAULT_LOWER_THRESHOLD,
            upper: DEFAULT_UPPER_THRESHOLD,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower(&self) -> f32 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper(&self) -> f32 {
        self.upper
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// `v` 是否落在 `[lower, upper]` 内. NaN 永远不在窗内.
    #[inline]
    pub fn contains(&self, v: f32) -> bool {
        self.lower <= v && v <= self.upper
    }
}
