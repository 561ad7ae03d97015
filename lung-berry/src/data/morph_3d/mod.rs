//! 3D 形态学操作.
//!
//! 肺部掩膜提取流程:
//!
//! 1. 阈值化: 强度落在 `[lower, upper]` (闭区间) 的体素为前景;
//! 2. 以 6-邻接规则标记连通分量;
//! 3. 按体素个数选出最大的两个分量 (同大小时标签小者优先);
//! 4. 以全 1 立方体做闭运算, 填充小空洞.

use log::{debug, warn};
use ndarray::{Array3, ArrayView3};

use crate::consts::gray::from_flag;
use crate::consts::{COPD_CLOSING_SIZE, DEFAULT_CLOSING_SIZE, LUNG_COMPONENTS};
use crate::data::ThresholdWindow;

mod closing;
mod components;
mod error;

pub use closing::{binary_closing, binary_dilation, binary_erosion};
pub use components::{count_components, label_components, ComponentLabels};
pub use error::MaskError;

/// 掩膜提取运行时错误.
pub type MaskResult<T> = Result<T, MaskError>;

/// 肺部掩膜提取参数.
///
/// 该结构只能通过校验后的构造函数创建, 因此其取值总是合法的.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaskParams {
    window: ThresholdWindow,
    closing_size: usize,
}

impl Default for MaskParams {
    /// 阈值 `[100, 500]`, 闭运算核边长 5.
    #[inline]
    fn default() -> Self {
        Self {
            window: ThresholdWindow::from_lung_default(),
            closing_size: DEFAULT_CLOSING_SIZE,
        }
    }
}

impl MaskParams {
    /// 构建提取参数.
    ///
    /// 阈值不合法时返回 `Err(MaskError::InvalidThreshold)`;
    /// `closing_size` 为 0 时返回 `Err(MaskError::InvalidKernel)`.
    pub fn new(lower: f32, upper: f32, closing_size: usize) -> MaskResult<Self> {
        let window = ThresholdWindow::new(lower, upper)
            .ok_or(MaskError::InvalidThreshold { lower, upper })?;
        if closing_size == 0 {
            return Err(MaskError::InvalidKernel(closing_size));
        }
        Ok(Self {
            window,
            closing_size,
        })
    }

    /// DIR-Lab COPD 流程使用的参数: 阈值 `[100, 500]`, 闭运算核边长 7.
    #[inline]
    pub fn copd() -> Self {
        Self {
            closing_size: COPD_CLOSING_SIZE,
            ..Self::default()
        }
    }

    /// 阈值窗口.
    #[inline]
    pub fn window(&self) -> ThresholdWindow {
        self.window
    }

    /// 闭运算立方体核边长.
    #[inline]
    pub fn closing_size(&self) -> usize {
        self.closing_size
    }
}

/// 阈值化: 体素为 `true` 当且仅当其强度落在 `window` 内.
pub fn threshold(volume: ArrayView3<'_, f32>, window: ThresholdWindow) -> Array3<bool> {
    volume.mapv(|v| window.contains(v))
}

/// 从 `(z, h, w)` 组织的强度体数据中提取精化的肺部掩膜.
///
/// 返回值与 `volume` 形状相同, 体素只取 [`MASK_BACKGROUND`] 或 [`MASK_LUNG`].
/// 若阈值化后只有一个连通分量, 则只保留该分量 (并记录警告);
/// 若不存在任何前景, 返回 `Err(MaskError::EmptyComponents)`.
///
/// [`MASK_BACKGROUND`]: crate::consts::gray::MASK_BACKGROUND
/// [`MASK_LUNG`]: crate::consts::gray::MASK_LUNG
pub fn refine_lung_mask(volume: ArrayView3<'_, f32>, params: &MaskParams) -> MaskResult<Array3<u8>> {
    let grid = threshold(volume, params.window());
    let labels = label_components(grid.view());
    debug!(
        "阈值 [{}, {}] 下共有 {} 个连通分量",
        params.window().lower(),
        params.window().upper(),
        labels.len()
    );
    if labels.is_empty() {
        return Err(MaskError::EmptyComponents);
    }

    let chosen = labels.largest(LUNG_COMPONENTS);
    if chosen.len() < LUNG_COMPONENTS {
        warn!(
            "仅找到 {} 个连通分量 (期望 {LUNG_COMPONENTS} 个), 全部保留",
            chosen.len()
        );
    }
    debug!(
        "选中分量 {:?}, 体素数 {:?}",
        chosen,
        chosen.iter().map(|&l| labels.size_of(l)).collect::<Vec<_>>()
    );

    let selected = labels.select(&chosen);
    let closed = binary_closing(selected.view(), params.closing_size())?;
    Ok(closed.mapv(from_flag))
}
