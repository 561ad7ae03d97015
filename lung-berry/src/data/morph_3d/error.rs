//! 掩膜提取运行时错误.

use thiserror::Error;

/// 掩膜提取的运行时错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaskError {
    /// 闭运算立方体核边长必须为正.
    #[error("闭运算核边长必须为正, 实际为 {0}")]
    InvalidKernel(usize),

    /// 阈值窗口不合法 (含 NaN 或下限大于上限).
    #[error("阈值窗口 [{lower}, {upper}] 不合法")]
    InvalidThreshold {
        /// 阈值下限.
        lower: f32,

        /// 阈值上限.
        upper: f32,
    },

    /// 阈值化后不存在任何前景体素.
    #[error("阈值化结果为空, 不存在任何连通分量")]
    EmptyComponents,
}
