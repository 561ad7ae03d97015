//! 运行时错误.

use std::io;

use thiserror::Error;

/// 标志点读写或比较的运行时错误.
#[derive(Debug, Error)]
pub enum LandmarkError {
    /// 文件读写失败.
    #[error("标志点文件读写失败: {0}")]
    Io(#[from] io::Error),

    /// 标志点行不是恰好三个数值字段.
    ///
    /// `line` 从 1 开始计数.
    #[error("第 {line} 行不是合法的标志点: {content:?}")]
    Malformed {
        /// 行号.
        line: usize,

        /// 原始行内容.
        content: String,
    },

    /// transformix 输出记录中的字段缺失或不合法.
    #[error("第 {line} 行的点变换记录不合法: {reason}")]
    BadRecord {
        /// 行号.
        line: usize,

        /// 失败原因.
        reason: String,
    },

    /// 两组标志点个数不一致.
    #[error("标志点个数不一致: {left} != {right}")]
    ShapeMismatch {
        /// 第一组标志点个数.
        left: usize,

        /// 第二组标志点个数.
        right: usize,
    },

    /// 标志点集合为空.
    #[error("标志点集合为空")]
    Empty,
}
