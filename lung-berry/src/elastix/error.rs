//! 运行时错误.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// 调用 elastix / transformix 的运行时错误.
#[derive(Debug, Error)]
pub enum ElastixError {
    /// 无法创建输出目录.
    #[error("无法创建输出目录 {}: {source}", .path.display())]
    OutputDir {
        /// 输出目录.
        path: PathBuf,

        /// 底层错误.
        source: io::Error,
    },

    /// 无法启动外部程序 (通常是程序不存在或不可执行).
    #[error("无法启动 {program}: {source}")]
    Spawn {
        /// 程序名或路径.
        program: String,

        /// 底层错误.
        source: io::Error,
    },

    /// 外部程序以非零状态退出.
    #[error("{program} 执行失败 ({status})")]
    Failed {
        /// 程序名或路径.
        program: String,

        /// 退出状态.
        status: ExitStatus,
    },

    /// 外部程序正常退出, 但没有生成预期的文件.
    #[error("未找到预期的输出文件 {}", .0.display())]
    MissingOutput(PathBuf),

    /// 写入 transformix 点输入文件失败.
    #[error("写入点输入文件失败: {0}")]
    Points(#[from] crate::landmark::LandmarkError),
}
