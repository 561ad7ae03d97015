//! 流水线依赖的通用组件.

use std::io::{self, Write};

use log::LevelFilter;
use simple_logger::SimpleLogger;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 初始化全局日志. `RUST_LOG` 环境变量非空时优先使用其日志级别.
///
/// 重复初始化时返回 `Err`.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    SimpleLogger::new().with_level(level).env().init()?;
    log::debug!("日志已初始化, 可用核心数 {}", cpus());
    Ok(())
}
