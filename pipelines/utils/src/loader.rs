//! 对 `lung-berry::dataset` 的更一层封装. 提供路径与外部程序的配置项.

use std::env;
use std::path::{Path, PathBuf};

use lung_berry::dataset;

/// 数据集根目录的环境变量.
pub const DATA_DIR_ENV: &str = "COPD_DATA_DIR";

/// elastix 可执行文件的环境变量.
pub const ELASTIX_ENV: &str = "ELASTIX_BIN";

/// transformix 可执行文件的环境变量.
pub const TRANSFORMIX_ENV: &str = "TRANSFORMIX_BIN";

/// elastix 参数文件的环境变量.
pub const PARAMS_ENV: &str = "ELASTIX_PARAMS";

/// 获取 DIR-Lab COPD 数据集根目录.
///
/// 1. 若 `explicit` 非空, 则返回其值;
/// 2. 若环境变量 `$COPD_DATA_DIR` 非空, 则返回其值;
/// 3. 否则, 返回 `$HOME/dataset/copd`. 无法确定用户主目录时返回 `None`.
pub fn copd_dir_or_home(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    match env::var_os(DATA_DIR_ENV) {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_copd_dir(),
    }
}
