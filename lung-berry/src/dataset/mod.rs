//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod copd;

pub use copd::{case_loader, full_case_loader, CaseLoader, CopdCase, Phase};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 获取 DIR-Lab COPD 数据集的默认根目录 `{用户主目录}/dataset/copd`.
#[inline]
pub fn home_copd_dir() -> Option<PathBuf> {
    home_dataset_dir_with(["copd"])
}
