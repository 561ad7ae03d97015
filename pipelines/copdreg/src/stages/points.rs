//! 提取 transformix 输出中的 `OutputIndexFixed`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use lung_berry::landmark::{output_index_landmarks, read_output_points, IndexBase, LandmarkSet};

use super::Base;

/// 读取 `output_points` 中每个点的 `OutputIndexFixed`, 作为从 0 开始的体素坐标.
pub fn moved_landmarks(output_points: &Path) -> Result<LandmarkSet> {
    let records = read_output_points(output_points)
        .with_context(|| format!("解析点变换结果失败: {}", output_points.display()))?;
    let moved = output_index_landmarks(&records, IndexBase::Zero);
    info!(
        "{} transformed points read from {}",
        moved.len(),
        output_points.display()
    );
    Ok(moved)
}

/// 将 transformix 的 `outputpoints.txt` 转为 `x y z` 文本.
#[derive(Args, Debug)]
pub struct PointsArgs {
    /// transformix 输出的 `outputpoints.txt`.
    input: PathBuf,

    /// 输出文本文件.
    #[arg(long, short = 'o')]
    out: PathBuf,

    /// 输出坐标的计数起点.
    #[arg(long, value_enum, default_value_t = Base::Zero)]
    base: Base,
}

impl PointsArgs {
    pub fn run(self) -> Result<()> {
        let moved = moved_landmarks(&self.input)?;
        moved
            .write(&self.out, self.base.into())
            .with_context(|| format!("写出标志点失败: {}", self.out.display()))?;
        println!("{} points -> {}", moved.len(), self.out.display());
        Ok(())
    }
}
