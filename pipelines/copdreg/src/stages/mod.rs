//! 流水线各阶段及其子命令参数.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use lung_berry::dataset::CopdCase;
use lung_berry::elastix::{Elastix, Transformix, DEFAULT_ELASTIX, DEFAULT_TRANSFORMIX};
use lung_berry::landmark::IndexBase;
use utils::loader::{self, DATA_DIR_ENV, ELASTIX_ENV, PARAMS_ENV, TRANSFORMIX_ENV};

pub mod mask;
pub mod points;
pub mod register;
pub mod tre;

/// 配准输出目录名 (位于病例目录下).
pub const REGISTRATION_DIR: &str = "registration";

/// transformix 输出目录名 (位于配准输出目录下).
pub const TRANSFORMED_POINTS_DIR: &str = "transformed_points";

/// 数据集位置.
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// DIR-Lab COPD 数据集根目录. 缺省时使用 `$HOME/dataset/copd`.
    #[arg(long = "data-dir", short = 'D', env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,
}

impl DatasetArgs {
    /// 数据集根目录.
    pub fn root(&self) -> Result<PathBuf> {
        loader::copd_dir_or_home(self.data_dir.as_deref())
            .ok_or_else(|| anyhow!("无法确定数据集目录, 请设置 --data-dir 或 ${DATA_DIR_ENV}"))
    }

    /// 第 `id` 个病例.
    pub fn case(&self, id: u32) -> Result<CopdCase> {
        Ok(CopdCase::new(self.root()?, id))
    }
}

/// 外部配准程序.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// elastix 可执行文件.
    #[arg(long, env = ELASTIX_ENV, default_value = DEFAULT_ELASTIX)]
    pub elastix: PathBuf,

    /// transformix 可执行文件.
    #[arg(long, env = TRANSFORMIX_ENV, default_value = DEFAULT_TRANSFORMIX)]
    pub transformix: PathBuf,

    /// elastix 参数文件.
    #[arg(long = "params", short = 'p', env = PARAMS_ENV)]
    pub params: PathBuf,

    /// 不向 elastix 传入浮动图像掩膜.
    #[arg(long = "no-moving-mask")]
    pub no_moving_mask: bool,
}

impl ToolArgs {
    /// elastix 程序.
    #[inline]
    pub fn elastix(&self) -> Elastix {
        Elastix::new(&self.elastix)
    }

    /// transformix 程序.
    #[inline]
    pub fn transformix(&self) -> Transformix {
        Transformix::new(&self.transformix)
    }
}

/// 标志点文件的计数起点.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Base {
    /// 从 1 开始.
    One,
    /// 从 0 开始.
    Zero,
}

impl From<Base> for IndexBase {
    #[inline]
    fn from(b: Base) -> Self {
        match b {
            Base::One => IndexBase::One,
            Base::Zero => IndexBase::Zero,
        }
    }
}

/// 病例 `case` 的默认配准输出目录.
#[inline]
pub fn default_registration_dir(case: &CopdCase) -> PathBuf {
    case.dir().join(REGISTRATION_DIR)
}

/// 配准输出目录 `out` 下的 transformix 输出目录.
#[inline]
pub fn transformed_points_dir(out: &Path) -> PathBuf {
    out.join(TRANSFORMED_POINTS_DIR)
}
