//! 配准前后的目标配准误差.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use log::{debug, info};
use lung_berry::consts::OUTPUT_POINTS_FILE;
use lung_berry::dataset::{CopdCase, Phase};
use lung_berry::landmark::{IndexBase, LandmarkSet};
use lung_berry::tre::TreReport;
use lung_berry::NiftiHeaderAttr;

use super::{default_registration_dir, points, transformed_points_dir, Base, DatasetArgs};

/// 病例 `case` 的体素分辨率 `[x, y, z]`.
///
/// 依次取 `explicit`, 已知的数据集分辨率, 吸气 CT 头信息.
pub fn case_spacing(case: &CopdCase, explicit: Option<[f64; 3]>) -> Result<[f64; 3]> {
    if let Some(s) = explicit.or_else(|| case.known_spacing()) {
        return Ok(s);
    }
    let scan = case
        .load_scan(Phase::Inhale)
        .with_context(|| format!("读取 CT 失败: {}", case.scan_path(Phase::Inhale).display()))?;
    let s = scan.spacing_xyz();
    debug!("copd{}: spacing {s:?} taken from header", case.id());
    Ok(s)
}

/// 两组体素坐标标志点在 `spacing` 下的 TRE.
pub fn tre_in_mm(a: &LandmarkSet, b: &LandmarkSet, spacing: [f64; 3]) -> Result<TreReport> {
    Ok(TreReport::new(&a.scaled(spacing), &b.scaled(spacing))?)
}

/// 配准前: 吸气参考点与呼气参考点之间的 TRE.
pub fn tre_before(case: &CopdCase, spacing: [f64; 3]) -> Result<TreReport> {
    let [inhale, exhale] = Phase::BOTH.map(|p| {
        case.load_landmarks(p)
            .with_context(|| format!("读取标志点失败: {}", case.landmarks_path(p).display()))
    });
    tre_in_mm(&inhale?, &exhale?, spacing)
}

/// 配准后: 变换后的吸气参考点 `moved` 与呼气参考点之间的 TRE.
pub fn tre_after(case: &CopdCase, moved: &LandmarkSet, spacing: [f64; 3]) -> Result<TreReport> {
    let exhale = case
        .load_landmarks(Phase::Exhale)
        .with_context(|| format!("读取标志点失败: {}", case.landmarks_path(Phase::Exhale).display()))?;
    tre_in_mm(moved, &exhale, spacing)
}

/// 计算一个病例配准前后的 TRE.
#[derive(Args, Debug)]
pub struct TreArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// 病例编号.
    #[arg(long, short = 'c')]
    case: u32,

    /// 变换后的标志点. 以 `.txt` 结尾的 `x y z` 文本, 或 transformix 的
    /// `outputpoints.txt`. 缺省为默认配准目录下的点变换结果.
    #[arg(long, short = 'm')]
    moved: Option<PathBuf>,

    /// `--moved` 为 `x y z` 文本时的计数起点.
    #[arg(long, value_enum, default_value_t = Base::Zero)]
    moved_base: Base,

    /// 体素分辨率 `x,y,z` (毫米).
    #[arg(long, value_delimiter = ',')]
    spacing: Option<Vec<f64>>,
}

impl TreArgs {
    fn explicit_spacing(&self) -> Result<Option<[f64; 3]>> {
        match self.spacing.as_deref() {
            None => Ok(None),
            Some(&[x, y, z]) => Ok(Some([x, y, z])),
            Some(other) => bail!("--spacing 需要 3 个分量, 实际为 {}", other.len()),
        }
    }

    fn load_moved(&self, case: &CopdCase) -> Result<LandmarkSet> {
        let path = self.moved.clone().unwrap_or_else(|| {
            transformed_points_dir(&default_registration_dir(case)).join(OUTPUT_POINTS_FILE)
        });
        let is_transformix = path
            .file_name()
            .is_some_and(|n| n == OUTPUT_POINTS_FILE);
        if is_transformix {
            points::moved_landmarks(&path)
        } else {
            let base: IndexBase = self.moved_base.into();
            LandmarkSet::read(&path, base)
                .with_context(|| format!("读取标志点失败: {}", path.display()))
        }
    }

    pub fn run(self) -> Result<()> {
        let case = self.dataset.case(self.case)?;
        let spacing = case_spacing(&case, self.explicit_spacing()?)?;
        info!("copd{}: spacing {spacing:?}", case.id());
        let before = tre_before(&case, spacing)?;
        let moved = self.load_moved(&case)?;
        let after = tre_after(&case, &moved, spacing)?;
        println!("copd{} before: {before}", case.id());
        println!("copd{} after:  {after}", case.id());
        Ok(())
    }
}
