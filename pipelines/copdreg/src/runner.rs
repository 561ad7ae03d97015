//! 程序运行函数.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Args;
use log::{info, warn};
use lung_berry::consts::{
    COPD_CLOSING_SIZE, COPD_TRAINING_SET_LEN, DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD,
};
use lung_berry::dataset::CopdCase;
use lung_berry::morph_3d::MaskParams;

use crate::profile::Profile;
use crate::result::{CaseOutcome, RunSummary};
use crate::stages::{self, mask, points, register, tre, DatasetArgs, ToolArgs};

/// 为病例 `case` 依次运行掩膜, 配准, 点提取与 TRE 四个阶段.
///
/// 配准结果写在 `out_root/copd{n}` 下; `out_root` 缺省时写在病例目录的默认位置.
pub fn run_case(
    case: &CopdCase,
    params: &MaskParams,
    tools: &ToolArgs,
    out_root: Option<&Path>,
) -> Result<CaseOutcome> {
    let mut profile = Profile::new();
    let out = match out_root {
        Some(root) => root.join(format!("copd{}", case.id())),
        None => stages::default_registration_dir(case),
    };

    let mask_voxels = profile.time("mask", || mask::generate_masks(case, params, None, false))?;
    let registered = profile.time("register", || register::register_case(case, tools, &out))?;
    let moved = profile.time("points", || points::moved_landmarks(&registered.output_points))?;
    let (before, after) = profile.time("tre", || -> Result<_> {
        let spacing = tre::case_spacing(case, None)?;
        Ok((
            tre::tre_before(case, spacing)?,
            tre::tre_after(case, &moved, spacing)?,
        ))
    })?;

    info!("copd{} before: {before}", case.id());
    info!("copd{} after:  {after}", case.id());
    if after.mean() > before.mean() {
        warn!("copd{}: TRE grew after registration", case.id());
    }

    Ok(CaseOutcome {
        id: case.id(),
        mask_voxels,
        before,
        after,
        profile: profile.finish(),
    })
}

/// 实际运行.
pub fn run(
    dataset: &DatasetArgs,
    ids: &[u32],
    params: &MaskParams,
    tools: &ToolArgs,
    out_root: Option<&Path>,
) -> Result<RunSummary> {
    let root = dataset.root()?;
    ensure!(root.is_dir(), "数据集目录不存在: {}", root.display());

    println!("Registering {} case(s)...", ids.len());
    ids.iter()
        .map(|&id| {
            let case = CopdCase::new(&root, id);
            run_case(&case, params, tools, out_root).with_context(|| format!("copd{id} 运行失败"))
        })
        .collect()
}

/// 依次对多个病例运行全部阶段.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    #[command(flatten)]
    tools: ToolArgs,

    /// 病例编号, 缺省为全部训练集病例.
    #[arg(long = "case", short = 'c', value_delimiter = ',')]
    cases: Vec<u32>,

    /// 闭运算立方体结构元素的边长.
    #[arg(long, default_value_t = COPD_CLOSING_SIZE)]
    closing: usize,

    /// 配准输出根目录, 每个病例写入其下的 `copd{n}`.
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let ids: Vec<u32> = if self.cases.is_empty() {
            (1..=COPD_TRAINING_SET_LEN).collect()
        } else {
            self.cases
        };
        let params = MaskParams::new(DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD, self.closing)?;
        let summary = run(&self.dataset, &ids, &params, &self.tools, self.out.as_deref())?;
        summary.analyze()?;
        Ok(())
    }
}
