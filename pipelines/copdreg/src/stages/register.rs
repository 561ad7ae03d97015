//! elastix 配准与 transformix 点变换.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Args;
use log::info;
use lung_berry::dataset::{CopdCase, Phase};
use lung_berry::elastix::RegistrationJob;

use super::{default_registration_dir, transformed_points_dir, DatasetArgs, ToolArgs};

/// 一次配准的产物.
#[derive(Debug, Clone)]
pub struct Registered {
    /// elastix 生成的 `TransformParameters.0.txt`.
    pub transform_parameters: PathBuf,

    /// transformix 生成的 `outputpoints.txt`.
    pub output_points: PathBuf,
}

/// 以吸气 CT 为固定图像, 呼气 CT 为浮动图像配准病例 `case`,
/// 再用得到的变换把吸气参考标志点变换到 `out/transformed_points` 下.
///
/// 两个相位的掩膜必须已经由掩膜阶段生成.
pub fn register_case(case: &CopdCase, tools: &ToolArgs, out: &Path) -> Result<Registered> {
    let fixed_mask = case.mask_path(Phase::Inhale);
    ensure!(
        fixed_mask.is_file(),
        "缺少固定图像掩膜 {}, 请先运行 mask 子命令",
        fixed_mask.display()
    );

    let landmarks = case
        .load_landmarks(Phase::Inhale)
        .with_context(|| format!("读取标志点失败: {}", case.landmarks_path(Phase::Inhale).display()))?;

    let mut job = RegistrationJob::new(
        case.scan_path(Phase::Inhale),
        case.scan_path(Phase::Exhale),
        fixed_mask,
        &tools.params,
        out,
    );
    if !tools.no_moving_mask {
        job = job.with_moving_mask(case.mask_path(Phase::Exhale));
    }

    info!("copd{}: registering exhale onto inhale", case.id());
    let transform_parameters = tools
        .elastix()
        .register(&job)
        .with_context(|| format!("copd{} 配准失败", case.id()))?;

    let points_dir = transformed_points_dir(out);
    let output_points = tools
        .transformix()
        .transform_landmarks(&landmarks, &transform_parameters, &points_dir)
        .with_context(|| format!("copd{} 点变换失败", case.id()))?;
    info!(
        "copd{}: {} landmarks transformed -> {}",
        case.id(),
        landmarks.len(),
        output_points.display()
    );

    Ok(Registered {
        transform_parameters,
        output_points,
    })
}

/// 调用 elastix 配准一个病例, 并用 transformix 变换其吸气参考标志点.
#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    #[command(flatten)]
    tools: ToolArgs,

    /// 病例编号.
    #[arg(long, short = 'c')]
    case: u32,

    /// 配准输出目录, 缺省为 `{病例目录}/registration`.
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

impl RegisterArgs {
    pub fn run(self) -> Result<()> {
        let case = self.dataset.case(self.case)?;
        let out = self.out.unwrap_or_else(|| default_registration_dir(&case));
        let r = register_case(&case, &self.tools, &out)?;
        println!("{}", r.transform_parameters.display());
        println!("{}", r.output_points.display());
        Ok(())
    }
}
