//! 肺部掩膜生成.

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::info;
use lung_berry::consts::{COPD_CLOSING_SIZE, DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD};
use lung_berry::dataset::{CopdCase, Phase};
use lung_berry::morph_3d::MaskParams;

use super::DatasetArgs;

/// 为病例 `case` 的两个相位生成肺部掩膜, 返回 `[吸气, 呼气]` 掩膜的肺部体素数.
///
/// 掩膜写在 `out_dir` (缺省为病例目录) 下, 文件名同 [`CopdCase::mask_path`].
/// `npy` 为真时额外保存一份同名 `.npy`.
pub fn generate_masks(
    case: &CopdCase,
    params: &MaskParams,
    out_dir: Option<&Path>,
    npy: bool,
) -> Result<[usize; 2]> {
    let target = |phase: Phase| -> PathBuf {
        let default = case.mask_path(phase);
        match (out_dir, default.file_name()) {
            (Some(d), Some(name)) => d.join(name),
            _ => default,
        }
    };

    // 两个相位互不依赖, 各用一个线程.
    let [inhale, exhale] = thread::scope(|s| {
        Phase::BOTH
            .map(|phase| {
                let path = target(phase);
                s.spawn(move || one_phase(case, phase, params, &path, npy))
            })
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow!("掩膜线程异常退出")))
            })
    });
    Ok([inhale?, exhale?])
}

fn one_phase(
    case: &CopdCase,
    phase: Phase,
    params: &MaskParams,
    path: &Path,
    npy: bool,
) -> Result<usize> {
    let scan_path = case.scan_path(phase);
    let scan = case
        .load_scan(phase)
        .with_context(|| format!("读取 CT 失败: {}", scan_path.display()))?;
    let mask = scan
        .refined_lung_mask(params)
        .with_context(|| format!("copd{} {phase} 掩膜提取失败", case.id()))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("无法创建目录: {}", dir.display()))?;
    }
    mask.save(path)
        .with_context(|| format!("保存掩膜失败: {}", path.display()))?;
    if npy {
        let npy_path = path.with_extension("npy");
        mask.save_npy(&npy_path)
            .with_context(|| format!("保存掩膜失败: {}", npy_path.display()))?;
    }
    let count = mask.count();
    info!(
        "copd{} {phase}: {count} lung voxels -> {}",
        case.id(),
        path.display()
    );
    Ok(count)
}

/// 阈值分割 + 最大连通区域 + 闭运算, 生成吸气与呼气的肺部掩膜.
#[derive(Args, Debug)]
pub struct MaskArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// 病例编号.
    #[arg(long, short = 'c')]
    case: u32,

    /// 阈值下界 (含).
    #[arg(long, default_value_t = DEFAULT_LOWER_THRESHOLD)]
    lower: f32,

    /// 阈值上界 (含).
    #[arg(long, default_value_t = DEFAULT_UPPER_THRESHOLD)]
    upper: f32,

    /// 闭运算立方体结构元素的边长.
    #[arg(long, default_value_t = COPD_CLOSING_SIZE)]
    closing: usize,

    /// 掩膜输出目录, 缺省写回病例目录.
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// 额外保存 `.npy` 格式.
    #[arg(long)]
    npy: bool,
}

impl MaskArgs {
    pub fn run(self) -> Result<()> {
        let case = self.dataset.case(self.case)?;
        let params = MaskParams::new(self.lower, self.upper, self.closing)?;
        let [i, e] = generate_masks(&case, &params, self.out.as_deref(), self.npy)?;
        println!("copd{}: inhale {i} voxels, exhale {e} voxels", case.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lung_berry::{CtScan, LungMask};
    use ndarray::{s, Array3};

    fn fake_case(root: &Path) -> CopdCase {
        let case = CopdCase::new(root, 1);
        std::fs::create_dir_all(case.dir()).unwrap();
        for (phase, shift) in Phase::BOTH.into_iter().zip([0, 1]) {
            let mut data = Array3::from_elem((12, 12, 24), -1000.0f32);
            data.slice_mut(s![3..9, 3..9, 2 + shift..9 + shift]).fill(300.0);
            data.slice_mut(s![3..9, 3..9, 14..20]).fill(300.0);
            CtScan::fake(data, [0.625, 0.625, 2.5])
                .save(case.scan_path(phase))
                .unwrap();
        }
        case
    }

    #[test]
    fn test_generate_masks_for_both_phases() {
        let dir = tempfile::tempdir().unwrap();
        let case = fake_case(dir.path());
        let params = MaskParams::new(100.0, 500.0, 3).unwrap();

        let counts = generate_masks(&case, &params, None, false).unwrap();
        for (phase, count) in Phase::BOTH.into_iter().zip(counts) {
            let mask = LungMask::open(case.mask_path(phase)).unwrap();
            assert_eq!(mask.count(), count);
            assert_eq!(mask.component_count(), 2);
        }

        let out = dir.path().join("masks");
        generate_masks(&case, &params, Some(&out), true).unwrap();
        assert!(out.join("copd1_mask_iBHCT.nii").is_file());
        assert!(out.join("copd1_mask_eBHCT.npy").is_file());
    }

    #[test]
    fn test_missing_scan_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let case = CopdCase::new(dir.path(), 3);
        let err = generate_masks(&case, &MaskParams::copd(), None, false).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("copd3_iBHCT.nii.gz"), "{msg}");
    }
}
