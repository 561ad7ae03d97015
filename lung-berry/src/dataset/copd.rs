//! DIR-Lab COPD 数据集布局与加载器.
//!
//! 每个病例 `n` 的文件位于 `{root}/copd{n}/copd{n}/` 下:
//!
//! | 内容         | 吸气 (inhale)                | 呼气 (exhale)                |
//! |--------------|------------------------------|------------------------------|
//! | CT 扫描      | `copd{n}_iBHCT.nii.gz`       | `copd{n}_eBHCT.nii.gz`       |
//! | 标志点 (1 起) | `copd{n}_300_iBH_xyz_r1.txt` | `copd{n}_300_eBH_xyz_r1.txt` |
//! | 肺部掩膜     | `copd{n}_mask_iBHCT.nii`     | `copd{n}_mask_eBHCT.nii`     |

use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::{dirlab_copd_spacing, COPD_TRAINING_SET_LEN};
use crate::landmark::{IndexBase, LandmarkResult, LandmarkSet};
use crate::{CtScan, VolumeResult};

/// 屏气相位.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 吸气末屏气 (iBH).
    Inhale,

    /// 呼气末屏气 (eBH).
    Exhale,
}

impl Phase {
    /// 文件名中的相位标记.
    #[inline]
    pub fn tag(self) -> &'static str {
        match self {
            Phase::Inhale => "i",
            Phase::Exhale => "e",
        }
    }

    /// 两个相位.
    pub const BOTH: [Phase; 2] = [Phase::Inhale, Phase::Exhale];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Inhale => "inhale",
            Phase::Exhale => "exhale",
        })
    }
}

/// 单个 DIR-Lab COPD 病例的文件位置.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopdCase {
    id: u32,
    dir: PathBuf,
}

impl CopdCase {
    /// 数据集根目录 `root` 下的第 `id` 个病例 (从 1 开始).
    pub fn new<P: AsRef<Path>>(root: P, id: u32) -> Self {
        let name = format!("copd{id}");
        let dir = root.as_ref().join(&name).join(&name);
        Self { id, dir }
    }

    /// 病例编号.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// 病例文件所在目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// CT 扫描路径.
    pub fn scan_path(&self, phase: Phase) -> PathBuf {
        self.dir
            .join(format!("copd{}_{}BHCT.nii.gz", self.id, phase.tag()))
    }

    /// 参考标志点路径.
    pub fn landmarks_path(&self, phase: Phase) -> PathBuf {
        self.dir
            .join(format!("copd{}_300_{}BH_xyz_r1.txt", self.id, phase.tag()))
    }

    /// 肺部掩膜路径.
    pub fn mask_path(&self, phase: Phase) -> PathBuf {
        self.dir
            .join(format!("copd{}_mask_{}BHCT.nii", self.id, phase.tag()))
    }

    /// 读取 CT 扫描.
    #[inline]
    pub fn load_scan(&self, phase: Phase) -> VolumeResult<CtScan> {
        CtScan::open(self.scan_path(phase))
    }

    /// 读取参考标志点, 并转换为从 0 开始的体素坐标.
    #[inline]
    pub fn load_landmarks(&self, phase: Phase) -> LandmarkResult<LandmarkSet> {
        LandmarkSet::read(self.landmarks_path(phase), IndexBase::One)
    }

    /// 已知的体素分辨率 `[x, y, z]`. 训练集以外的病例返回 `None`.
    #[inline]
    pub fn known_spacing(&self) -> Option<[f64; 3]> {
        dirlab_copd_spacing(self.id)
    }
}

/// 从指定病例编号和数据集根目录创建 `phase` 相位的 CT 扫描加载器.
///
/// # 注意
///
/// `root` 必须是目录, 否则程序 panic.
pub fn case_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(
    ids: I,
    root: P,
    phase: Phase,
) -> CaseLoader {
    let root = root.as_ref().to_owned();
    assert!(root.is_dir());

    let mut ids: Vec<u32> = ids.into_iter().collect();
    ids.reverse();

    CaseLoader {
        root,
        phase,
        ids_rev: ids,
    }
}

/// 按编号顺序加载 DIR-Lab COPD 训练集全部病例 (`1..=4`) 的加载器.
///
/// # 注意
///
/// `root` 必须是目录, 否则程序 panic.
#[inline]
pub fn full_case_loader<P: AsRef<Path>>(root: P, phase: Phase) -> CaseLoader {
    case_loader(1..=COPD_TRAINING_SET_LEN, root, phase)
}

/// DIR-Lab COPD CT 扫描加载器.
#[derive(Debug)]
pub struct CaseLoader {
    root: PathBuf,
    phase: Phase,
    ids_rev: Vec<u32>,
}

impl Iterator for CaseLoader {
    type Item = (u32, VolumeResult<CtScan>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids_rev.pop()?;
        let data = CopdCase::new(&self.root, id).load_scan(self.phase);
        Some((id, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ids_rev.len(), Some(self.ids_rev.len()))
    }
}

impl ExactSizeIterator for CaseLoader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_layout() {
        let case = CopdCase::new("/data/copd", 3);
        assert_eq!(case.dir(), Path::new("/data/copd/copd3/copd3"));
        assert_eq!(
            case.scan_path(Phase::Inhale),
            Path::new("/data/copd/copd3/copd3/copd3_iBHCT.nii.gz")
        );
        assert_eq!(
            case.landmarks_path(Phase::Exhale),
            Path::new("/data/copd/copd3/copd3/copd3_300_eBH_xyz_r1.txt")
        );
        assert_eq!(
            case.mask_path(Phase::Exhale),
            Path::new("/data/copd/copd3/copd3/copd3_mask_eBHCT.nii")
        );
        assert_eq!(case.known_spacing(), Some([0.652, 0.652, 2.5]));
        assert_eq!(CopdCase::new("/x", 9).known_spacing(), None);
    }

    #[test]
    fn test_loader_reports_missing_files_in_order() {
        let root = std::env::temp_dir();
        let loader = case_loader([4, 2], &root, Phase::Exhale);
        assert_eq!(loader.len(), 2);
        let got: Vec<_> = loader.map(|(id, r)| (id, r.is_err())).collect();
        assert_eq!(got, [(4, true), (2, true)]);
        assert_eq!(full_case_loader(&root, Phase::Inhale).len(), 4);
    }
}
