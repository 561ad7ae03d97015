//! 通用常量.

/// 掩膜体素值.
pub mod gray {
    /// 掩膜中背景的体素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 掩膜中肺部 (前景) 的体素值.
    pub const MASK_LUNG: u8 = 1;

    /// 体素是否是肺部?
    #[inline]
    pub const fn is_lung(p: u8) -> bool {
        matches!(p, MASK_LUNG)
    }

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }

    /// 将二值判定结果转换为掩膜体素值.
    #[inline]
    pub const fn from_flag(flag: bool) -> u8 {
        if flag {
            MASK_LUNG
        } else {
            MASK_BACKGROUND
        }
    }
}

/// 掩膜提取时保留的最大连通分量个数 (左肺 + 右肺).
pub const LUNG_COMPONENTS: usize = 2;

/// 默认阈值下限.
///
/// DIR-Lab COPD 扫描以 `HU + 1024` 的偏移存储, 因此 `[100, 500]`
/// 大致对应 `[-924, -524]` HU 的肺实质.
pub const DEFAULT_LOWER_THRESHOLD: f32 = 100.0;

/// 默认阈值上限.
pub const DEFAULT_UPPER_THRESHOLD: f32 = 500.0;

/// 默认闭运算立方体核边长.
pub const DEFAULT_CLOSING_SIZE: usize = 5;

/// COPD 流程中实际使用的闭运算立方体核边长.
pub const COPD_CLOSING_SIZE: usize = 7;

/// 每个 DIR-Lab COPD 病例标注的标志点个数.
pub const COPD_LANDMARK_COUNT: usize = 300;

/// 已知的 DIR-Lab COPD 训练病例数.
pub const COPD_TRAINING_SET_LEN: u32 = 4;

/// DIR-Lab COPD 训练病例 1..=4 的体素间距 `[x, y, z]`, 以毫米为单位.
pub const DIRLAB_COPD_SPACINGS: [[f64; 3]; COPD_TRAINING_SET_LEN as usize] = [
    [0.625, 0.625, 2.5],
    [0.645, 0.645, 2.5],
    [0.652, 0.652, 2.5],
    [0.590, 0.590, 2.5],
];

/// 获取病例 `id` (从 1 开始) 的体素间距. 未知病例返回 `None`.
#[inline]
pub fn dirlab_copd_spacing(id: u32) -> Option<[f64; 3]> {
    let index = id.checked_sub(1)?;
    DIRLAB_COPD_SPACINGS.get(index as usize).copied()
}

/// elastix 在输出目录中生成的变换参数文件名.
pub const TRANSFORM_PARAMETERS_FILE: &str = "TransformParameters.0.txt";

/// transformix 在输出目录中生成的点变换结果文件名.
pub const OUTPUT_POINTS_FILE: &str = "outputpoints.txt";
