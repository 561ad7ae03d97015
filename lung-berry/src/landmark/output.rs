//! transformix `outputpoints.txt` 解析.
//!
//! 每条记录占一行, 形如
//!
//! ```text
//! Point	0	; InputIndex = [ 95 138 49 ]	; InputPoint = [ 59.375 86.25 122.5 ]	; OutputIndexFixed = [ 94 137 50 ]	; ...
//! ```
//!
//! 即以 `;` 分隔的若干 `名称 = [ v v v ]` 字段. 字段按名称定位, 与列宽无关.

use std::fs;
use std::path::Path;

use itertools::Itertools;

use super::{IndexBase, Landmark, LandmarkError, LandmarkResult, LandmarkSet};

/// 记录中必须出现的字段名.
const OUTPUT_INDEX_FIXED: &str = "OutputIndexFixed";

/// `outputpoints.txt` 中的一条点变换记录.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformedPoint {
    /// `Point` 序号.
    pub index: Option<usize>,

    /// 输入点的体素下标.
    pub input_index: Option<Landmark>,

    /// 输入点的物理坐标.
    pub input_point: Option<Landmark>,

    /// 变换后在固定图像中的体素下标.
    pub output_index_fixed: Landmark,

    /// 变换后的物理坐标.
    pub output_point: Option<Landmark>,

    /// 形变向量.
    pub deformation: Option<Landmark>,
}

/// 解析 `[ a b c ]` 形式的三元向量.
fn parse_vector(raw: &str) -> Result<Landmark, String> {
    let inner = raw
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("字段值 {raw:?} 缺少方括号"))?;
    let (x, y, z) = inner
        .split_whitespace()
        .map(|f| f.parse::<f64>().map_err(|e| format!("{f:?}: {e}")))
        .collect_tuple()
        .ok_or_else(|| format!("字段值 {raw:?} 不是三元向量"))?;
    Ok([x?, y?, z?])
}

/// 解析一条记录行. `line_no` 从 1 开始, 仅用于报错.
fn parse_record(line: &str, line_no: usize) -> LandmarkResult<TransformedPoint> {
    let bad = |reason: String| LandmarkError::BadRecord {
        line: line_no,
        reason,
    };

    let mut index = None;
    let mut input_index = None;
    let mut input_point = None;
    let mut output_index_fixed = None;
    let mut output_point = None;
    let mut deformation = None;

    for field in line.split(';').map(str::trim).filter(|f| !f.is_empty()) {
        let Some((name, value)) = field.split_once('=') else {
            // `Point <n>` 段没有等号.
            let mut parts = field.split_whitespace();
            if parts.next() == Some("Point") {
                index = parts.next().and_then(|n| n.parse().ok());
            }
            continue;
        };
        let slot = match name.trim() {
            "InputIndex" => &mut input_index,
            "InputPoint" => &mut input_point,
            OUTPUT_INDEX_FIXED => &mut output_index_fixed,
            "OutputPoint" => &mut output_point,
            "Deformation" => &mut deformation,
            _ => continue,
        };
        *slot = Some(parse_vector(value).map_err(|e| bad(format!("{}: {e}", name.trim())))?);
    }

    let output_index_fixed =
        output_index_fixed.ok_or_else(|| bad(format!("缺少 {OUTPUT_INDEX_FIXED} 字段")))?;
    Ok(TransformedPoint {
        index,
        input_index,
        input_point,
        output_index_fixed,
        output_point,
        deformation,
    })
}

/// 解析 `outputpoints.txt` 文本.
///
/// 不含 `OutputIndexFixed` 的行被忽略; 含有该名称但字段不合法的行返回
/// `Err(LandmarkError::BadRecord)`.
pub fn parse_output_points(text: &str) -> LandmarkResult<Vec<TransformedPoint>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.contains(OUTPUT_INDEX_FIXED))
        .map(|(i, line)| parse_record(line, i + 1))
        .collect()
}

/// 读取并解析 `outputpoints.txt`.
pub fn read_output_points<P: AsRef<Path>>(path: P) -> LandmarkResult<Vec<TransformedPoint>> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_output_points(&text)
}

/// 提取所有记录的 `OutputIndexFixed`, 以 `base` 计数方式返回.
///
/// `IndexBase::One` 时每个分量加 1, 对应 DIR-Lab 提交格式.
pub fn output_index_landmarks(points: &[TransformedPoint], base: IndexBase) -> LandmarkSet {
    let offset = base.offset();
    points
        .iter()
        .map(|p| p.output_index_fixed.map(|v| v + offset))
        .collect()
}
