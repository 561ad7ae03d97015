//! 解剖标志点 (landmark) 的文本读写.
//!
//! 标志点以 `(x, y, z)` 顺序保存, 每行一个点, 字段之间以空白字符 (空格或制表符)
//! 分隔. 文件中的坐标可能从 1 开始 (DIR-Lab 原始标注) 也可能从 0 开始,
//! 由 [`IndexBase`] 描述. 内存中的 [`LandmarkSet`] 总是从 0 开始计数.

use std::fmt::Write as _;
use std::fs;
use std::ops::Index;
use std::path::Path;

use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod error;
mod output;

pub use error::LandmarkError;
pub use output::{output_index_landmarks, parse_output_points, read_output_points, TransformedPoint};

/// 标志点读写运行时错误.
pub type LandmarkResult<T> = Result<T, LandmarkError>;

/// 单个标志点, 按 `[x, y, z]` 组织.
pub type Landmark = [f64; 3];

/// 标志点文件的计数起点.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IndexBase {
    /// 从 1 开始, 如 DIR-Lab 发布的 `*_xyz_r1.txt`.
    One,

    /// 从 0 开始, 与体素数组下标一致.
    #[default]
    Zero,
}

impl IndexBase {
    /// 该计数方式相对于 0 起点的偏移量.
    #[inline]
    pub fn offset(self) -> f64 {
        match self {
            IndexBase::One => 1.0,
            IndexBase::Zero => 0.0,
        }
    }
}

/// 有序的标志点集合. 坐标从 0 开始计数.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl Index<usize> for LandmarkSet {
    type Output = Landmark;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<T: IntoIterator<Item = Landmark>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a Landmark;
    type IntoIter = std::slice::Iter<'a, Landmark>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    #[inline]
    fn from(points: Vec<Landmark>) -> Self {
        Self { points }
    }
}

impl LandmarkSet {
    /// 标志点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否不含任何标志点?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 所有标志点.
    #[inline]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// 按顺序迭代所有标志点.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Landmark> {
        self.points.iter()
    }

    /// 追加一个标志点.
    #[inline]
    pub fn push(&mut self, p: Landmark) {
        self.points.push(p);
    }

    /// 从文本解析标志点, 并按 `base` 转换为从 0 开始的坐标.
    ///
    /// 空行被跳过. 其它行必须恰好包含三个数值字段, 否则返回
    /// `Err(LandmarkError::Malformed)`.
    pub fn parse(text: &str, base: IndexBase) -> LandmarkResult<Self> {
        let offset = base.offset();
        let mut points = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let malformed = || LandmarkError::Malformed {
                line: i + 1,
                content: line.to_string(),
            };
            let (x, y, z) = trimmed
                .split_whitespace()
                .map(|f| f.parse::<f64>())
                .collect_tuple()
                .ok_or_else(malformed)?;
            match (x, y, z) {
                (Ok(x), Ok(y), Ok(z)) if [x, y, z].iter().all(|v| v.is_finite()) => {
                    points.push([x - offset, y - offset, z - offset]);
                }
                _ => return Err(malformed()),
            }
        }
        Ok(Self { points })
    }

    /// 读取标志点文件. 见 [`LandmarkSet::parse`].
    pub fn read<P: AsRef<Path>>(path: P, base: IndexBase) -> LandmarkResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text, base)
    }

    /// 以 `base` 计数方式, 将标志点格式化为 `x y z` 行.
    ///
    /// 整数坐标不带小数部分输出.
    pub fn to_text(&self, base: IndexBase) -> String {
        let offset = base.offset();
        let mut out = String::with_capacity(self.len() * 16);
        for [x, y, z] in self.iter() {
            // 写入 `String` 不会失败.
            let _ = writeln!(out, "{} {} {}", x + offset, y + offset, z + offset);
        }
        out
    }

    /// 以 `base` 计数方式写入 `x y z` 文本文件.
    pub fn write<P: AsRef<Path>>(&self, path: P, base: IndexBase) -> LandmarkResult<()> {
        fs::write(path.as_ref(), self.to_text(base))?;
        Ok(())
    }

    /// 写入 transformix 的点输入文件 (`index` 模式).
    ///
    /// 格式为 `index`, 点个数, 以及从 0 开始的 `x y z` 行.
    pub fn write_transformix<P: AsRef<Path>>(&self, path: P) -> LandmarkResult<()> {
        let mut text = format!("index\n{}\n", self.len());
        text.push_str(&self.to_text(IndexBase::Zero));
        fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// 将体素坐标按 `spacing` (`[x, y, z]`, 毫米) 换算为物理坐标.
    pub fn scaled(&self, [sx, sy, sz]: [f64; 3]) -> Self {
        self.iter().map(|[x, y, z]| [x * sx, y * sy, z * sz]).collect()
    }

    /// 检查两组标志点个数一致且非空.
    pub fn check_paired(&self, other: &LandmarkSet) -> LandmarkResult<()> {
        if self.len() != other.len() {
            return Err(LandmarkError::ShapeMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        if self.is_empty() {
            return Err(LandmarkError::Empty);
        }
        Ok(())
    }
}
