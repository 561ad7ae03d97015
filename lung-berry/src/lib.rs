#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 DIR-Lab COPD 吸气/呼气 CT 配对的肺部掩膜提取, elastix / transformix
//! 调用适配, 点变换结果解析以及目标配准误差 (TRE) 计算.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据一律按 `(z, h, w)` 组织, 标志点一律按 `[x, y, z]` 组织.
//!   二者之间的换算为 `x = w`, `y = h`.
//! 2. 配准本身由外部 elastix 程序完成, 该 crate 不实现任何形变模型.
//!
//! # 功能
//!
//! ### 肺部掩膜提取 ✅
//!
//! 阈值化, 6-邻接连通分量标记, 保留最大的两个分量, 立方体闭运算.
//!
//! 实现位于 `lung-berry/src/data/morph_3d`.
//!
//! ### elastix / transformix 适配 ✅
//!
//! 拼装命令行并检查退出状态和输出文件.
//!
//! 实现位于 `lung-berry/src/elastix`.
//!
//! ### 标志点读写与点变换结果解析 ✅
//!
//! 实现位于 `lung-berry/src/landmark`.
//!
//! ### TRE ✅
//!
//! 实现位于 `lung-berry/src/tre.rs`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D CT nii 文件基础数据结构.
mod data;

pub use data::{CtScan, LungMask, NiftiHeaderAttr, ThresholdWindow, VolumeError, VolumeResult};

#[cfg(feature = "rayon")]
pub use data::par_refined_lung_masks;

pub use data::morph_3d;

pub mod consts;

pub mod dataset;

pub mod elastix;

pub mod landmark;

pub mod tre;

pub mod prelude;
