use std::ops::Index;
use std::path::Path;

use log::debug;
use ndarray::{Array3, ArrayD, ArrayView3, Ix3};
use ndarray_npy::WriteNpyError;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use thiserror::Error;

use crate::consts::gray::*;
use crate::landmark::{Landmark, LandmarkSet};
use crate::Idx3d;

pub mod morph_3d;
pub mod window;

use morph_3d::{count_components, refine_lung_mask, MaskParams, MaskResult};

pub use window::ThresholdWindow;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 体数据读写的运行时错误.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// nifti 文件读写失败.
    #[error("nifti 读写失败: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// npy 文件写入失败.
    #[error("npy 写入失败: {0}")]
    Npy(#[from] WriteNpyError),

    /// 数据形状不合法.
    #[error("数据形状不合法: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 文件中的数据不是三维体数据. 参数为实际维数.
    #[error("期望三维体数据, 实际为 {0} 维")]
    NotVolume(usize),
}

/// 体数据读写运行时错误.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 读取 nifti 文件, 返回 header 与按 `(z, h, w)` 组织的 `f32` 数据.
fn read_volume(path: &Path) -> VolumeResult<(BoxedHeader, Array3<f32>)> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = Box::new(obj.header().clone());

    let data: ArrayD<f32> = obj.into_volume().into_ndarray::<f32>()?;
    if data.ndim() != 3 {
        return Err(VolumeError::NotVolume(data.ndim()));
    }

    // [W, H, z] -> [z, H, W].
    // hint: 原第一维向下增长, 原第二维向右增长.
    let data = data.into_dimensionality::<Ix3>()?.permuted_axes([2, 1, 0]);
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().to_owned()
    };
    debug!("读取 {}: 形状 {:?}", path.display(), data.dim());
    Ok((header, data))
}

/// 写出时使用的 header: 沿用空间信息, 不再做强度缩放.
fn writer_header(header: &NiftiHeader) -> NiftiHeader {
    let mut header = header.clone();
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header
}

/// 以 `$header` 为参考, 将 `(z, h, w)` 组织的 `$data` 写回 nifti 文件.
/// 文件名以 `.gz` 结尾时写出压缩文件.
macro_rules! write_volume {
    ($path: expr, $header: expr, $data: expr) => {{
        let path: &Path = $path;
        let header = writer_header($header);
        // [z, H, W] -> [W, H, z].
        let xyz = $data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path)
            .reference_header(&header)
            .write_nifti(&xyz)?;
        debug!("写入 {}: 形状 {:?}", path.display(), $data.dim());
        Ok(())
    }};
}

/// 3D 体数据 nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小, 按 `(z, h, w)` 组织.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高 (自然图像的垂直方向), 宽 (自然图像的水平方向).
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取 `[x, y, z]` 顺序的体素分辨率, 与标志点坐标顺序一致.
    #[inline]
    fn spacing_xyz(&self) -> [f64; 3] {
        let [z, h, w] = self.pix_dim();
        [w, h, z]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// qform 平移量 `[x, y, z]`, 以毫米为单位.
    #[inline]
    fn origin(&self) -> [f64; 3] {
        let h = self.header();
        [h.quatern_x as f64, h.quatern_y as f64, h.quatern_z as f64]
    }
}

/// 根据 `(z, h, w)` 组织的数据和 `[x, y, z]` 体素分辨率构造一个最简 header.
fn synthetic_header((z, h, w): Idx3d, [sx, sy, sz]: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
    header.pixdim = [1.0, sx, sy, sz, 1.0, 1.0, 1.0, 1.0];
    header.qform_code = 1;
    header.intent_name[..4].copy_from_slice(b"fake");
    header
}

/// nii 格式 3D CT 扫描, 包括 header 和强度值. 强度值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for CtScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtScan {
    /// 打开 nii (或 nii.gz) 文件格式的 3D CT 扫描. `path` 为文件的本地路径.
    pub fn open<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let (header, data) = read_volume(path.as_ref())?;
        Ok(Self { header, data })
    }

    /// 根据 `(z, h, w)` 组织的强度数据和 `[x, y, z]` 体素分辨率直接创建扫描.
    ///
    /// # 注意
    ///
    /// 生成的 header 只包含形状与分辨率, 你应仅将其用于实验目的.
    pub fn fake(data: Array3<f32>, spacing_xyz: [f32; 3]) -> Self {
        let header = synthetic_header(data.dim(), spacing_xyz);
        Self { header, data }
    }

    /// 以 `header` 为空间信息, 使用 `(z, h, w)` 组织的数据创建扫描.
    ///
    /// `data` 与 `header` 形状不一致时返回 `Err`.
    pub fn with_header(header: &NiftiHeader, data: Array3<f32>) -> VolumeResult<Self> {
        check_header_shape(header, data.dim())?;
        Ok(Self {
            header: Box::new(header.clone()),
            data,
        })
    }

    /// 判断该结构是否是由 `fake` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 以 `header` 为参考写出 nifti 文件.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        write_volume!(path.as_ref(), &self.header, self.data)
    }

    /// 提取精化的肺部掩膜. 掩膜沿用本扫描的 header.
    pub fn refined_lung_mask(&self, params: &MaskParams) -> MaskResult<LungMask> {
        let data = refine_lung_mask(self.data.view(), params)?;
        Ok(LungMask {
            header: self.header.clone(),
            data,
        })
    }
}

#[inline]
fn check_header_shape(header: &NiftiHeader, shape: Idx3d) -> VolumeResult<()> {
    if get_shape_from_header(header) == shape {
        Ok(())
    } else {
        Err(VolumeError::Shape(ndarray::ShapeError::from_kind(
            ndarray::ErrorKind::IncompatibleShape,
        )))
    }
}

/// nii 格式 3D 二值肺部掩膜, 包括 header 和掩膜体素.
///
/// 体素只取 [`MASK_BACKGROUND`] 或 [`MASK_LUNG`].
#[derive(Debug, Clone, PartialEq)]
pub struct LungMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for LungMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for LungMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LungMask {
    /// 打开 nii 文件格式的掩膜. 任何非零体素都被视为肺部.
    pub fn open<P: AsRef<Path>>(path: P) -> VolumeResult<Self> {
        let (header, data) = read_volume(path.as_ref())?;
        let data = data.mapv(|v| from_flag(v != 0.0));
        Ok(Self { header, data })
    }

    /// 以 `header` 为空间信息, 使用 `(z, h, w)` 组织的数据创建掩膜.
    /// 任何非零体素都被视为肺部.
    ///
    /// `data` 与 `header` 形状不一致时返回 `Err`.
    pub fn with_header(header: &NiftiHeader, data: Array3<u8>) -> VolumeResult<Self> {
        check_header_shape(header, data.dim())?;
        Ok(Self {
            header: Box::new(header.clone()),
            data: data.mapv(|v| from_flag(v != 0)),
        })
    }

    /// 将掩膜写出为 nifti 文件 (`.nii` 或 `.nii.gz`), 沿用来源体数据的 header.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        write_volume!(path.as_ref(), &self.header, self.data)
    }

    /// 将掩膜以 `(z, h, w)` 组织写出为 npy 文件.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> VolumeResult<()> {
        ndarray_npy::write_npy(path.as_ref(), &self.data)?;
        Ok(())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 肺部体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&p| is_lung(p)).count()
    }

    /// 肺部体积, 以立方毫米为单位.
    #[inline]
    pub fn volume_mm3(&self) -> f64 {
        self.count() as f64 * self.voxel()
    }

    /// 是否所有体素都只取背景或肺部值?
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&p| is_lung(p) || is_background(p))
    }

    /// 肺部体素的 6-连通分量个数.
    pub fn component_count(&self) -> usize {
        count_components(self.data.mapv(is_lung).view())
    }

    /// 收集所有肺部体素的 `[x, y, z]` 坐标 (从 0 开始).
    ///
    /// 结果按 `x`, `y`, `z` 的字典序排列.
    pub fn nonzero_landmarks(&self) -> LandmarkSet {
        self.data
            .view()
            .permuted_axes([2, 1, 0])
            .indexed_iter()
            .filter(|(_, &p)| is_lung(p))
            .map(|((x, y, z), _)| [x as f64, y as f64, z as f64])
            .collect()
    }

    /// 以 `header` 为参考空间, 在每个标志点四舍五入后的体素处写入肺部值.
    ///
    /// 返回掩膜以及因越界而被跳过的标志点个数.
    pub fn rasterize(header: &NiftiHeader, points: &LandmarkSet) -> (Self, usize) {
        let shape = get_shape_from_header(header);
        let mut data = Array3::from_elem(shape, MASK_BACKGROUND);
        let mut skipped = 0usize;
        for p in points {
            match voxel_of(p, shape) {
                Some(pos) => data[pos] = MASK_LUNG,
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("{skipped} 个标志点越界, 已跳过");
        }
        let mask = Self {
            header: Box::new(header.clone()),
            data,
        };
        (mask, skipped)
    }
}

/// 将 `[x, y, z]` 坐标四舍五入为 `(z, h, w)` 下标. 越界时返回 `None`.
#[inline]
fn voxel_of([x, y, z]: &Landmark, (len_z, len_h, len_w): Idx3d) -> Option<Idx3d> {
    let round = |v: f64, len: usize| {
        let r = v.round();
        (r >= 0.0 && r < len as f64).then_some(r as usize)
    };
    Some((round(*z, len_z)?, round(*y, len_h)?, round(*x, len_w)?))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;

        /// 借助 `rayon`, 并行地为多个相互独立的扫描提取肺部掩膜.
        ///
        /// 结果顺序与 `scans` 一致.
        pub fn par_refined_lung_masks(scans: &[CtScan], params: &MaskParams) -> Vec<MaskResult<LungMask>> {
            scans
                .par_iter()
                .map(|scan| scan.refined_lung_mask(params))
                .collect()
        }
    }
}
