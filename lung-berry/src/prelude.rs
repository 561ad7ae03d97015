//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::window::ThresholdWindow;
pub use crate::data::{CtScan, LungMask, NiftiHeaderAttr, VolumeError, VolumeResult};

#[cfg(feature = "rayon")]
pub use crate::data::par_refined_lung_masks;

pub use crate::morph_3d::{refine_lung_mask, MaskError, MaskParams, MaskResult};

pub use crate::consts::gray::{MASK_BACKGROUND, MASK_LUNG};
pub use crate::consts::{COPD_LANDMARK_COUNT, COPD_TRAINING_SET_LEN};

pub use crate::dataset::{self, home_copd_dir, home_dataset_dir_with, CopdCase, Phase};

pub use crate::elastix::{Elastix, ElastixError, RegistrationJob, Transformix};

pub use crate::landmark::{
    output_index_landmarks, read_output_points, IndexBase, Landmark, LandmarkError, LandmarkSet,
};

pub use crate::tre::{calculate_tre, TreReport};
