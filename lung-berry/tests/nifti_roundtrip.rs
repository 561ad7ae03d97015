use lung_berry::prelude::*;
use ndarray::{s, Array3};
use tempfile::tempdir;

fn synthetic_scan() -> CtScan {
    let mut data = Array3::from_elem((10, 12, 20), -1000.0f32);
    data.slice_mut(s![2..7, 2..8, 2..8]).fill(250.0);
    data.slice_mut(s![2..7, 2..8, 12..17]).fill(420.0);
    data[(8, 10, 18)] = 300.0;
    // 坐标各不相同, 便于发现轴顺序错误.
    data[(0, 1, 2)] = 7.0;
    CtScan::fake(data, [0.625, 0.7, 2.5])
}

#[test]
fn test_scan_roundtrip_keeps_axes_and_spacing() {
    let dir = tempdir().unwrap();
    let scan = synthetic_scan();
    for name in ["scan.nii", "scan.nii.gz"] {
        let path = dir.path().join(name);
        scan.save(&path).unwrap();
        let back = CtScan::open(&path).unwrap();
        assert_eq!(back.shape(), scan.shape());
        assert_eq!(back.spacing_xyz(), scan.spacing_xyz());
        assert_eq!(back.data(), scan.data());
        assert_eq!(back[(0, 1, 2)], 7.0);
        assert_eq!(back.header().qform_code, scan.header().qform_code);
        assert_eq!(back.header().sform_code, scan.header().sform_code);
    }
}

#[test]
fn test_mask_roundtrip_keeps_header() {
    let dir = tempdir().unwrap();
    let scan = synthetic_scan();
    let mask = scan
        .refined_lung_mask(&MaskParams::new(100.0, 500.0, 3).unwrap())
        .unwrap();
    assert_eq!(mask.component_count(), 2);
    assert_eq!(mask.shape(), scan.shape());
    assert!(mask.is_binary());

    let path = dir.path().join("copd0_mask_iBHCT.nii");
    mask.save(&path).unwrap();
    let back = LungMask::open(&path).unwrap();
    assert_eq!(back.data(), mask.data());
    assert_eq!(back.pix_dim(), scan.pix_dim());
    assert_eq!(back.origin(), scan.origin());
    assert_eq!(back.component_count(), mask.component_count());

    let npy = dir.path().join("mask.npy");
    mask.save_npy(&npy).unwrap();
    let raw: Array3<u8> = ndarray_npy::read_npy(&npy).unwrap();
    assert_eq!(raw.view(), mask.data());
}

#[test]
fn test_landmark_volume_roundtrip() {
    let dir = tempdir().unwrap();
    let scan = synthetic_scan();
    let points = LandmarkSet::from(vec![[3.0, 4.0, 5.0], [19.0, 11.0, 9.0], [40.0, 0.0, 0.0]]);
    let (mask, skipped) = LungMask::rasterize(scan.header(), &points);
    assert_eq!(skipped, 1);

    let path = dir.path().join("landmarks.nii.gz");
    mask.save(&path).unwrap();
    let back = LungMask::open(&path).unwrap().nonzero_landmarks();
    assert_eq!(back.points(), &points.points()[..2]);
}

#[test]
fn test_landmark_text_roundtrip() {
    let dir = tempdir().unwrap();
    let points = LandmarkSet::from(vec![[95.0, 138.0, 49.0], [0.0, 12.0, 3.0]]);

    let one_based = dir.path().join("copd1_300_iBH_xyz_r1.txt");
    points.write(&one_based, IndexBase::One).unwrap();
    assert_eq!(
        std::fs::read_to_string(&one_based).unwrap(),
        "96 139 50\n1 13 4\n"
    );
    assert_eq!(LandmarkSet::read(&one_based, IndexBase::One).unwrap(), points);

    let transformix = dir.path().join("inputpoints.txt");
    points.write_transformix(&transformix).unwrap();
    assert_eq!(
        std::fs::read_to_string(&transformix).unwrap(),
        "index\n2\n95 138 49\n0 12 3\n"
    );
}
