//! 用 shell 脚本模拟 elastix / transformix, 检查适配层的完整调用流程.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use lung_berry::consts::TRANSFORM_PARAMETERS_FILE;
use lung_berry::prelude::*;
use tempfile::tempdir;

const FAKE_ELASTIX: &str = r#"#!/bin/sh
args="$*"
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -out) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "$args" > "$out/args.txt"
echo '(Transform "BSplineTransform")' > "$out/TransformParameters.0.txt"
"#;

const FAKE_TRANSFORMIX: &str = r#"#!/bin/sh
def=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -def) def="$2"; shift 2 ;;
    -out) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
awk 'NR > 2 { printf "Point\t%d\t; InputIndex = [ %d %d %d ]\t; OutputIndexFixed = [ %d %d %d ]\n", NR - 3, $1, $2, $3, $1 + 1, $2, $3 - 1 }' "$def" > "$out/outputpoints.txt"
"#;

const FAILING_TOOL: &str = "#!/bin/sh\necho 'itk::ExceptionObject' >&2\nexit 3\n";

/// 写入脚本并赋予可执行权限. 文件在返回前关闭.
fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// 所有脚本在同一个测试中顺序执行, 避免并发 fork 时脚本仍被写端占用.
#[test]
fn test_register_then_transform_points() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
    let dir = tempdir().unwrap();
    let elastix = Elastix::new(install_script(dir.path(), "elastix", FAKE_ELASTIX));
    let transformix = Transformix::new(install_script(dir.path(), "transformix", FAKE_TRANSFORMIX));
    let failing = install_script(dir.path(), "failing", FAILING_TOOL);

    // 1. 配准: 输出目录不存在时自动创建.
    let out = dir.path().join("copd1").join("elastix");
    let job = RegistrationJob::new("f.nii.gz", "m.nii.gz", "fm.nii", "Par0011.txt", &out)
        .with_moving_mask("mm.nii");
    let tp = elastix.register(&job).unwrap();
    assert_eq!(tp, out.join(TRANSFORM_PARAMETERS_FILE));
    let args = fs::read_to_string(out.join("args.txt")).unwrap();
    assert!(args.contains("-fMask fm.nii -mMask mm.nii"), "{args}");
    assert!(args.trim_end().ends_with("-p Par0011.txt"), "{args}");

    // 2. 点变换.
    let reference = LandmarkSet::from(vec![[95.0, 138.0, 49.0], [0.0, 12.0, 3.0]]);
    let points_out = out.join("transformed_points");
    let output = transformix
        .transform_landmarks(&reference, &tp, &points_out)
        .unwrap();
    let records = read_output_points(&output).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].index, Some(1));
    assert_eq!(records[1].input_index, Some([0.0, 12.0, 3.0]));

    let moved = output_index_landmarks(&records, IndexBase::Zero);
    assert_eq!(moved.points(), &[[96.0, 138.0, 48.0], [1.0, 12.0, 2.0]]);
    let challenge = output_index_landmarks(&records, IndexBase::One);
    assert_eq!(challenge[0], [97.0, 139.0, 49.0]);

    // 3. TRE: 每个点在 x 和 z 方向各偏移一个体素.
    let spacing = [0.625, 0.625, 2.5];
    let report = TreReport::new(&reference.scaled(spacing), &moved.scaled(spacing)).unwrap();
    let expected = (0.625f64.powi(2) + 2.5f64.powi(2)).sqrt();
    assert!((report.mean() - expected).abs() < 1e-12);
    assert!((report.max() - expected).abs() < 1e-12);

    // 4. 非零退出.
    let err = Elastix::new(&failing).register(&job).unwrap_err();
    match err {
        ElastixError::Failed { status, .. } => assert_eq!(status.code(), Some(3)),
        other => panic!("unexpected error {other:?}"),
    }
    let err = Transformix::new(&failing)
        .transform_points(&out.join("inputpoints.txt"), &tp, &points_out)
        .unwrap_err();
    assert!(matches!(err, ElastixError::Failed { .. }));
}
