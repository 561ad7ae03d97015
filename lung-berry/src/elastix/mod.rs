//! elastix / transformix 外部进程适配.
//!
//! 本模块不实现任何配准算法, 只负责拼装命令行, 启动外部程序,
//! 并检查其退出状态和输出文件.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::consts::{OUTPUT_POINTS_FILE, TRANSFORM_PARAMETERS_FILE};
use crate::landmark::LandmarkSet;

mod error;

pub use error::ElastixError;

/// elastix / transformix 调用运行时错误.
pub type ElastixResult<T> = Result<T, ElastixError>;

/// 默认的 elastix 可执行文件名, 从 `PATH` 中查找.
pub const DEFAULT_ELASTIX: &str = "elastix";

/// 默认的 transformix 可执行文件名, 从 `PATH` 中查找.
pub const DEFAULT_TRANSFORMIX: &str = "transformix";

/// transformix 点输入文件在输出目录中的文件名.
pub const INPUT_POINTS_FILE: &str = "inputpoints.txt";

/// 启动 `program`, 等待其结束并检查退出状态.
///
/// 运行前会创建输出目录 `out_dir`.
fn run_tool(program: &Path, args: &[OsString], out_dir: &Path) -> ElastixResult<()> {
    fs::create_dir_all(out_dir).map_err(|source| ElastixError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let name = program.display().to_string();
    info!(
        "运行 {name} {}",
        args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
    );
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ElastixError::Spawn {
            program: name.clone(),
            source,
        })?;
    debug!(
        "{name} 输出 {} 字节 stdout, {} 字节 stderr",
        output.stdout.len(),
        output.stderr.len()
    );

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(last) = stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            log::error!("{name}: {last}");
        }
        Err(ElastixError::Failed {
            program: name,
            status: output.status,
        })
    }
}

/// 检查外部程序生成的文件是否存在.
#[inline]
fn expect_output(path: PathBuf) -> ElastixResult<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ElastixError::MissingOutput(path))
    }
}

/// 一次 elastix 配准任务的全部输入.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationJob {
    fixed: PathBuf,
    moving: PathBuf,
    fixed_mask: PathBuf,
    moving_mask: Option<PathBuf>,
    parameter_file: PathBuf,
    out_dir: PathBuf,
}

impl RegistrationJob {
    /// 将 `moving` 配准到 `fixed`, 在 `fixed_mask` 内计算相似性测度.
    pub fn new(
        fixed: impl Into<PathBuf>,
        moving: impl Into<PathBuf>,
        fixed_mask: impl Into<PathBuf>,
        parameter_file: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fixed: fixed.into(),
            moving: moving.into(),
            fixed_mask: fixed_mask.into(),
            moving_mask: None,
            parameter_file: parameter_file.into(),
            out_dir: out_dir.into(),
        }
    }

    /// 同时为浮动图像指定掩膜.
    pub fn with_moving_mask(mut self, moving_mask: impl Into<PathBuf>) -> Self {
        self.moving_mask = Some(moving_mask.into());
        self
    }

    /// 输出目录.
    #[inline]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// elastix 的命令行参数 (不含程序名).
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(12);
        let mut push = |flag: &str, value: &OsStr| {
            args.push(flag.into());
            args.push(value.to_os_string());
        };
        push("-f", self.fixed.as_os_str());
        push("-m", self.moving.as_os_str());
        push("-fMask", self.fixed_mask.as_os_str());
        if let Some(mm) = &self.moving_mask {
            push("-mMask", mm.as_os_str());
        }
        push("-out", self.out_dir.as_os_str());
        push("-p", self.parameter_file.as_os_str());
        args
    }

    /// 该任务成功后 elastix 生成的变换参数文件路径.
    #[inline]
    pub fn transform_parameters(&self) -> PathBuf {
        self.out_dir.join(TRANSFORM_PARAMETERS_FILE)
    }
}

/// elastix 可执行程序.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Elastix {
    program: PathBuf,
}

impl Default for Elastix {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_ELASTIX)
    }
}

impl Elastix {
    /// 使用 `program` (路径或 `PATH` 中的程序名) 作为 elastix.
    #[inline]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 程序路径.
    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 运行配准, 返回 `TransformParameters.0.txt` 的路径.
    ///
    /// 非零退出返回 `Err(ElastixError::Failed)`,
    /// 未生成参数文件返回 `Err(ElastixError::MissingOutput)`.
    pub fn register(&self, job: &RegistrationJob) -> ElastixResult<PathBuf> {
        run_tool(&self.program, &job.args(), job.out_dir())?;
        expect_output(job.transform_parameters())
    }
}

/// transformix 可执行程序.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transformix {
    program: PathBuf,
}

impl Default for Transformix {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_TRANSFORMIX)
    }
}

impl Transformix {
    /// 使用 `program` (路径或 `PATH` 中的程序名) 作为 transformix.
    #[inline]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// 程序路径.
    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// transformix 点变换的命令行参数 (不含程序名).
    pub fn args(points: &Path, transform_parameters: &Path, out_dir: &Path) -> Vec<OsString> {
        vec![
            "-def".into(),
            points.as_os_str().to_os_string(),
            "-tp".into(),
            transform_parameters.as_os_str().to_os_string(),
            "-out".into(),
            out_dir.as_os_str().to_os_string(),
        ]
    }

    /// 用 `transform_parameters` 变换点文件 `points`, 返回 `outputpoints.txt` 的路径.
    pub fn transform_points(
        &self,
        points: &Path,
        transform_parameters: &Path,
        out_dir: &Path,
    ) -> ElastixResult<PathBuf> {
        let args = Self::args(points, transform_parameters, out_dir);
        run_tool(&self.program, &args, out_dir)?;
        expect_output(out_dir.join(OUTPUT_POINTS_FILE))
    }

    /// 先将 `landmarks` 写为 `out_dir` 下的点输入文件, 再执行点变换.
    pub fn transform_landmarks(
        &self,
        landmarks: &LandmarkSet,
        transform_parameters: &Path,
        out_dir: &Path,
    ) -> ElastixResult<PathBuf> {
        fs::create_dir_all(out_dir).map_err(|source| ElastixError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let points = out_dir.join(INPUT_POINTS_FILE);
        landmarks.write_transformix(&points)?;
        self.transform_points(&points, transform_parameters, out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> RegistrationJob {
        RegistrationJob::new("f.nii.gz", "m.nii.gz", "fm.nii", "p.txt", "out")
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_args_without_moving_mask() {
        assert_eq!(
            strings(&job().args()),
            ["-f", "f.nii.gz", "-m", "m.nii.gz", "-fMask", "fm.nii", "-out", "out", "-p", "p.txt"]
        );
        assert_eq!(job().transform_parameters(), Path::new("out").join(TRANSFORM_PARAMETERS_FILE));
    }

    #[test]
    fn test_args_with_moving_mask() {
        let args = strings(&job().with_moving_mask("mm.nii").args());
        assert_eq!(
            args,
            [
                "-f", "f.nii.gz", "-m", "m.nii.gz", "-fMask", "fm.nii", "-mMask", "mm.nii", "-out",
                "out", "-p", "p.txt"
            ]
        );
    }

    #[test]
    fn test_transformix_args() {
        let args = Transformix::args(Path::new("pts.txt"), Path::new("tp.txt"), Path::new("o"));
        assert_eq!(strings(&args), ["-def", "pts.txt", "-tp", "tp.txt", "-out", "o"]);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = std::env::temp_dir().join("lung-berry-elastix-spawn");
        let job = RegistrationJob::new("f", "m", "fm", "p", &dir);
        let err = Elastix::new("/nonexistent/elastix-binary").register(&job).unwrap_err();
        assert!(matches!(err, ElastixError::Spawn { .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure() {
        let dir = std::env::temp_dir().join("lung-berry-elastix-false");
        let job = RegistrationJob::new("f", "m", "fm", "p", &dir);
        let err = Elastix::new("false").register(&job).unwrap_err();
        match err {
            ElastixError::Failed { program, status } => {
                assert_eq!(program, "false");
                assert!(!status.success());
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_success_without_output_file() {
        let dir = std::env::temp_dir().join("lung-berry-transformix-true");
        let err = Transformix::new("true")
            .transform_points(Path::new("p"), Path::new("tp"), &dir)
            .unwrap_err();
        assert!(matches!(err, ElastixError::MissingOutput(p) if p.ends_with(OUTPUT_POINTS_FILE)));
    }
}
