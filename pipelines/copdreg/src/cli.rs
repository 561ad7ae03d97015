use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::runner::RunArgs;
use crate::stages::mask::MaskArgs;
use crate::stages::points::PointsArgs;
use crate::stages::register::RegisterArgs;
use crate::stages::tre::TreArgs;

#[derive(Parser, Debug)]
#[command(name = "copdreg")]
#[command(about = "DIR-Lab COPD 吸气/呼气 CT 的肺部掩膜, elastix 配准与 TRE 评估.")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 日志级别.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// 子命令.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run_program(self) -> Result<()> {
        match self.command {
            Commands::Mask(v) => v.run(),
            Commands::Register(v) => v.run(),
            Commands::Points(v) => v.run(),
            Commands::Tre(v) => v.run(),
            Commands::Run(v) => v.run(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 为一个病例的吸气与呼气 CT 生成肺部掩膜.
    Mask(MaskArgs),
    /// 调用 elastix 配准一个病例, 再用 transformix 变换其吸气标志点.
    Register(RegisterArgs),
    /// 从 transformix 的 `outputpoints.txt` 中提取变换后的体素坐标.
    Points(PointsArgs),
    /// 计算一个病例配准前后的 TRE.
    Tre(TreArgs),
    /// 对多个病例依次运行全部阶段, 并汇总 TRE.
    Run(RunArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "copdreg",
            "register",
            "-c",
            "2",
            "-p",
            "Parameters.txt",
            "--no-moving-mask",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert!(matches!(cli.command, Commands::Register(_)));

        let cli = Cli::try_parse_from(["copdreg", "points", "outputpoints.txt", "-o", "moved.txt"])
            .unwrap();
        assert_eq!(cli.log_level, LevelFilter::Info);
        assert!(matches!(cli.command, Commands::Points(_)));

        assert!(Cli::try_parse_from(["copdreg", "mask"]).is_err());
    }
}
