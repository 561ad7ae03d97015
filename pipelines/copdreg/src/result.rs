//! 流水线运行结果.

use std::io::{self, Write};

use lung_berry::tre::TreReport;

use crate::profile::Profile;

/// 单个病例的完整运行结果.
#[derive(Debug)]
pub struct CaseOutcome {
    /// 病例编号.
    pub id: u32,

    /// 吸气 / 呼气掩膜的肺部体素个数.
    pub mask_voxels: [usize; 2],

    /// 配准前 (吸气参考点 vs 呼气参考点) 的 TRE.
    pub before: TreReport,

    /// 配准后 (变换后的吸气参考点 vs 呼气参考点) 的 TRE.
    pub after: TreReport,

    /// 各阶段耗时.
    pub profile: Profile,
}

/// 将 `c` 的结果写进 `w` 中.
fn describe_into<W: Write>(c: &CaseOutcome, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Case `copd{}`:", c.id)?;
    writeln!(
        w,
        "{S4}Mask voxels: inhale {}, exhale {}",
        c.mask_voxels[0], c.mask_voxels[1]
    )?;
    writeln!(w, "{S4}Before: {}", c.before)?;
    writeln!(w, "{S4}After:  {}", c.after)?;
    for (name, d) in c.profile.stages() {
        writeln!(w, "{S4}Stage `{name}`: {} ms", d.as_millis())?;
    }
    write!(w, "{S4}Total machine time: {} ms", c.profile.get_real_time_ms())?;
    Ok(())
}

/// 写出所有病例配准前后平均 TRE 的汇总表.
fn table_into<W: Write>(cases: &[CaseOutcome], w: &mut W) -> io::Result<()> {
    writeln!(w, "{:<8}{:>14}{:>14}", "case", "before (mm)", "after (mm)")?;
    for c in cases {
        writeln!(
            w,
            "{:<8}{:>14.2}{:>14.2}",
            format!("copd{}", c.id),
            c.before.mean(),
            c.after.mean()
        )?;
    }
    if !cases.is_empty() {
        let n = cases.len() as f64;
        let before = cases.iter().map(|c| c.before.mean()).sum::<f64>() / n;
        let after = cases.iter().map(|c| c.after.mean()).sum::<f64>() / n;
        write!(w, "{:<8}{:>14.2}{:>14.2}", "mean", before, after)?;
    }
    Ok(())
}

/// 流水线最终结果.
#[derive(Debug, Default)]
pub struct RunSummary {
    data: Vec<CaseOutcome>,
}

impl FromIterator<CaseOutcome> for RunSummary {
    fn from_iter<I: IntoIterator<Item = CaseOutcome>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }
}

impl RunSummary {
    /// 将全部结果写进 `w` 中.
    pub fn write_into<W: Write>(&self, mut w: W) -> io::Result<()> {
        utils::sep_to(&mut w)?;
        for c in self.data.iter() {
            describe_into(c, &mut w)?;
            writeln!(w)?;
            utils::sep_to(&mut w)?;
        }
        table_into(&self.data, &mut w)?;
        writeln!(w)
    }

    /// 在标准输出打印运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        self.write_into(io::stdout().lock())
    }
}
