//! 流水线各阶段运行统计.

use std::time::{Duration, Instant};

/// 累加计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }
}

/// 单个病例的阶段耗时统计.
///
/// 阶段按首次出现的顺序记录, 同名阶段的耗时会被累加.
#[derive(Clone, Debug)]
pub struct Profile {
    stages: Vec<(&'static str, Duration)>,
    real_time: AccTimer,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

impl Profile {
    /// 初始化. 总计时同时开始.
    #[inline]
    pub fn new() -> Self {
        Self {
            stages: Vec::with_capacity(8),
            real_time: AccTimer::new(),
        }
    }

    /// 运行 `f`, 并将其耗时记在阶段 `name` 下.
    pub fn time<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let mut timer = AccTimer::new();
        timer.start();
        let ans = f();
        self.record(name, timer.elapsed());
        ans
    }

    /// 为阶段 `name` 累加耗时 `d`.
    pub fn record(&mut self, name: &'static str, d: Duration) {
        match self.stages.iter_mut().find(|(n, _)| *n == name) {
            Some((_, acc)) => *acc += d,
            None => self.stages.push((name, d)),
        }
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 按记录顺序迭代 `(阶段, 耗时)`.
    #[inline]
    pub fn stages(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.stages.iter().copied()
    }

    /// 阶段 `name` 的累计耗时.
    pub fn get(&self, name: &str) -> Option<Duration> {
        self.stages.iter().find(|(n, _)| *n == name).map(|(_, d)| *d)
    }

    /// 以毫秒为单位获得到 `finish` 为止的总自然时间.
    #[inline]
    pub fn get_real_time_ms(&self) -> u64 {
        self.real_time.consumed.as_millis() as u64
    }
}
