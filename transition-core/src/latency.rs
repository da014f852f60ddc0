//! # Latency 模块
//!
//! 加载阶段的模拟延迟策略。
//!
//! 生产环境使用 `NoLatency`；演示 / 压测时注入 `RandomStall`，
//! 以一定概率在轮询加载进度前停顿一段时间，模拟资源解压耗时的波动。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// 参考行为：1/3 概率停顿
pub const REFERENCE_STALL_PROBABILITY: f32 = 1.0 / 3.0;

/// 参考行为：停顿 3 秒
pub const REFERENCE_STALL_SECONDS: f32 = 3.0;

/// 延迟策略
pub trait LatencyStrategy {
    /// 本次加载需要额外停顿的秒数，`None` 表示不停顿
    fn stall(&mut self) -> Option<f32>;
}

/// 不注入延迟
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

impl LatencyStrategy for NoLatency {
    fn stall(&mut self) -> Option<f32> {
        None
    }
}

/// 每次都停顿固定时长
#[derive(Debug, Clone, Copy)]
pub struct FixedStall(pub f32);

impl LatencyStrategy for FixedStall {
    fn stall(&mut self) -> Option<f32> {
        (self.0 > 0.0).then_some(self.0)
    }
}

/// 按概率停顿
#[derive(Debug, Clone)]
pub struct RandomStall {
    probability: f32,
    seconds: f32,
    rng: StdRng,
}

impl RandomStall {
    /// 创建随机停顿策略
    ///
    /// `seed` 为 `None` 时使用系统熵源。
    pub fn new(probability: f32, seconds: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            probability: probability.clamp(0.0, 1.0),
            seconds: seconds.max(0.0),
            rng,
        }
    }

    /// 参考行为（1/3 概率停顿 3 秒）
    pub fn reference(seed: Option<u64>) -> Self {
        Self::new(REFERENCE_STALL_PROBABILITY, REFERENCE_STALL_SECONDS, seed)
    }
}

impl LatencyStrategy for RandomStall {
    fn stall(&mut self) -> Option<f32> {
        if self.seconds > 0.0 && self.rng.gen_bool(f64::from(self.probability)) {
            Some(self.seconds)
        } else {
            None
        }
    }
}

/// 延迟配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyConfig {
    /// 停顿概率 (0.0 - 1.0)，0 表示不注入
    #[serde(default)]
    pub probability: f32,

    /// 停顿时长（秒）
    #[serde(default = "default_stall_seconds")]
    pub seconds: f32,
}

fn default_stall_seconds() -> f32 {
    REFERENCE_STALL_SECONDS
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            probability: 0.0,
            seconds: default_stall_seconds(),
        }
    }
}

impl LatencyConfig {
    /// 根据配置构建策略
    pub fn build(&self, seed: Option<u64>) -> Box<dyn LatencyStrategy> {
        if self.probability <= 0.0 || self.seconds <= 0.0 {
            Box::new(NoLatency)
        } else if self.probability >= 1.0 {
            Box::new(FixedStall(self.seconds))
        } else {
            Box::new(RandomStall::new(self.probability, self.seconds, seed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_latency() {
        assert_eq!(NoLatency.stall(), None);
        assert_eq!(FixedStall(0.0).stall(), None);
        assert_eq!(FixedStall(1.5).stall(), Some(1.5));
    }

    #[test]
    fn test_random_stall_rate() {
        let mut strategy = RandomStall::reference(Some(7));
        let stalls = (0..3000).filter(|_| strategy.stall().is_some()).count();
        // 期望约 1000 次
        assert!((800..1200).contains(&stalls), "stalls = {stalls}");
    }

    #[test]
    fn test_config_build() {
        let mut none = LatencyConfig::default().build(None);
        assert_eq!(none.stall(), None);

        let mut always = LatencyConfig {
            probability: 1.0,
            seconds: 0.5,
        }
        .build(None);
        assert_eq!(always.stall(), Some(0.5));
    }
}
