//! # Fade 模块
//!
//! 单次淡入淡出实例：透明度从 `from` 到 `to` 在 `duration` 内线性（或按缓动）变化。

use super::EasingFunction;

/// 淡入淡出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeState {
    /// 正在播放
    #[default]
    Running,
    /// 已完成
    Completed,
    /// 已跳过
    Skipped,
}

impl FadeState {
    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped)
    }
}

/// 单次淡入淡出
#[derive(Debug, Clone)]
pub struct Fade {
    /// 起始透明度
    pub from: f32,
    /// 目标透明度
    pub to: f32,
    /// 时长（秒）
    pub duration: f32,
    /// 缓动函数
    pub easing: EasingFunction,
    /// 当前状态
    pub state: FadeState,
    elapsed: f32,
}

/// 每个 tick 的采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeSample {
    /// 已经过的时间（秒）
    pub elapsed: f32,
    /// 截断到 [0, 1] 的时间进度（未应用缓动）
    pub t: f32,
    /// 该 tick 写入目标的透明度
    pub opacity: f32,
}

impl Fade {
    /// 创建淡入淡出
    ///
    /// `duration <= 0` 时直接处于 `Completed` 状态。
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        let state = if duration <= 0.0 {
            FadeState::Completed
        } else {
            FadeState::Running
        };

        Self {
            from,
            to,
            duration: duration.max(0.0),
            easing: EasingFunction::default(),
            state,
            elapsed: 0.0,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 推进一个 tick
    ///
    /// # 返回
    /// - `true`: 仍在进行中
    /// - `false`: 已结束
    pub fn update(&mut self, dt: f32) -> bool {
        if self.state.is_finished() {
            return false;
        }

        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.duration {
            self.state = FadeState::Completed;
            false
        } else {
            true
        }
    }

    /// 跳过，直接到达目标值
    pub fn skip(&mut self) {
        if !self.state.is_finished() {
            self.state = FadeState::Skipped;
        }
    }

    /// 已经过的时间
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 截断后的时间进度
    pub fn t(&self) -> f32 {
        if self.state.is_finished() || self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// 当前透明度
    ///
    /// 结束后严格等于 `to`；进行中的值始终位于 `[min(from, to), max(from, to)]`。
    pub fn current_value(&self) -> f32 {
        if self.state.is_finished() {
            return self.to;
        }

        let eased = self.easing.apply(self.t());
        let value = self.from + (self.to - self.from) * eased;
        value.clamp(self.from.min(self.to), self.from.max(self.to))
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// 当前采样
    pub fn sample(&self) -> FadeSample {
        FadeSample {
            elapsed: self.elapsed,
            t: self.t(),
            opacity: self.current_value(),
        }
    }

    /// 以固定 tick 惰性展开整个淡入淡出
    ///
    /// 第一个采样是 `elapsed = 0` 时的值，最后一个采样严格等于 `to`。
    /// `dt <= 0` 时只产出初始采样。
    pub fn ticks(self, dt: f32) -> FadeTicks {
        FadeTicks {
            fade: self,
            dt,
            started: false,
            done: false,
        }
    }
}

/// `Fade::ticks` 产生的惰性采样序列
#[derive(Debug, Clone)]
pub struct FadeTicks {
    fade: Fade,
    dt: f32,
    started: bool,
    done: bool,
}

impl Iterator for FadeTicks {
    type Item = FadeSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            self.started = true;
            if self.fade.is_finished() || self.dt <= 0.0 {
                self.done = true;
            }
            return Some(self.fade.sample());
        }

        self.fade.update(self.dt);
        if self.fade.is_finished() {
            self.done = true;
        }
        Some(self.fade.sample())
    }
}
