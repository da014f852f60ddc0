//! # Session 模块
//!
//! 一次进行中的过渡的瞬时状态。由编排器独占，会话结束即销毁。

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::loader::AsyncLoad;
use crate::variant::TransitionVariant;

/// 过渡阶段
///
/// # 状态转换
///
/// ```text
/// Idle ─► CoverFadingIn ─► Loading ─► AwaitingAnimationProceed ─► Activating
///                              │                                      │
///                              │ (加载失败)                            ▼
///                              └──────────► CoverFadingOut ◄─ SecondaryFadingOut
///                                                 │
///                                                 ▼
///                                               Done ─► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransitionPhase {
    /// 空闲
    #[default]
    Idle,
    /// 遮罩出现
    CoverFadingIn,
    /// 加载中，等待进度到达上限
    Loading,
    /// 等待动画 proceed 信号（以及过渡图层淡入）
    AwaitingAnimationProceed,
    /// 已释放激活，等待加载完成
    Activating,
    /// 过渡图层淡出
    SecondaryFadingOut,
    /// 遮罩消失
    CoverFadingOut,
    /// 完成（随即回到 Idle）
    Done,
}

impl TransitionPhase {
    /// 是否处于进行中的会话
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done)
    }
}

impl std::fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// 过渡会话
#[derive(Debug, Clone)]
pub struct TransitionSession {
    /// 目标场景
    pub target_scene_id: String,
    /// 选中的变体（快照）
    pub variant: TransitionVariant,
    /// 当前阶段
    pub phase: TransitionPhase,
    /// 最近一次轮询到的加载进度
    pub load_progress: f32,
    /// 加载是否已完成
    pub load_complete: bool,
    /// 是否收到过 proceed 信号
    pub proceed_signaled: bool,

    pub(crate) load: Option<AsyncLoad>,
    /// 剩余的模拟停顿时长
    pub(crate) stall_remaining: f32,
    pub(crate) indicator_shown: bool,
    /// 在 AwaitingAnimationProceed 阶段已等待的时长
    pub(crate) proceed_wait: f32,
    /// 加载失败时记录的错误，会话以 Aborted 结束
    pub(crate) failure: Option<TransitionError>,
}

impl TransitionSession {
    /// 创建会话（阶段为 Idle，由编排器推进）
    pub fn new(target_scene_id: impl Into<String>, variant: TransitionVariant) -> Self {
        Self {
            target_scene_id: target_scene_id.into(),
            variant,
            phase: TransitionPhase::Idle,
            load_progress: 0.0,
            load_complete: false,
            proceed_signaled: false,
            load: None,
            stall_remaining: 0.0,
            indicator_shown: false,
            proceed_wait: 0.0,
            failure: None,
        }
    }

    /// 是否正在模拟停顿
    pub fn is_stalled(&self) -> bool {
        self.stall_remaining > 0.0
    }

    /// 是否因加载失败而中止
    pub fn is_aborting(&self) -> bool {
        self.failure.is_some()
    }
}

/// 编排器事件
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEvent {
    /// 过渡开始
    Started { scene_id: String, variant_index: u32 },
    /// 阶段切换
    PhaseChanged {
        from: TransitionPhase,
        to: TransitionPhase,
    },
    /// 注入了模拟停顿
    StallInjected { seconds: f32 },
    /// 已触发过渡动画
    AnimatorTriggered { variant_index: u32 },
    /// 已释放激活
    ActivationReleased,
    /// proceed 信号超时，按兜底策略继续
    ProceedTimedOut { waited: f32 },
    /// 过渡完成
    Completed { scene_id: String },
    /// 启动请求被拒绝
    Rejected { error: TransitionError },
    /// 过渡中止（加载失败）
    Aborted { error: TransitionError },
    /// 过渡被取消
    Cancelled { scene_id: String },
}
