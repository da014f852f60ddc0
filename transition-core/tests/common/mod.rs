//! 集成测试共用的协作者替身

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use transition_core::{
    LoadingIndicator, SceneTransitionOrchestrator, SoundTrigger, TransitionAnimator,
    TransitionEvent, TransitionPhase,
};

/// 动画播放器收到的调用
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorCall {
    Integer(String, i32),
    Trigger(String),
}

/// 记录所有调用的动画播放器
#[derive(Debug, Clone, Default)]
pub struct RecordingAnimator {
    pub calls: Rc<RefCell<Vec<AnimatorCall>>>,
    pub clip_length: Option<f32>,
}

impl RecordingAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip_length(mut self, seconds: f32) -> Self {
        self.clip_length = Some(seconds);
        self
    }

    pub fn calls(&self) -> Vec<AnimatorCall> {
        self.calls.borrow().clone()
    }
}

impl TransitionAnimator for RecordingAnimator {
    fn set_integer(&mut self, name: &str, value: i32) {
        self.calls
            .borrow_mut()
            .push(AnimatorCall::Integer(name.to_string(), value));
    }

    fn set_trigger(&mut self, name: &str) {
        self.calls
            .borrow_mut()
            .push(AnimatorCall::Trigger(name.to_string()));
    }

    fn current_clip_length(&self) -> Option<f32> {
        self.clip_length
    }
}

/// 记录显示状态变化的加载指示器
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator {
    pub states: Rc<RefCell<Vec<bool>>>,
}

impl RecordingIndicator {
    pub fn states(&self) -> Vec<bool> {
        self.states.borrow().clone()
    }
}

impl LoadingIndicator for RecordingIndicator {
    fn set_active(&mut self, active: bool) {
        self.states.borrow_mut().push(active);
    }
}

/// 计数音效
#[derive(Debug, Default)]
pub struct CountingSound {
    pub count: Cell<u32>,
}

impl SoundTrigger for CountingSound {
    fn play(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// 提取阶段切换轨迹
pub fn phase_trace(events: &[TransitionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            TransitionEvent::PhaseChanged { from, to } => Some(format!("{from} -> {to}")),
            _ => None,
        })
        .collect()
}

/// 一直推进到阶段变化（或空闲），返回新阶段
pub fn tick_until_phase_changes(
    orchestrator: &mut SceneTransitionOrchestrator,
    dt: f32,
) -> TransitionPhase {
    let start = orchestrator.phase();
    for _ in 0..10_000 {
        orchestrator.update(dt);
        if orchestrator.phase() != start {
            return orchestrator.phase();
        }
    }
    panic!("阶段 {start} 长时间没有变化");
}

/// 推进到空闲；处于等待 proceed 阶段时由动画钩子自动发信号
pub fn run_to_idle(orchestrator: &mut SceneTransitionOrchestrator, dt: f32) {
    let hook = orchestrator.event_hook();
    for _ in 0..10_000 {
        if orchestrator.phase() == TransitionPhase::AwaitingAnimationProceed {
            hook.notify_ready_to_proceed();
        }
        if !orchestrator.update(dt) {
            return;
        }
    }
    panic!("过渡长时间没有结束，当前阶段 {}", orchestrator.phase());
}
