//! # Signal 模块
//!
//! 外部信号桥接。
//!
//! 动画系统在"画面已被完全遮住"的时间点通过动画事件回调通知编排器，
//! 这个回调不在编排器的控制流内。编排器把 `AnimationEventHook` 交给动画系统，
//! 自己在 tick 中读取锁存的信号，而不是被回调直接推进。
//!
//! ```text
//! Animator 事件 ──► AnimationEventHook::notify_ready_to_proceed()
//!                          │ (锁存，会话外丢弃)
//!                          ▼
//!        Orchestrator::update() ──► SignalBridge::take_proceed()
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::collaborators::SoundTrigger;

#[derive(Default)]
struct SignalState {
    session_active: Cell<bool>,
    proceed: Cell<bool>,
    sound: RefCell<Option<Rc<dyn SoundTrigger>>>,
}

/// 信号桥（编排器持有）
pub struct SignalBridge {
    state: Rc<SignalState>,
}

/// 交给动画系统的事件钩子
#[derive(Clone)]
pub struct AnimationEventHook {
    state: Rc<SignalState>,
}

impl Default for SignalBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SignalBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBridge")
            .field("session_active", &self.state.session_active.get())
            .field("proceed", &self.state.proceed.get())
            .field("has_sound", &self.state.sound.borrow().is_some())
            .finish()
    }
}

impl std::fmt::Debug for AnimationEventHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationEventHook")
            .field("session_active", &self.state.session_active.get())
            .finish()
    }
}

impl SignalBridge {
    /// 创建信号桥
    pub fn new() -> Self {
        Self {
            state: Rc::new(SignalState::default()),
        }
    }

    /// 设置过渡音效（所有已发出的钩子同时生效）
    pub fn set_sound(&self, sound: Option<Rc<dyn SoundTrigger>>) {
        *self.state.sound.borrow_mut() = sound;
    }

    /// 获取事件钩子
    pub fn hook(&self) -> AnimationEventHook {
        AnimationEventHook {
            state: self.state.clone(),
        }
    }

    /// 会话开始：清除上一次残留的信号
    pub fn open_session(&self) {
        self.state.session_active.set(true);
        self.state.proceed.set(false);
    }

    /// 会话结束
    pub fn close_session(&self) {
        self.state.session_active.set(false);
        self.state.proceed.set(false);
    }

    /// 是否有未消费的 proceed 信号
    pub fn is_proceed_pending(&self) -> bool {
        self.state.proceed.get()
    }

    /// 消费 proceed 信号
    pub fn take_proceed(&self) -> bool {
        self.state.proceed.replace(false)
    }

    /// 直接发出 proceed 信号（与钩子行为一致）
    pub fn notify_ready_to_proceed(&self) -> bool {
        self.hook().notify_ready_to_proceed()
    }
}

impl AnimationEventHook {
    /// 动画已完全遮住画面，可以激活下一个场景
    ///
    /// 没有进行中的会话时丢弃，返回 `false`。
    pub fn notify_ready_to_proceed(&self) -> bool {
        if !self.state.session_active.get() {
            debug!("没有进行中的过渡，忽略 proceed 信号");
            return false;
        }
        self.state.proceed.set(true);
        true
    }

    /// 动画事件名的别名
    pub fn load_next_scene(&self) -> bool {
        self.notify_ready_to_proceed()
    }

    /// 动画事件：播放过渡音效
    pub fn play_transition_sound(&self) {
        match self.state.sound.borrow().as_ref() {
            Some(sound) => sound.play(),
            None => warn!("未配置过渡音效，忽略播放请求"),
        }
    }

    /// 是否有进行中的会话
    pub fn is_session_active(&self) -> bool {
        self.state.session_active.get()
    }
}

/// 取消令牌
///
/// 可克隆给任意调用方；编排器在每个 tick 检查。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    /// 创建令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// 是否已请求取消
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// 消费取消请求
    pub(crate) fn take(&self) -> bool {
        self.cancelled.replace(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSound(Cell<u32>);

    impl SoundTrigger for CountingSound {
        fn play(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_pulse_outside_session_is_dropped() {
        let bridge = SignalBridge::new();
        let hook = bridge.hook();

        assert!(!hook.notify_ready_to_proceed());
        assert!(!bridge.is_proceed_pending());

        bridge.open_session();
        assert!(hook.load_next_scene());
        assert!(bridge.is_proceed_pending());
        assert!(bridge.take_proceed());
        assert!(!bridge.take_proceed());
    }

    #[test]
    fn test_open_session_clears_stale_signal() {
        let bridge = SignalBridge::new();
        bridge.open_session();
        bridge.notify_ready_to_proceed();
        bridge.close_session();

        bridge.open_session();
        assert!(!bridge.is_proceed_pending());
    }

    #[test]
    fn test_sound_forwarding() {
        let bridge = SignalBridge::new();
        let hook = bridge.hook();
        hook.play_transition_sound();

        let sound = Rc::new(CountingSound(Cell::new(0)));
        bridge.set_sound(Some(sound.clone()));
        hook.play_transition_sound();
        hook.play_transition_sound();
        assert_eq!(sound.0.get(), 2);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(token.take());
        assert!(!token.is_cancelled());
    }
}
