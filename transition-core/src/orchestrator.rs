//! # Orchestrator 模块
//!
//! 场景过渡编排器：单线程、逐 tick 推进的显式状态机。
//!
//! ## 执行模型
//!
//! ```text
//! start_transition(scene) ──► 创建会话 ──► CoverFadingIn
//!
//! 每帧 update(dt):
//!   1. 检查取消令牌
//!   2. 推进 Fader / 加载器 / 停顿计时 / proceed 等待计时
//!   3. 依次尝试推进阶段，直到遇到尚未满足的等待条件
//! ```
//!
//! 所有等待都在 tick 之间挂起，从不阻塞。
//! AwaitingAnimationProceed 阶段的"过渡图层淡入"与"proceed 信号"是 **都满足** 才继续。
//!
//! 编排器是显式构造、显式传递的服务实例，不提供全局访问点。

use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

use crate::collaborators::{
    LoadingIndicator, START_TRANSITION_TRIGGER, SoundTrigger, TRANSITION_INDEX_PARAM,
    TransitionAnimator,
};
use crate::config::{ProceedFallback, TransitionConfig};
use crate::error::{TransitionError, TransitionResult};
use crate::fader::{EasingFunction, FadeTarget, Fader, TargetId};
use crate::latency::{LatencyStrategy, NoLatency};
use crate::loader::{AsyncLoad, DEFAULT_ACTIVATION_CEILING, SceneLoader};
use crate::session::{TransitionEvent, TransitionPhase, TransitionSession};
use crate::signal::{AnimationEventHook, CancelToken, SignalBridge};
use crate::variant::{TransitionVariant, VariantRegistry};

/// 场景过渡编排器
pub struct SceneTransitionOrchestrator {
    registry: VariantRegistry,
    loader: Box<dyn SceneLoader>,
    fader: Fader,
    /// 遮罩层
    cover: Option<TargetId>,
    /// 过渡图层
    secondary: Option<TargetId>,
    animator: Option<Box<dyn TransitionAnimator>>,
    indicator: Option<Box<dyn LoadingIndicator>>,
    latency: Box<dyn LatencyStrategy>,
    signals: SignalBridge,
    cancel: CancelToken,
    rng: StdRng,
    activation_ceiling: f32,
    proceed_fallback: ProceedFallback,
    /// 进行中的会话；存在即表示"过渡中"
    session: Option<TransitionSession>,
    events: Vec<TransitionEvent>,
}

impl std::fmt::Debug for SceneTransitionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneTransitionOrchestrator")
            .field("phase", &self.phase())
            .field("variants", &self.registry.len())
            .field("has_cover", &self.cover.is_some())
            .field("has_secondary", &self.secondary.is_some())
            .field("has_animator", &self.animator.is_some())
            .field("session", &self.session)
            .finish()
    }
}

impl SceneTransitionOrchestrator {
    /// 创建编排器
    ///
    /// 默认：无遮罩、无动画、无模拟延迟、不兜底 proceed、随机种子取自系统熵源。
    pub fn new(registry: VariantRegistry, loader: impl SceneLoader + 'static) -> Self {
        Self {
            registry,
            loader: Box::new(loader),
            fader: Fader::new(),
            cover: None,
            secondary: None,
            animator: None,
            indicator: None,
            latency: Box::new(NoLatency),
            signals: SignalBridge::new(),
            cancel: CancelToken::new(),
            rng: StdRng::from_entropy(),
            activation_ceiling: DEFAULT_ACTIVATION_CEILING,
            proceed_fallback: ProceedFallback::None,
            session: None,
            events: Vec::new(),
        }
    }

    /// 按配置创建编排器
    pub fn from_config(
        config: &TransitionConfig,
        loader: impl SceneLoader + 'static,
    ) -> TransitionResult<Self> {
        let mut orchestrator = Self::new(config.registry()?, loader)
            .with_activation_ceiling(config.activation_ceiling)
            .with_proceed_fallback(config.proceed_fallback)
            .with_easing(config.easing);
        orchestrator.latency = config.latency.build(config.seed);
        if let Some(seed) = config.seed {
            orchestrator = orchestrator.with_seed(seed);
        }
        Ok(orchestrator)
    }

    // ========== 协作者装配 ==========

    /// 设置遮罩层
    pub fn with_cover(mut self, target: Rc<dyn FadeTarget>) -> Self {
        if let Some(old) = self.cover.take() {
            self.fader.unregister(old);
        }
        self.cover = Some(self.fader.register(target));
        self
    }

    /// 设置过渡图层
    pub fn with_secondary(mut self, target: Rc<dyn FadeTarget>) -> Self {
        if let Some(old) = self.secondary.take() {
            self.fader.unregister(old);
        }
        self.secondary = Some(self.fader.register(target));
        self
    }

    /// 设置过渡动画播放器
    pub fn with_animator(mut self, animator: impl TransitionAnimator + 'static) -> Self {
        self.animator = Some(Box::new(animator));
        self
    }

    /// 设置加载指示器
    pub fn with_loading_indicator(mut self, indicator: impl LoadingIndicator + 'static) -> Self {
        self.indicator = Some(Box::new(indicator));
        self
    }

    /// 设置过渡音效（由动画事件钩子触发）
    pub fn with_sound(self, sound: Rc<dyn SoundTrigger>) -> Self {
        self.signals.set_sound(Some(sound));
        self
    }

    /// 设置模拟延迟策略
    pub fn with_latency(mut self, latency: impl LatencyStrategy + 'static) -> Self {
        self.latency = Box::new(latency);
        self
    }

    /// 固定随机种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 设置激活前进度上限
    pub fn with_activation_ceiling(mut self, ceiling: f32) -> Self {
        self.activation_ceiling = ceiling.clamp(0.0, 1.0);
        self
    }

    /// 设置 proceed 兜底策略
    pub fn with_proceed_fallback(mut self, fallback: ProceedFallback) -> Self {
        self.proceed_fallback = fallback;
        self
    }

    /// 设置淡入淡出缓动
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.fader.set_easing(easing);
        self
    }

    // ========== 外部接口 ==========

    /// 开始过渡
    ///
    /// 任何失败都只记录日志并返回 `false`：
    /// - 已有过渡进行中：请求被丢弃，不排队
    /// - 变体注册表为空
    pub fn start_transition(&mut self, scene_id: impl Into<String>) -> bool {
        self.try_start_transition(scene_id).is_ok()
    }

    /// 开始过渡，失败时返回错误（错误同样已记录日志）
    pub fn try_start_transition(&mut self, scene_id: impl Into<String>) -> TransitionResult<()> {
        let scene_id = scene_id.into();

        // 会话存在即为"过渡中"：检查与创建都在同一个 &mut self 内完成
        if let Some(active) = &self.session {
            let error = TransitionError::AlreadyInProgress {
                requested: scene_id,
                active: active.target_scene_id.clone(),
            };
            warn!(%error, "过渡进行中，忽略新的过渡请求");
            self.events.push(TransitionEvent::Rejected {
                error: error.clone(),
            });
            return Err(error);
        }

        let variant = match self.registry.select_random(&mut self.rng) {
            Ok(variant) => variant,
            Err(error) => {
                error!(scene_id = %scene_id, %error, "无法选择过渡变体");
                self.events.push(TransitionEvent::Rejected {
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        info!(scene_id = %scene_id, variant = %variant.label(), "开始场景过渡");

        // 会话外的取消请求不影响新会话
        self.cancel.take();
        self.signals.open_session();
        self.events.push(TransitionEvent::Started {
            scene_id: scene_id.clone(),
            variant_index: variant.index,
        });
        self.session = Some(TransitionSession::new(scene_id, variant));

        self.enter(TransitionPhase::CoverFadingIn);
        self.advance();
        Ok(())
    }

    /// 动画通知：画面已被遮住，可以激活下一个场景
    ///
    /// 没有进行中的会话时为空操作。
    pub fn notify_ready_to_proceed(&mut self) {
        match self.session.as_mut() {
            Some(session) => {
                self.signals.notify_ready_to_proceed();
                session.proceed_signaled = true;
            }
            None => debug!("没有进行中的过渡，忽略 proceed 信号"),
        }
    }

    /// 推进一个 tick
    ///
    /// # 返回
    /// - `true`: 过渡仍在进行中
    /// - `false`: 空闲（本次 tick 内完成、被取消，或本来就空闲）
    pub fn update(&mut self, dt: f32) -> bool {
        if self.session.is_none() {
            return false;
        }

        if self.cancel.take() {
            self.cancel();
            return false;
        }

        let dt = dt.max(0.0);
        self.fader.update(dt);
        self.loader.update(dt);

        if let Some(session) = self.session.as_mut() {
            if session.stall_remaining > 0.0 {
                session.stall_remaining = (session.stall_remaining - dt).max(0.0);
            }
            if session.phase == TransitionPhase::AwaitingAnimationProceed {
                session.proceed_wait += dt;
            }
        }

        self.check_proceed_fallback();
        self.advance();
        self.session.is_some()
    }

    /// 取消进行中的过渡
    ///
    /// 停止所有淡入淡出，遮罩与过渡图层归零，放弃尚未激活的加载。
    ///
    /// # 返回
    /// 是否确实取消了一个会话
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        if let Some(load) = &session.load
            && !load.is_released()
        {
            self.loader.abandon(load.handle());
        }

        for target in [self.cover, self.secondary].into_iter().flatten() {
            if let Err(e) = self.fader.set_opacity(target, 0.0) {
                warn!(error = %e, "取消过渡时重置图层失败");
            }
        }

        if session.indicator_shown
            && let Some(indicator) = self.indicator.as_mut()
        {
            indicator.set_active(false);
        }

        self.signals.close_session();
        warn!(scene_id = %session.target_scene_id, phase = ?session.phase, "过渡已取消");
        self.events.push(TransitionEvent::PhaseChanged {
            from: session.phase,
            to: TransitionPhase::Idle,
        });
        self.events.push(TransitionEvent::Cancelled {
            scene_id: session.target_scene_id,
        });
        true
    }

    /// 跳过当前所有淡入淡出（下一次 tick 生效）
    pub fn skip_fades(&mut self) {
        self.fader.skip_all();
    }

    // ========== 查询方法 ==========

    /// 当前阶段
    pub fn phase(&self) -> TransitionPhase {
        self.session
            .as_ref()
            .map_or(TransitionPhase::Idle, |s| s.phase)
    }

    /// 是否正在过渡
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// 进行中的会话
    pub fn session(&self) -> Option<&TransitionSession> {
        self.session.as_ref()
    }

    /// 取出累积的事件
    pub fn take_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    /// 交给动画系统的事件钩子
    pub fn event_hook(&self) -> AnimationEventHook {
        self.signals.hook()
    }

    /// 取消令牌
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 变体注册表
    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// 淡入淡出系统
    pub fn fader(&self) -> &Fader {
        &self.fader
    }

    // ========== 状态机 ==========

    /// 在本 tick 内尽可能推进阶段
    fn advance(&mut self) {
        while let Some(next) = self.next_phase() {
            self.enter(next);
        }
    }

    /// 当前阶段的等待条件已满足时，返回下一阶段
    fn next_phase(&mut self) -> Option<TransitionPhase> {
        use TransitionPhase::*;

        let session = self.session.as_mut()?;
        match session.phase {
            Idle | Done => None,
            CoverFadingIn => (!is_fading(&self.fader, self.cover)).then_some(Loading),
            Loading => {
                if session.is_stalled() {
                    return None;
                }
                let load = session.load.as_ref()?;
                session.load_progress = load.progress(&*self.loader);
                load.is_ready(&*self.loader)
                    .then_some(AwaitingAnimationProceed)
            }
            AwaitingAnimationProceed => {
                if self.signals.is_proceed_pending() {
                    session.proceed_signaled = true;
                }
                if session.proceed_signaled && !is_fading(&self.fader, self.secondary) {
                    self.signals.take_proceed();
                    Some(Activating)
                } else {
                    None
                }
            }
            Activating => {
                let load = session.load.as_ref()?;
                session.load_progress = load.progress(&*self.loader);
                if load.is_complete(&*self.loader) {
                    session.load_complete = true;
                    Some(SecondaryFadingOut)
                } else {
                    None
                }
            }
            SecondaryFadingOut => {
                (!is_fading(&self.fader, self.secondary)).then_some(CoverFadingOut)
            }
            CoverFadingOut => (!is_fading(&self.fader, self.cover)).then_some(Done),
        }
    }

    /// 进入新阶段并执行入口动作
    fn enter(&mut self, next: TransitionPhase) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let from = std::mem::replace(&mut session.phase, next);
        let variant = session.variant.clone();
        let scene_id = session.target_scene_id.clone();

        debug!(scene_id = %scene_id, ?from, to = ?next, "过渡阶段切换");
        self.events
            .push(TransitionEvent::PhaseChanged { from, to: next });

        match next {
            TransitionPhase::Idle => {}
            TransitionPhase::CoverFadingIn => {
                self.fade_layer(self.cover, "cover", 1.0, variant.cover_appear);
            }
            TransitionPhase::Loading => self.begin_loading(&scene_id),
            TransitionPhase::AwaitingAnimationProceed => self.begin_reveal(&variant),
            TransitionPhase::Activating => self.release_activation(),
            TransitionPhase::SecondaryFadingOut => {
                if variant.needs_secondary_fade {
                    self.fade_layer(self.secondary, "secondary", 0.0, variant.cover_appear);
                }
            }
            TransitionPhase::CoverFadingOut => {
                self.fade_layer(self.cover, "cover", 0.0, variant.cover_disappear);
            }
            TransitionPhase::Done => self.finish(),
        }
    }

    fn fade_layer(&mut self, target: Option<TargetId>, role: &str, to: f32, duration: f32) {
        let Some(id) = target else {
            debug!(role, "未配置图层，跳过淡入淡出");
            return;
        };
        if let Err(e) = self.fader.fade_to(id, to, duration) {
            warn!(role, error = %e, "淡入淡出启动失败，视为已完成");
        }
    }

    fn begin_loading(&mut self, scene_id: &str) {
        match AsyncLoad::begin(&mut *self.loader, scene_id, self.activation_ceiling) {
            Ok(load) => {
                debug!(scene_id, handle = %load.handle(), "开始异步加载（激活已抑制）");
                let stall = self.latency.stall();
                let has_indicator = self.indicator.is_some();

                if let Some(session) = self.session.as_mut() {
                    session.load = Some(load);
                    if let Some(seconds) = stall {
                        session.stall_remaining = seconds;
                        session.indicator_shown = has_indicator;
                    }
                }

                if let Some(seconds) = stall {
                    info!(scene_id, seconds, "注入模拟加载延迟");
                    self.events.push(TransitionEvent::StallInjected { seconds });
                    if let Some(indicator) = self.indicator.as_mut() {
                        indicator.set_active(true);
                    }
                }
            }
            Err(error) => {
                error!(scene_id, %error, "场景加载失败，中止过渡");
                if let Some(session) = self.session.as_mut() {
                    session.failure = Some(error);
                }
                self.enter(TransitionPhase::CoverFadingOut);
            }
        }
    }

    fn begin_reveal(&mut self, variant: &TransitionVariant) {
        // 准备过渡图层：需要淡入时先归零，否则直接完全显示
        if let Some(id) = self.secondary {
            let initial = if variant.needs_secondary_fade { 0.0 } else { 1.0 };
            if let Err(e) = self.fader.set_opacity(id, initial) {
                warn!(error = %e, "准备过渡图层失败");
            }
        }

        let indicator_shown = self
            .session
            .as_mut()
            .is_some_and(|s| std::mem::take(&mut s.indicator_shown));
        if indicator_shown && let Some(indicator) = self.indicator.as_mut() {
            indicator.set_active(false);
        }

        match self.animator.as_mut() {
            Some(animator) => {
                let index = i32::try_from(variant.index).unwrap_or(i32::MAX);
                animator.set_integer(TRANSITION_INDEX_PARAM, index);
                animator.set_trigger(START_TRANSITION_TRIGGER);
                debug!(variant = %variant.label(), "已触发过渡动画");
                self.events.push(TransitionEvent::AnimatorTriggered {
                    variant_index: variant.index,
                });
            }
            None => debug!("未配置动画播放器，跳过触发"),
        }

        if variant.needs_secondary_fade {
            self.fade_layer(self.secondary, "secondary", 1.0, variant.cover_disappear);
        }
    }

    fn release_activation(&mut self) {
        if let Some(session) = self.session.as_mut()
            && let Some(load) = session.load.as_mut()
        {
            load.release_activation(&mut *self.loader);
            debug!(scene_id = %session.target_scene_id, "已释放场景激活");
            self.events.push(TransitionEvent::ActivationReleased);
        }
    }

    fn check_proceed_fallback(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase != TransitionPhase::AwaitingAnimationProceed || session.proceed_signaled
        {
            return;
        }

        let limit = match self.proceed_fallback {
            ProceedFallback::None => return,
            ProceedFallback::Timeout { seconds } => seconds,
            ProceedFallback::ClipLength { grace } => {
                match self.animator.as_ref().and_then(|a| a.current_clip_length()) {
                    Some(length) => length + grace,
                    None => return,
                }
            }
        };

        if session.proceed_wait >= limit {
            let waited = session.proceed_wait;
            let error = TransitionError::ProceedTimeout { waited };
            warn!(scene_id = %session.target_scene_id, %error, "按兜底策略继续过渡");
            session.proceed_signaled = true;
            self.events
                .push(TransitionEvent::ProceedTimedOut { waited });
        }
    }

    fn finish(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.signals.close_session();
        self.events.push(TransitionEvent::PhaseChanged {
            from: TransitionPhase::Done,
            to: TransitionPhase::Idle,
        });

        match session.failure {
            Some(error) => {
                warn!(scene_id = %session.target_scene_id, %error, "过渡已中止");
                self.events.push(TransitionEvent::Aborted { error });
            }
            None => {
                info!(scene_id = %session.target_scene_id, "场景过渡完成");
                self.events.push(TransitionEvent::Completed {
                    scene_id: session.target_scene_id,
                });
            }
        }
    }
}

fn is_fading(fader: &Fader, target: Option<TargetId>) -> bool {
    target.is_some_and(|id| fader.is_fading(id))
}
