//! # Transition Core
//!
//! 场景过渡编排核心库。
//!
//! ## 架构概述
//!
//! `transition-core` 不依赖任何引擎：遮罩层、动画播放器、场景加载器
//! 都通过 trait 注入，编排器只负责按固定顺序推进过渡阶段。
//!
//! ```text
//! Host                               Orchestrator
//!   │                                     │
//!   │──── start_transition(scene) ──────►│
//!   │                                     │ update(dt)
//!   │◄─── FadeTarget / SceneLoader ──────│
//!   │                                     │
//!   │── AnimationEventHook::notify ─────►│ (锁存，下一个 tick 消费)
//! ```
//!
//! ## 核心类型
//!
//! - [`SceneTransitionOrchestrator`]：过渡状态机
//! - [`Fader`]：透明度淡入淡出
//! - [`VariantRegistry`]：过渡变体注册表
//! - [`AsyncLoad`]：延迟激活的异步加载代理
//! - [`SignalBridge`]：外部动画信号桥接
//!
//! ## 使用示例
//!
//! ```ignore
//! use transition_core::{SceneTransitionOrchestrator, SimulatedSceneLoader, TransitionConfig};
//!
//! let config = TransitionConfig::load("transitions.json");
//! let mut orchestrator = SceneTransitionOrchestrator::from_config(&config, SimulatedSceneLoader::new(0.5))?
//!     .with_cover(cover_layer);
//!
//! orchestrator.start_transition("Level2");
//! while orchestrator.update(dt) {
//!     // 渲染 ...
//! }
//! ```

pub mod collaborators;
pub mod config;
pub mod error;
pub mod fader;
pub mod latency;
pub mod loader;
pub mod orchestrator;
pub mod session;
pub mod signal;
pub mod variant;

pub use collaborators::{
    LoadingIndicator, START_TRANSITION_TRIGGER, SoundTrigger, TRANSITION_INDEX_PARAM,
    TransitionAnimator,
};
pub use config::{ProceedFallback, TransitionConfig};
pub use error::{ConfigError, FadeError, TransitionError, TransitionResult};
pub use fader::{EasingFunction, FadeEvent, FadeStatus, FadeTarget, Fader, Layer, TargetId};
pub use latency::{FixedStall, LatencyConfig, LatencyStrategy, NoLatency, RandomStall};
pub use loader::{
    AsyncLoad, DEFAULT_ACTIVATION_CEILING, LoadControl, LoadHandle, SceneLoader,
    SimulatedSceneLoader,
};
pub use orchestrator::SceneTransitionOrchestrator;
pub use session::{TransitionEvent, TransitionPhase, TransitionSession};
pub use signal::{AnimationEventHook, CancelToken, SignalBridge};
pub use variant::{TransitionVariant, VariantRegistry};
