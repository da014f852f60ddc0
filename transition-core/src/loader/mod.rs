//! # Loader 模块
//!
//! 异步场景加载代理。
//!
//! ## 延迟激活模型
//!
//! ```text
//! begin_load ──► progress 上升 ──► 停在 ceiling (0.9) ──┐
//!                                                     │ release_activation
//!                                                     ▼
//!                                   激活（不保证同步）──► is_complete
//! ```
//!
//! - 编排器把 `progress >= ceiling` 视为"可以激活"，而不是 `progress == 1`
//! - `is_complete` 只有在 **经由代理** 释放激活之后才可能为真，
//!   即使底层加载器提前报告完成也一样
//! - 所有等待都是逐 tick 轮询，不阻塞

mod simulated;

pub use simulated::{LoadControl, SimulatedSceneLoader};

use crate::error::TransitionResult;

/// 默认激活前进度上限
pub const DEFAULT_ACTIVATION_CEILING: f32 = 0.9;

/// 加载句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadHandle(pub u64);

impl std::fmt::Display for LoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoadHandle({})", self.0)
    }
}

/// 场景加载器（引擎侧协作者）
pub trait SceneLoader {
    /// 开始异步加载
    fn begin_load(&mut self, scene_id: &str) -> TransitionResult<LoadHandle>;

    /// 当前进度（引擎原始值）
    fn progress(&self, handle: LoadHandle) -> f32;

    /// 设置是否允许激活
    fn set_allow_activation(&mut self, handle: LoadHandle, allow: bool);

    /// 是否允许激活
    fn allow_activation(&self, handle: LoadHandle) -> bool;

    /// 加载是否完成（场景已激活）
    fn is_done(&self, handle: LoadHandle) -> bool;

    /// 推进一个 tick；由引擎自行驱动的加载器忽略即可
    fn update(&mut self, _dt: f32) {}

    /// 放弃加载（过渡被取消时调用）
    fn abandon(&mut self, _handle: LoadHandle) {}
}

/// 异步加载代理
///
/// 包装一次 `begin_load`，负责激活门控与进度上限判断。
#[derive(Debug, Clone)]
pub struct AsyncLoad {
    handle: LoadHandle,
    scene_id: String,
    ceiling: f32,
    released: bool,
}

impl AsyncLoad {
    /// 开始加载，激活初始被抑制
    pub fn begin(
        loader: &mut dyn SceneLoader,
        scene_id: &str,
        ceiling: f32,
    ) -> TransitionResult<Self> {
        let handle = loader.begin_load(scene_id)?;
        loader.set_allow_activation(handle, false);

        Ok(Self {
            handle,
            scene_id: scene_id.to_string(),
            ceiling,
            released: false,
        })
    }

    /// 加载句柄
    pub fn handle(&self) -> LoadHandle {
        self.handle
    }

    /// 目标场景
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// 激活前进度上限
    pub fn ceiling(&self) -> f32 {
        self.ceiling
    }

    /// 当前进度，截断到 [0, 1]
    pub fn progress(&self, loader: &dyn SceneLoader) -> f32 {
        loader.progress(self.handle).clamp(0.0, 1.0)
    }

    /// 是否已到达激活前上限
    pub fn is_ready(&self, loader: &dyn SceneLoader) -> bool {
        self.progress(loader) >= self.ceiling
    }

    /// 释放激活
    pub fn release_activation(&mut self, loader: &mut dyn SceneLoader) {
        self.released = true;
        loader.set_allow_activation(self.handle, true);
    }

    /// 是否已释放激活
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// 加载是否完成
    ///
    /// 未释放激活时恒为 `false`。
    pub fn is_complete(&self, loader: &dyn SceneLoader) -> bool {
        self.released && loader.allow_activation(self.handle) && loader.is_done(self.handle)
    }
}
