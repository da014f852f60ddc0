//! 模拟场景加载器
//!
//! 不依赖任何引擎：进度按固定速率上升，到达上限后等待激活释放，
//! 释放后再经过 `activation_delay` 才报告完成。
//!
//! `LoadControl` 与加载器共享状态，测试 / headless 驱动可以直接改写进度。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::{DEFAULT_ACTIVATION_CEILING, LoadHandle, SceneLoader};
use crate::error::{TransitionError, TransitionResult};

#[derive(Debug, Clone)]
struct LoadEntry {
    scene_id: String,
    progress: f32,
    allow_activation: bool,
    activation_elapsed: f32,
    done: bool,
}

#[derive(Debug)]
struct SimulatedState {
    loads: HashMap<LoadHandle, LoadEntry>,
    next_handle: u64,
    /// 每秒进度增量；`None` 表示只能通过 `LoadControl` 手动推进
    rate: Option<f32>,
    ceiling: f32,
    activation_delay: f32,
    known_scenes: Option<Vec<String>>,
    active_scene: Option<String>,
    latest: Option<LoadHandle>,
}

/// 模拟场景加载器
#[derive(Debug, Clone)]
pub struct SimulatedSceneLoader {
    state: Rc<RefCell<SimulatedState>>,
}

/// 模拟加载器的外部控制句柄
#[derive(Debug, Clone)]
pub struct LoadControl {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedSceneLoader {
    /// 按 `rate`（每秒进度）自动推进的加载器
    pub fn new(rate: f32) -> Self {
        Self::build(Some(rate.max(0.0)))
    }

    /// 只能手动推进的加载器
    pub fn manual() -> (Self, LoadControl) {
        let loader = Self::build(None);
        let control = loader.control();
        (loader, control)
    }

    fn build(rate: Option<f32>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimulatedState {
                loads: HashMap::new(),
                next_handle: 1,
                rate,
                ceiling: DEFAULT_ACTIVATION_CEILING,
                activation_delay: 0.0,
                known_scenes: None,
                active_scene: None,
                latest: None,
            })),
        }
    }

    /// 设置激活前进度上限
    pub fn with_ceiling(self, ceiling: f32) -> Self {
        self.state.borrow_mut().ceiling = ceiling.clamp(0.0, 1.0);
        self
    }

    /// 设置释放激活后到完成的延迟（秒）
    pub fn with_activation_delay(self, seconds: f32) -> Self {
        self.state.borrow_mut().activation_delay = seconds.max(0.0);
        self
    }

    /// 限定可加载的场景，其他场景 `begin_load` 失败
    pub fn with_known_scenes<I, S>(self, scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.borrow_mut().known_scenes = Some(scenes.into_iter().map(Into::into).collect());
        self
    }

    /// 获取控制句柄
    pub fn control(&self) -> LoadControl {
        LoadControl {
            state: self.state.clone(),
        }
    }
}

impl SceneLoader for SimulatedSceneLoader {
    fn begin_load(&mut self, scene_id: &str) -> TransitionResult<LoadHandle> {
        let mut state = self.state.borrow_mut();

        if let Some(known) = &state.known_scenes
            && !known.iter().any(|s| s == scene_id)
        {
            return Err(TransitionError::LoadFailed {
                scene_id: scene_id.to_string(),
                message: "场景不存在".to_string(),
            });
        }

        let handle = LoadHandle(state.next_handle);
        state.next_handle += 1;
        state.loads.insert(
            handle,
            LoadEntry {
                scene_id: scene_id.to_string(),
                progress: 0.0,
                allow_activation: true,
                activation_elapsed: 0.0,
                done: false,
            },
        );
        state.latest = Some(handle);
        debug!(scene_id, %handle, "模拟加载开始");
        Ok(handle)
    }

    fn progress(&self, handle: LoadHandle) -> f32 {
        self.state
            .borrow()
            .loads
            .get(&handle)
            .map_or(0.0, |e| e.progress)
    }

    fn set_allow_activation(&mut self, handle: LoadHandle, allow: bool) {
        if let Some(entry) = self.state.borrow_mut().loads.get_mut(&handle) {
            entry.allow_activation = allow;
        }
    }

    fn allow_activation(&self, handle: LoadHandle) -> bool {
        self.state
            .borrow()
            .loads
            .get(&handle)
            .is_some_and(|e| e.allow_activation)
    }

    fn is_done(&self, handle: LoadHandle) -> bool {
        self.state
            .borrow()
            .loads
            .get(&handle)
            .is_some_and(|e| e.done)
    }

    fn update(&mut self, dt: f32) {
        let mut state = self.state.borrow_mut();
        let SimulatedState {
            loads,
            rate,
            ceiling,
            activation_delay,
            active_scene,
            ..
        } = &mut *state;

        for entry in loads.values_mut() {
            if entry.done {
                continue;
            }

            if let Some(rate) = rate {
                entry.progress = (entry.progress + *rate * dt).min(*ceiling);
            }

            if entry.allow_activation && entry.progress >= *ceiling {
                entry.activation_elapsed += dt;
                if entry.activation_elapsed >= *activation_delay {
                    entry.progress = 1.0;
                    entry.done = true;
                    *active_scene = Some(entry.scene_id.clone());
                    debug!(scene_id = %entry.scene_id, "模拟场景已激活");
                }
            }
        }
    }

    fn abandon(&mut self, handle: LoadHandle) {
        self.state.borrow_mut().loads.remove(&handle);
    }
}

impl LoadControl {
    /// 设置最近一次加载的进度（截断到上限）
    pub fn set_progress(&self, progress: f32) {
        let mut state = self.state.borrow_mut();
        let ceiling = state.ceiling;
        if let Some(handle) = state.latest
            && let Some(entry) = state.loads.get_mut(&handle)
            && !entry.done
        {
            entry.progress = progress.clamp(0.0, ceiling);
        }
    }

    /// 最近一次加载的进度
    pub fn progress(&self) -> Option<f32> {
        let state = self.state.borrow();
        state
            .latest
            .and_then(|h| state.loads.get(&h))
            .map(|e| e.progress)
    }

    /// 最近一次加载是否允许激活
    pub fn allow_activation(&self) -> Option<bool> {
        let state = self.state.borrow();
        state
            .latest
            .and_then(|h| state.loads.get(&h))
            .map(|e| e.allow_activation)
    }

    /// 当前已激活的场景
    pub fn active_scene(&self) -> Option<String> {
        self.state.borrow().active_scene.clone()
    }

    /// 已发起的加载次数
    pub fn load_count(&self) -> usize {
        (self.state.borrow().next_handle - 1) as usize
    }
}
