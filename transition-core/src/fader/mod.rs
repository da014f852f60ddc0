//! # Fader 模块
//!
//! 透明度淡入淡出系统，负责驱动遮罩层 / 过渡图层的透明度。
//!
//! ## 核心设计理念
//!
//! Fader 只负责 **时间轴管理**：
//! - 目标注册后获得 `TargetId`
//! - `fade_to` 从目标**当前**透明度出发，在 duration 内变化到目标值
//! - 每个 tick 由 `update(dt)` 推进，并直接写入目标
//!
//! 同一目标上再次调用 `fade_to` 会替换旧的淡入淡出，从当前值重新开始。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let mut fader = Fader::new();
//! let cover = fader.register(Rc::new(Layer::transparent("cover")));
//!
//! fader.fade_to(cover, 1.0, 0.2)?;
//! while fader.is_fading(cover) {
//!     fader.update(dt);
//! }
//! ```

mod easing;
mod fade;
mod target;

use std::collections::HashMap;
use std::rc::Rc;

pub use easing::EasingFunction;
pub use fade::{Fade, FadeSample, FadeState, FadeTicks};
pub use target::{FadeTarget, Layer, TargetId};

use crate::error::FadeError;

/// 淡入淡出事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEvent {
    /// 开始
    Started(TargetId),
    /// 完成
    Completed(TargetId),
    /// 被跳过
    Skipped(TargetId),
}

/// `fade_to` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStatus {
    /// 已同步完成（duration 为 0），无需等待
    Finished,
    /// 进行中，需要后续 tick 推进
    Running,
}

/// 淡入淡出系统
pub struct Fader {
    targets: HashMap<TargetId, Rc<dyn FadeTarget>>,
    fades: HashMap<TargetId, Fade>,
    easing: EasingFunction,
    next_target_id: u64,
    events: Vec<FadeEvent>,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fader")
            .field("targets", &self.targets.len())
            .field("fades", &self.fades.len())
            .field("easing", &self.easing)
            .finish()
    }
}

impl Fader {
    /// 创建新的淡入淡出系统（线性插值）
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
            fades: HashMap::new(),
            easing: EasingFunction::default(),
            next_target_id: 1,
            events: Vec::new(),
        }
    }

    /// 设置后续淡入淡出使用的缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 修改缓动函数（只影响之后开始的淡入淡出）
    pub fn set_easing(&mut self, easing: EasingFunction) {
        self.easing = easing;
    }

    // ========== 目标管理 ==========

    /// 注册目标，返回系统分配的 `TargetId`
    pub fn register(&mut self, target: Rc<dyn FadeTarget>) -> TargetId {
        let id = TargetId::new(self.next_target_id);
        self.next_target_id += 1;
        self.targets.insert(id, target);
        id
    }

    /// 注销目标及其进行中的淡入淡出
    pub fn unregister(&mut self, id: TargetId) {
        self.targets.remove(&id);
        self.fades.remove(&id);
    }

    /// 读取目标当前透明度
    pub fn opacity(&self, id: TargetId) -> Option<f32> {
        self.targets.get(&id).map(|t| t.opacity())
    }

    /// 直接设置透明度（取消该目标上进行中的淡入淡出）
    pub fn set_opacity(&mut self, id: TargetId, value: f32) -> Result<(), FadeError> {
        let target = self.targets.get(&id).ok_or(FadeError::UnknownTarget(id))?;
        self.fades.remove(&id);
        target.set_opacity(value);
        Ok(())
    }

    // ========== 淡入淡出控制 ==========

    /// 从当前透明度淡到 `to`
    ///
    /// - `duration <= 0`：立即写入 `to`，返回 `FadeStatus::Finished`
    /// - 否则：替换该目标上已有的淡入淡出，返回 `FadeStatus::Running`
    pub fn fade_to(
        &mut self,
        id: TargetId,
        to: f32,
        duration: f32,
    ) -> Result<FadeStatus, FadeError> {
        let target = self.targets.get(&id).ok_or(FadeError::UnknownTarget(id))?;

        // 旧的淡入淡出已经把中间值写进目标，直接丢弃即可
        self.fades.remove(&id);

        let to = to.clamp(0.0, 1.0);
        if duration <= 0.0 {
            target.set_opacity(to);
            self.events.push(FadeEvent::Completed(id));
            return Ok(FadeStatus::Finished);
        }

        let fade = Fade::new(target.opacity(), to, duration).with_easing(self.easing);
        self.fades.insert(id, fade);
        self.events.push(FadeEvent::Started(id));
        Ok(FadeStatus::Running)
    }

    /// 推进所有淡入淡出
    ///
    /// # 返回
    /// 本次产生的事件（包含 `update` 之前由 `fade_to` 产生的事件）
    pub fn update(&mut self, dt: f32) -> Vec<FadeEvent> {
        let mut finished = Vec::new();

        for (id, fade) in &mut self.fades {
            fade.update(dt);
            if let Some(target) = self.targets.get(id) {
                target.set_opacity(fade.current_value());
            }
            if fade.is_finished() {
                finished.push(*id);
            }
        }

        for id in finished {
            if let Some(fade) = self.fades.remove(&id) {
                let event = if fade.state == FadeState::Skipped {
                    FadeEvent::Skipped(id)
                } else {
                    FadeEvent::Completed(id)
                };
                self.events.push(event);
            }
        }

        std::mem::take(&mut self.events)
    }

    /// 跳过所有淡入淡出，立即写入目标值
    pub fn skip_all(&mut self) {
        for (id, fade) in self.fades.drain() {
            if let Some(target) = self.targets.get(&id) {
                target.set_opacity(fade.to);
            }
            self.events.push(FadeEvent::Skipped(id));
        }
    }

    /// 取消目标上的淡入淡出，透明度停留在当前值
    pub fn cancel(&mut self, id: TargetId) {
        self.fades.remove(&id);
    }

    /// 清空所有淡入淡出与事件（已注册目标保留）
    pub fn clear(&mut self) {
        self.fades.clear();
        self.events.clear();
    }

    // ========== 查询方法 ==========

    /// 目标是否正在淡入淡出
    pub fn is_fading(&self, id: TargetId) -> bool {
        self.fades.get(&id).is_some_and(|f| !f.is_finished())
    }

    /// 是否有进行中的淡入淡出
    pub fn has_active_fades(&self) -> bool {
        self.fades.values().any(|f| !f.is_finished())
    }

    /// 进行中的淡入淡出数量
    pub fn active_count(&self) -> usize {
        self.fades.values().filter(|f| !f.is_finished()).count()
    }

    /// 已注册目标数量
    pub fn registered_count(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Fader, Rc<Layer>, TargetId) {
        let mut fader = Fader::new();
        let layer = Rc::new(Layer::transparent("cover"));
        let id = fader.register(layer.clone());
        (fader, layer, id)
    }

    #[test]
    fn test_fade_to_drives_target() {
        let (mut fader, layer, id) = setup();

        assert_eq!(fader.fade_to(id, 1.0, 0.5).unwrap(), FadeStatus::Running);
        assert!(fader.is_fading(id));
        assert_eq!(layer.opacity(), 0.0);

        fader.update(0.25);
        assert_eq!(layer.opacity(), 0.5);

        let events = fader.update(0.25);
        assert_eq!(layer.opacity(), 1.0);
        assert!(!fader.is_fading(id));
        assert!(events.contains(&FadeEvent::Completed(id)));
    }

    #[test]
    fn test_zero_duration_is_synchronous() {
        let (mut fader, layer, id) = setup();

        assert_eq!(fader.fade_to(id, 1.0, 0.0).unwrap(), FadeStatus::Finished);
        assert_eq!(layer.opacity(), 1.0);
        assert!(!fader.has_active_fades());
    }

    #[test]
    fn test_restart_reads_current_opacity() {
        let (mut fader, layer, id) = setup();

        fader.fade_to(id, 1.0, 1.0).unwrap();
        fader.update(0.5);
        assert_eq!(layer.opacity(), 0.5);

        // 中途重新淡入：从 0.5 出发，而不是从 0 重来
        fader.fade_to(id, 1.0, 1.0).unwrap();
        assert_eq!(layer.opacity(), 0.5);
        fader.update(0.5);
        assert_eq!(layer.opacity(), 0.75);
        assert_eq!(fader.active_count(), 1);
    }

    #[test]
    fn test_unknown_target() {
        let (mut fader, _layer, id) = setup();
        fader.unregister(id);
        assert_eq!(
            fader.fade_to(id, 1.0, 1.0),
            Err(FadeError::UnknownTarget(id))
        );

        let missing = TargetId::new(99);
        assert_eq!(
            fader.fade_to(missing, 1.0, 1.0),
            Err(FadeError::UnknownTarget(missing))
        );
    }

    #[test]
    fn test_skip_all() {
        let (mut fader, layer, id) = setup();
        fader.fade_to(id, 1.0, 3.0).unwrap();
        fader.update(0.1);

        fader.skip_all();
        assert_eq!(layer.opacity(), 1.0);
        assert!(!fader.is_fading(id));
        assert!(fader.update(0.0).contains(&FadeEvent::Skipped(id)));
    }

    #[test]
    fn test_cancel_keeps_current_value() {
        let (mut fader, layer, id) = setup();
        fader.fade_to(id, 1.0, 1.0).unwrap();
        fader.update(0.25);
        fader.cancel(id);
        fader.update(0.5);
        assert_eq!(layer.opacity(), 0.25);
    }
}
