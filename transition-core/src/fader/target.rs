//! # Target 模块
//!
//! 淡入淡出目标接口。
//!
//! 遮罩层、过渡图层都只暴露一个 [0, 1] 的透明度。编排器只持有引用，
//! 不拥有图层本身，因此使用 `Rc<dyn FadeTarget>` + 内部可变性。

use std::cell::Cell;

/// 淡入淡出目标 ID
///
/// 由 `Fader` 在注册时分配，保证唯一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u64);

impl TargetId {
    /// 创建新的目标 ID（仅供 Fader 内部使用）
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TargetId({})", self.0)
    }
}

/// 可淡入淡出的图层
///
/// ## 实现说明
///
/// `set_opacity` 取 `&self`：渲染端与编排器同时持有图层引用，
/// 由实现者自行选择 `Cell` / `RefCell` 等内部可变性。
pub trait FadeTarget {
    /// 当前透明度
    fn opacity(&self) -> f32;

    /// 设置透明度
    fn set_opacity(&self, value: f32);
}

/// 最简单的图层实现：名称 + 透明度
///
/// headless 驱动和测试直接使用它；真实渲染端可以读取 `opacity()` 绘制遮罩。
#[derive(Debug)]
pub struct Layer {
    name: String,
    opacity: Cell<f32>,
}

impl Layer {
    /// 创建图层
    pub fn new(name: impl Into<String>, opacity: f32) -> Self {
        Self {
            name: name.into(),
            opacity: Cell::new(opacity.clamp(0.0, 1.0)),
        }
    }

    /// 创建完全透明的图层
    pub fn transparent(name: impl Into<String>) -> Self {
        Self::new(name, 0.0)
    }

    /// 图层名称
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FadeTarget for Layer {
    fn opacity(&self) -> f32 {
        self.opacity.get()
    }

    fn set_opacity(&self, value: f32) {
        self.opacity.set(value.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_clamps_opacity() {
        let layer = Layer::new("cover", 2.0);
        assert_eq!(layer.opacity(), 1.0);

        layer.set_opacity(-0.3);
        assert_eq!(layer.opacity(), 0.0);

        layer.set_opacity(0.4);
        assert_eq!(layer.opacity(), 0.4);
        assert_eq!(layer.name(), "cover");
    }
}
