//! # Collaborators 模块
//!
//! 编排器消费的外部协作者接口。全部可选：未配置时对应阶段退化为空操作。

/// 动画参数：过渡变体索引
pub const TRANSITION_INDEX_PARAM: &str = "TransitionIndex";

/// 动画触发器：开始过渡
pub const START_TRANSITION_TRIGGER: &str = "StartTransition";

/// 过渡动画播放器
///
/// 调用都是 fire-and-forget，编排器不假设同步生效。
pub trait TransitionAnimator {
    /// 设置整数参数
    fn set_integer(&mut self, name: &str, value: i32);

    /// 触发触发器
    fn set_trigger(&mut self, name: &str);

    /// 当前动画片段长度（秒），播放器不支持时返回 `None`
    fn current_clip_length(&self) -> Option<f32> {
        None
    }
}

/// 加载指示器（旋转图标等）
pub trait LoadingIndicator {
    /// 显示 / 隐藏
    fn set_active(&mut self, active: bool);
}

/// 过渡音效
pub trait SoundTrigger {
    /// 播放一次
    fn play(&self);
}
