//! # Error 模块
//!
//! 定义 transition-core 中使用的错误类型。

use thiserror::Error;

use crate::fader::TargetId;

/// 过渡编排错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 已有过渡正在进行，新请求被丢弃（不排队）
    #[error("过渡进行中（目标 '{active}'），拒绝切换到 '{requested}'")]
    AlreadyInProgress { requested: String, active: String },

    /// 变体注册表为空，无法选择过渡
    #[error("过渡变体注册表为空")]
    EmptyRegistry,

    /// 变体参数非法
    #[error("过渡变体 {index} 无效: {message}")]
    InvalidVariant { index: u32, message: String },

    /// 场景加载启动失败
    #[error("加载场景 '{scene_id}' 失败: {message}")]
    LoadFailed { scene_id: String, message: String },

    /// 等待动画 proceed 信号超时
    #[error("等待动画 proceed 信号超时（已等待 {waited:.2}s）")]
    ProceedTimeout { waited: f32 },
}

/// 淡入淡出错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FadeError {
    /// 目标未注册
    #[error("淡入淡出目标 {0} 未注册")]
    UnknownTarget(TargetId),
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 解析 / 序列化失败
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// Result 类型别名
pub type TransitionResult<T> = Result<T, TransitionError>;
