//! # Variant 模块
//!
//! 过渡变体与注册表。每次过渡开始时均匀随机选择一个变体，并按值快照进会话。
//!
//! ## 时长字段命名
//!
//! - `cover_appear`: 遮罩出现（淡入到 1）的时长；过渡图层淡出也复用它
//! - `cover_disappear`: 遮罩消失（淡出到 0）的时长；过渡图层淡入也复用它
//!
//! 外部编写的配置可能沿用 `fadeOutDuration` / `fadeInDuration` 的旧命名，
//! 通过 serde alias 映射到上面两个字段。

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{TransitionError, TransitionResult};

/// 过渡变体（注册后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionVariant {
    /// 变体名称（仅用于日志）
    #[serde(default)]
    pub name: String,

    /// 动画参数 `TransitionIndex` 的值
    #[serde(alias = "transitionIndex", alias = "transition_index")]
    pub index: u32,

    /// 遮罩出现时长（秒）
    #[serde(alias = "fadeOutDuration", alias = "fade_out_duration")]
    pub cover_appear: f32,

    /// 遮罩消失时长（秒）
    #[serde(alias = "fadeInDuration", alias = "fade_in_duration")]
    pub cover_disappear: f32,

    /// 是否需要额外淡入淡出过渡图层
    #[serde(
        default,
        alias = "needsFade",
        alias = "needs_fade",
        alias = "needsSecondaryFade"
    )]
    pub needs_secondary_fade: bool,
}

impl TransitionVariant {
    /// 创建变体
    pub fn new(index: u32, cover_appear: f32, cover_disappear: f32) -> Self {
        Self {
            name: String::new(),
            index,
            cover_appear,
            cover_disappear,
            needs_secondary_fade: false,
        }
    }

    /// 设置名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置是否需要过渡图层淡入淡出
    pub fn with_secondary_fade(mut self, needs: bool) -> Self {
        self.needs_secondary_fade = needs;
        self
    }

    /// 校验时长
    pub fn validate(&self) -> TransitionResult<()> {
        for (field, value) in [
            ("cover_appear", self.cover_appear),
            ("cover_disappear", self.cover_disappear),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TransitionError::InvalidVariant {
                    index: self.index,
                    message: format!("{field} 必须是非负有限数，实际为 {value}"),
                });
            }
        }
        Ok(())
    }

    /// 日志用标签
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.index)
        } else {
            format!("#{} {}", self.index, self.name)
        }
    }
}

/// 过渡变体注册表
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    variants: Vec<TransitionVariant>,
}

impl VariantRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 从变体列表创建（逐个校验）
    pub fn from_variants(
        variants: impl IntoIterator<Item = TransitionVariant>,
    ) -> TransitionResult<Self> {
        let mut registry = Self::new();
        for variant in variants {
            registry.register(variant)?;
        }
        Ok(registry)
    }

    /// 注册变体
    pub fn register(&mut self, variant: TransitionVariant) -> TransitionResult<()> {
        variant.validate()?;
        self.variants.push(variant);
        Ok(())
    }

    /// 均匀随机选择一个变体（返回快照）
    pub fn select_random<R: Rng + ?Sized>(&self, rng: &mut R) -> TransitionResult<TransitionVariant> {
        if self.variants.is_empty() {
            return Err(TransitionError::EmptyRegistry);
        }
        let index = rng.gen_range(0..self.variants.len());
        Ok(self.variants[index].clone())
    }

    /// 变体数量
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// 遍历变体
    pub fn iter(&self) -> impl Iterator<Item = &TransitionVariant> {
        self.variants.iter()
    }
}
