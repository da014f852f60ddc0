//! # Config 模块
//!
//! 过渡配置。变体列表由外部编写（JSON），必须在第一次 `start_transition` 之前加载。
//!
//! ## 配置示例
//!
//! ```json
//! {
//!   "variants": [
//!     { "name": "fade", "index": 0, "cover_appear": 0.2, "cover_disappear": 0.3 },
//!     { "name": "wipe", "index": 1, "cover_appear": 0.5, "cover_disappear": 0.5,
//!       "needs_secondary_fade": true }
//!   ],
//!   "activation_ceiling": 0.9,
//!   "latency": { "probability": 0.0, "seconds": 3.0 },
//!   "proceed_fallback": { "kind": "timeout", "seconds": 10.0 },
//!   "easing": "linear",
//!   "seed": null
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, TransitionResult};
use crate::fader::EasingFunction;
use crate::latency::{LatencyConfig, REFERENCE_STALL_PROBABILITY, REFERENCE_STALL_SECONDS};
use crate::loader::DEFAULT_ACTIVATION_CEILING;
use crate::variant::{TransitionVariant, VariantRegistry};

/// proceed 信号的兜底策略
///
/// 默认 `None`：一直等待外部信号，调用方永远不发信号时会话会一直挂起。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProceedFallback {
    /// 不兜底
    #[default]
    None,
    /// 固定超时（秒）
    Timeout { seconds: f32 },
    /// 动画片段长度 + 宽限时间；播放器不报告长度时等同 `None`
    ClipLength {
        #[serde(default)]
        grace: f32,
    },
}

/// 过渡配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// 过渡变体
    #[serde(default)]
    pub variants: Vec<TransitionVariant>,

    /// 激活前进度上限
    #[serde(default = "default_activation_ceiling")]
    pub activation_ceiling: f32,

    /// 模拟加载延迟
    #[serde(default)]
    pub latency: LatencyConfig,

    /// proceed 信号兜底策略
    #[serde(default)]
    pub proceed_fallback: ProceedFallback,

    /// 淡入淡出缓动
    #[serde(default)]
    pub easing: EasingFunction,

    /// 随机种子（设置后变体选择与模拟延迟可复现）
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_activation_ceiling() -> f32 {
    DEFAULT_ACTIVATION_CEILING
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            variants: Vec::new(),
            activation_ceiling: default_activation_ceiling(),
            latency: LatencyConfig::default(),
            proceed_fallback: ProceedFallback::default(),
            easing: EasingFunction::default(),
            seed: None,
        }
    }
}

impl TransitionConfig {
    /// 参考配置：三个变体 + 参考延迟（1/3 概率停顿 3 秒）
    pub fn reference() -> Self {
        Self {
            variants: vec![
                TransitionVariant::new(0, 0.2, 0.3).with_name("fade"),
                TransitionVariant::new(1, 0.5, 0.5)
                    .with_name("wipe")
                    .with_secondary_fade(true),
                TransitionVariant::new(2, 0.3, 0.6).with_name("iris"),
            ],
            latency: LatencyConfig {
                probability: REFERENCE_STALL_PROBABILITY,
                seconds: REFERENCE_STALL_SECONDS,
            },
            ..Self::default()
        }
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!(path = %path.display(), variants = config.variants.len(), "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 加载配置文件，失败时返回错误
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// 序列化为格式化 JSON
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::Validation("至少需要一个过渡变体".to_string()));
        }

        for variant in &self.variants {
            variant
                .validate()
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }

        if !(self.activation_ceiling > 0.0 && self.activation_ceiling <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "activation_ceiling 必须在 (0, 1] 之间，实际为 {}",
                self.activation_ceiling
            )));
        }

        if !(0.0..=1.0).contains(&self.latency.probability) {
            return Err(ConfigError::Validation(
                "latency.probability 必须在 0.0 - 1.0 之间".to_string(),
            ));
        }

        if !self.latency.seconds.is_finite() || self.latency.seconds < 0.0 {
            return Err(ConfigError::Validation(
                "latency.seconds 必须是非负有限数".to_string(),
            ));
        }

        let fallback_seconds = match self.proceed_fallback {
            ProceedFallback::None => 0.0,
            ProceedFallback::Timeout { seconds } => seconds,
            ProceedFallback::ClipLength { grace } => grace,
        };
        if !fallback_seconds.is_finite() || fallback_seconds < 0.0 {
            return Err(ConfigError::Validation(
                "proceed_fallback 时长必须是非负有限数".to_string(),
            ));
        }

        Ok(())
    }

    /// 构建变体注册表
    pub fn registry(&self) -> TransitionResult<VariantRegistry> {
        VariantRegistry::from_variants(self.variants.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransitionConfig::default();
        assert_eq!(config.activation_ceiling, 0.9);
        assert_eq!(config.latency.probability, 0.0);
        assert_eq!(config.proceed_fallback, ProceedFallback::None);
        assert!(config.validate().is_err(), "没有变体的配置不应通过验证");
    }

    #[test]
    fn test_reference_config_is_valid() {
        let config = TransitionConfig::reference();
        config.validate().unwrap();
        assert_eq!(config.registry().unwrap().len(), 3);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{ "variants": [ { "index": 0, "cover_appear": 0.2, "cover_disappear": 0.3 } ] }"#;
        let config = TransitionConfig::from_json_str(json).unwrap();
        assert_eq!(config.activation_ceiling, 0.9);
        assert_eq!(config.latency.seconds, 3.0);
        assert_eq!(config.easing, EasingFunction::Linear);
        assert!(!config.variants[0].needs_secondary_fade);
        config.validate().unwrap();
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config =
            TransitionConfig::from_json_str(include_str!("../../configs/transitions.json"))
                .unwrap();
        config.validate().unwrap();
        assert_eq!(config.easing, EasingFunction::EaseInOutQuad);
        assert_eq!(config.proceed_fallback, ProceedFallback::Timeout { seconds: 5.0 });
        assert!(config.variants[1].needs_secondary_fade);
    }

    #[test]
    fn test_fallback_serde() {
        let json = r#"{ "kind": "timeout", "seconds": 2.5 }"#;
        let fallback: ProceedFallback = serde_json::from_str(json).unwrap();
        assert_eq!(fallback, ProceedFallback::Timeout { seconds: 2.5 });

        let fallback: ProceedFallback = serde_json::from_str(r#"{ "kind": "clip_length" }"#).unwrap();
        assert_eq!(fallback, ProceedFallback::ClipLength { grace: 0.0 });
    }

    #[test]
    fn test_config_validation() {
        let mut config = TransitionConfig::reference();

        config.activation_ceiling = 0.0;
        assert!(config.validate().is_err());
        config.activation_ceiling = 0.9;

        config.latency.probability = 1.5;
        assert!(config.validate().is_err());
        config.latency.probability = 0.0;

        config.proceed_fallback = ProceedFallback::Timeout { seconds: -1.0 };
        assert!(config.validate().is_err());
        config.proceed_fallback = ProceedFallback::None;

        config.variants[1].cover_disappear = -0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transitions.json");

        let mut config = TransitionConfig::reference();
        config.seed = Some(11);
        config.save(&path).unwrap();

        let loaded = TransitionConfig::load(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_or_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            TransitionConfig::load(dir.path().join("missing.json")),
            TransitionConfig::default()
        );

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(TransitionConfig::load(&broken), TransitionConfig::default());
        assert!(TransitionConfig::try_load(&broken).is_err());
    }
}
