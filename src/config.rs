// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 引擎配置 - 通过JSON文件调整参数

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::dwell::dwell_threshold_frames;
use crate::engine::history::DEFAULT_HISTORY_CAPACITY;
use crate::geometry::{GeometryError, Point2, RegionPolygon};

/// 配置错误 (构造引擎时立即失败)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("region: {0}")]
    Region(#[from] GeometryError),

    #[error("frame_rate must be a positive finite number, got {0}")]
    FrameRate(f64),

    #[error("dwell_seconds must be a non-negative finite number, got {0}")]
    DwellSeconds(f64),
}

/// 区域选择工具的默认区域 (原始帧像素坐标)
pub fn default_region() -> Vec<Point2> {
    vec![
        Point2::new(217.0, 288.0),
        Point2::new(342.0, 436.0),
        Point2::new(562.0, 225.0),
        Point2::new(455.0, 147.0),
    ]
}

/// 排队监控参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === 区域 ===
    pub region: Vec<Point2>, // 监控区域顶点 (顺序由选择工具决定)

    // === 告警参数 ===
    pub congestion_threshold: usize,     // 排队人数 > 阈值 即拥堵
    pub dwell_seconds: f64,              // 停留超时 (秒)
    pub frame_rate: f64,                 // 视频帧率,用于秒→帧换算
    pub congestion_debounce_frames: u32, // 拥堵告警去抖窗口 (0=关闭)

    // === 轨迹 ===
    pub history_capacity: usize, // 每个ID保留的轨迹点数
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            congestion_threshold: 3,
            dwell_seconds: 5.0,
            frame_rate: 30.0,
            congestion_debounce_frames: 0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// 校验参数,返回区域多边形
    pub fn validate(&self) -> Result<RegionPolygon, ConfigurationError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(ConfigurationError::FrameRate(self.frame_rate));
        }
        if !self.dwell_seconds.is_finite() || self.dwell_seconds < 0.0 {
            return Err(ConfigurationError::DwellSeconds(self.dwell_seconds));
        }
        Ok(RegionPolygon::new(self.region.clone())?)
    }

    /// 停留阈值 (帧)
    pub fn dwell_threshold_frames(&self) -> u64 {
        dwell_threshold_frames(self.dwell_seconds, self.frame_rate)
    }

    /// 从JSON文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("配置文件解析失败: {}", path.display()))?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 加载配置,文件不存在时写出默认配置
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!("📝 配置文件不存在,创建默认配置...");
        let config = Self::default();
        if let Err(e) = config.save(path) {
            warn!("⚠️  保存默认配置失败: {:#}", e);
        }
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, json).with_context(|| format!("保存配置失败: {}", path.display()))?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        let region = self
            .region
            .iter()
            .map(|p| format!("({}, {})", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");
        info!("🎛️  当前排队监控配置:");
        info!("  监控区域: {}", region);
        info!("  拥堵阈值: > {} 人", self.congestion_threshold);
        info!(
            "  停留超时: {:.1}s @ {:.2}fps = {} 帧",
            self.dwell_seconds,
            self.frame_rate,
            self.dwell_threshold_frames()
        );
        info!("  拥堵去抖: {} 帧", self.congestion_debounce_frames);
        info!("  轨迹长度: {}", self.history_capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.region.len(), 4);
        assert_eq!(config.congestion_threshold, 3);
        assert_eq!(config.dwell_seconds, 5.0);
        assert_eq!(config.dwell_threshold_frames(), 150);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig {
            region: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::Region(GeometryError::InvalidPolygon(2)))
        );

        config.region = default_region();
        config.frame_rate = 0.0;
        assert_eq!(config.validate(), Err(ConfigurationError::FrameRate(0.0)));

        config.frame_rate = 25.0;
        config.dwell_seconds = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::DwellSeconds(-1.0))
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"congestion_threshold": 5, "frame_rate": 10}"#).unwrap();
        assert_eq!(config.congestion_threshold, 5);
        assert_eq!(config.dwell_threshold_frames(), 50);
        assert_eq!(config.region, default_region());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "queue-sentinel-config-{}.json",
            std::process::id()
        ));
        let config = EngineConfig {
            congestion_threshold: 7,
            congestion_debounce_frames: 4,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = std::env::temp_dir().join("queue-sentinel-does-not-exist.json");
        assert!(EngineConfig::load(&path).is_err());
    }
}
