// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 排队区域占用与告警引擎 (Region Occupancy & Alerting Engine)
///
/// 每帧同步调用一次 `QueueEngine::process_frame`:
/// - OccupancyFilter:     区域过滤
/// - TrackHistoryStore:   轨迹历史 + 排队计数
/// - DwellTracker:        停留超时告警 + 离开清除
/// - CongestionEvaluator: 拥堵判定
///
/// 所有状态归单个引擎实例所有,多路视频流需各自创建引擎。
pub mod alert;
pub mod congestion;
pub mod dwell;
pub mod history;
pub mod occupancy;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

pub use alert::Alert;
pub use congestion::{CongestionEvaluator, CongestionState};
pub use dwell::{DwellTracker, FrameIndex};
pub use history::TrackHistoryStore;
pub use occupancy::OccupancyFilter;

use crate::config::{ConfigurationError, EngineConfig};
use crate::detection::{Detection, TrackId};
use crate::geometry::RegionPolygon;

// ========== 输出数据结构 ==========

/// 单帧结果 (引擎 → 渲染/CLI)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: FrameIndex,
    /// 排队人数 (已确认且在区域内)
    pub queue_count: usize,
    /// 原始拥堵判定: queue_count > 阈值
    pub congested: bool,
    /// 去抖后的拥堵告警
    pub congestion_alert: bool,
    /// 停留超时的跟踪ID
    pub dwell_alerted_ids: BTreeSet<TrackId>,
    /// 区域内检测数
    pub total_tracks: usize,
    /// 区域内检测 (供渲染)
    pub filtered_detections: Vec<Detection>,
    /// 超时ID对应的停留帧数 (与 dwell_alerted_ids 同序)
    #[serde(skip)]
    dwell_frames: Vec<u64>,
}

impl FrameReport {
    /// 本帧的告警列表
    pub fn alerts(&self) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if self.congestion_alert {
            alerts.push(Alert::Congestion {
                queue_count: self.queue_count,
            });
        }
        for (&track_id, &frames) in self.dwell_alerted_ids.iter().zip(&self.dwell_frames) {
            alerts.push(Alert::Dwell { track_id, frames });
        }
        alerts
    }

    pub fn is_dwell_alerted(&self, track_id: TrackId) -> bool {
        self.dwell_alerted_ids.contains(&track_id)
    }
}

/// 会话统计
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub peak_queue_count: usize,
    pub congested_frames: u64,
    pub dwell_alerted_ids: BTreeSet<TrackId>,
}

// ========== 引擎 ==========

pub struct QueueEngine {
    filter: OccupancyFilter,
    history: TrackHistoryStore,
    dwell: DwellTracker,
    congestion: CongestionEvaluator,

    /// 下一帧的帧序号 (会话开始时为0)
    frame_index: FrameIndex,
    summary: SessionSummary,
}

impl QueueEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigurationError> {
        let region = config.validate()?;
        let engine = Self::with_region(
            region,
            config.congestion_threshold,
            config.dwell_threshold_frames(),
            config.history_capacity,
            config.congestion_debounce_frames,
        );
        info!(
            "🚀 排队引擎就绪 | 区域 {} 点 | 拥堵阈值 {} | 停留阈值 {} 帧",
            engine.region().len(),
            config.congestion_threshold,
            engine.dwell.threshold_frames()
        );
        Ok(engine)
    }

    pub fn with_region(
        region: RegionPolygon,
        congestion_threshold: usize,
        dwell_threshold_frames: u64,
        history_capacity: usize,
        congestion_debounce_frames: u32,
    ) -> Self {
        Self {
            filter: OccupancyFilter::new(region),
            history: TrackHistoryStore::new(history_capacity),
            dwell: DwellTracker::new(dwell_threshold_frames),
            congestion: CongestionEvaluator::new(congestion_threshold, congestion_debounce_frames),
            frame_index: 0,
            summary: SessionSummary::default(),
        }
    }

    pub fn region(&self) -> &RegionPolygon {
        self.filter.region()
    }

    /// 下一帧的帧序号
    pub fn frame_index(&self) -> FrameIndex {
        self.frame_index
    }

    pub fn history(&self) -> &TrackHistoryStore {
        &self.history
    }

    pub fn dwell(&self) -> &DwellTracker {
        &self.dwell
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// 处理一帧 (唯一入口,按帧顺序同步调用)
    pub fn process_frame(&mut self, detections: &[Detection]) -> FrameReport {
        let frame = self.frame_index;

        // 1. 区域过滤
        let inside = self.filter.filter(detections);

        // 2. 轨迹记录 + 排队计数
        let queue_count = occupancy::count_queue(self.filter.region(), &mut self.history, &inside);

        // 3. 停留跟踪 + 清除离开的ID
        let dwell_alerted_ids = self.dwell.update(frame, inside.iter().map(|d| d.track_id));
        let dwell_frames = dwell_alerted_ids
            .iter()
            .map(|&id| self.dwell.elapsed(id, frame).unwrap_or_default())
            .collect();

        // 4. 拥堵判定
        let CongestionState { congested, alert } = self.congestion.evaluate(queue_count);

        debug!(
            "帧 {}: 检测 {} | 区域内 {} | 排队 {} | 拥堵 {} | 超时 {:?}",
            frame,
            detections.len(),
            inside.len(),
            queue_count,
            congested,
            dwell_alerted_ids
        );

        self.summary.frames_processed += 1;
        self.summary.peak_queue_count = self.summary.peak_queue_count.max(queue_count);
        if congested {
            self.summary.congested_frames += 1;
        }
        self.summary
            .dwell_alerted_ids
            .extend(dwell_alerted_ids.iter().copied());

        self.frame_index += 1;

        FrameReport {
            frame_index: frame,
            queue_count,
            congested,
            congestion_alert: alert,
            dwell_alerted_ids,
            total_tracks: inside.len(),
            filtered_detections: inside,
            dwell_frames,
        }
    }

    /// 重置会话 (帧序号归零,清空所有跟踪状态)
    pub fn reset(&mut self) {
        self.history.clear();
        self.dwell.clear();
        self.congestion.reset();
        self.frame_index = 0;
        self.summary = SessionSummary::default();
    }
}
