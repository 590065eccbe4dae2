// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 区域占用 (Occupancy Filter + 排队计数规则)

use tracing::debug;

use super::history::TrackHistoryStore;
use crate::detection::Detection;
use crate::geometry::RegionPolygon;

/// 区域过滤器: 以检测框像素中心判断是否在区域内
#[derive(Debug, Clone)]
pub struct OccupancyFilter {
    region: RegionPolygon,
}

impl OccupancyFilter {
    pub fn new(region: RegionPolygon) -> Self {
        Self { region }
    }

    pub fn region(&self) -> &RegionPolygon {
        &self.region
    }

    /// 单个检测是否在区域内
    ///
    /// 含非有限坐标的检测框无法取中心点,直接丢弃;坐标颠倒的框照常判定。
    pub fn admits(&self, detection: &Detection) -> bool {
        if !detection.bbox.is_finite() {
            debug!(
                "⚠️ 检测框含非有限坐标,跳过 (track #{}): {:?}",
                detection.track_id, detection.bbox
            );
            return false;
        }
        if detection.bbox.is_malformed() {
            debug!(
                "⚠️ 检测框异常 (track #{}): {:?}",
                detection.track_id, detection.bbox
            );
        }
        self.region.contains(detection.bbox.pixel_center())
    }

    /// 过滤当前帧检测,返回区域内的检测 (保持输入顺序)
    pub fn filter(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|det| self.admits(det))
            .cloned()
            .collect()
    }
}

/// 排队计数 (Queue counting rule)
///
/// 对每个区域内检测: 先记录轨迹点,再计数。计数需同时满足:
/// 1. 该ID已有至少2个轨迹点 (首次出现视为未确认)
/// 2. 最新轨迹点本身也在区域内 (独立于过滤器的第二次判定)
pub fn count_queue(
    region: &RegionPolygon,
    history: &mut TrackHistoryStore,
    inside: &[Detection],
) -> usize {
    let mut count = 0;
    for det in inside {
        let trail_len = history.record(det.track_id, det.bbox.center());

        let confirmed = trail_len > 1;
        let latest_inside = history
            .latest(det.track_id)
            .is_some_and(|p| region.contains(p));

        if region.len() >= 3 && confirmed && latest_inside {
            count += 1;
        }
    }
    count
}
