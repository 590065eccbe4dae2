// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 停留时间跟踪 (Dwell Tracker)
//!
//! 状态: 不在区域 → 在区域 (记录首帧) → 超时告警 → 离开即删除记录。
//! 再次进入时重新计时。

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::detection::TrackId;

/// 帧序号
pub type FrameIndex = u64;

/// 秒数 × 帧率 → 帧数
///
/// 取最近整数而非截断: 5 秒 @ 29.97 fps 为 150 帧 (截断会得到 149)。
/// 只有乘积不是整数时两者才不同。
pub fn dwell_threshold_frames(dwell_seconds: f64, frame_rate: f64) -> u64 {
    (dwell_seconds * frame_rate).round().max(0.0) as u64
}

#[derive(Debug, Clone)]
pub struct DwellTracker {
    /// 跟踪ID → 本次连续停留的首帧
    first_seen: HashMap<TrackId, FrameIndex>,
    threshold_frames: u64,
}

impl DwellTracker {
    pub fn new(threshold_frames: u64) -> Self {
        Self {
            first_seen: HashMap::new(),
            threshold_frames,
        }
    }

    pub fn threshold_frames(&self) -> u64 {
        self.threshold_frames
    }

    /// 更新当前帧在区域内的ID,清除已离开的ID,返回超时告警的ID集合
    pub fn update<I>(&mut self, frame: FrameIndex, present: I) -> BTreeSet<TrackId>
    where
        I: IntoIterator<Item = TrackId>,
    {
        let mut current = HashSet::new();
        let mut alerted = BTreeSet::new();

        for track_id in present {
            current.insert(track_id);
            let since = *self.first_seen.entry(track_id).or_insert(frame);
            if frame.saturating_sub(since) >= self.threshold_frames {
                alerted.insert(track_id);
            }
        }

        // 清除本帧不在区域内的ID (停留计时归零)
        let before = self.first_seen.len();
        self.first_seen.retain(|id, _| current.contains(id));
        let evicted = before - self.first_seen.len();
        if evicted > 0 {
            debug!("🧹 帧 {}: 清除 {} 个离开区域的ID", frame, evicted);
        }

        alerted
    }

    /// 某ID本次连续停留的首帧
    pub fn first_seen(&self, track_id: TrackId) -> Option<FrameIndex> {
        self.first_seen.get(&track_id).copied()
    }

    /// 已停留帧数
    pub fn elapsed(&self, track_id: TrackId, frame: FrameIndex) -> Option<u64> {
        self.first_seen(track_id).map(|since| frame.saturating_sub(since))
    }

    /// 当前在区域内的ID数
    pub fn present_count(&self) -> usize {
        self.first_seen.len()
    }

    pub fn clear(&mut self) {
        self.first_seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_conversion() {
        assert_eq!(dwell_threshold_frames(5.0, 10.0), 50);
        // 149.85 取最近整数
        assert_eq!(dwell_threshold_frames(5.0, 29.97), 150);
        assert_eq!(dwell_threshold_frames(1.0, 2.4), 2);
        assert_eq!(dwell_threshold_frames(0.0, 30.0), 0);
    }

    #[test]
    fn test_alert_starts_exactly_at_threshold() {
        let mut tracker = DwellTracker::new(3);
        for frame in 0..3 {
            assert!(tracker.update(frame, [1]).is_empty(), "frame {}", frame);
        }
        assert!(tracker.update(3, [1]).contains(&1));
        assert!(tracker.update(4, [1]).contains(&1));
        assert_eq!(tracker.elapsed(1, 4), Some(4));
    }

    #[test]
    fn test_leaving_evicts_and_reentry_restarts() {
        let mut tracker = DwellTracker::new(3);
        for frame in 0..5 {
            tracker.update(frame, [1]);
        }
        assert!(tracker.update(5, []).is_empty());
        assert_eq!(tracker.first_seen(1), None);

        assert!(tracker.update(6, [1]).is_empty());
        assert_eq!(tracker.first_seen(1), Some(6));
        assert!(tracker.update(8, [1]).is_empty());
        assert!(tracker.update(9, [1]).contains(&1));
    }

    #[test]
    fn test_single_frame_sighting_leaves_no_record() {
        let mut tracker = DwellTracker::new(10);
        tracker.update(0, [4, 5]);
        assert_eq!(tracker.present_count(), 2);
        tracker.update(1, [5]);
        assert_eq!(tracker.first_seen(4), None);
        assert_eq!(tracker.first_seen(5), Some(0));
    }

    #[test]
    fn test_zero_threshold_alerts_immediately() {
        let mut tracker = DwellTracker::new(0);
        assert!(tracker.update(0, [2]).contains(&2));
    }
}
