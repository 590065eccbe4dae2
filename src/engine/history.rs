// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 轨迹历史 (Track History Store)
//!
//! 每个跟踪ID保存最近的代表点,超出容量时丢弃最旧的点。
//! 目标消失时不清理,同一ID再次出现时继续复用。

use std::collections::{HashMap, VecDeque};

use crate::detection::TrackId;
use crate::geometry::Point2;

/// 默认保留的轨迹点数
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

#[derive(Debug, Clone)]
pub struct TrackHistoryStore {
    tracks: HashMap<TrackId, VecDeque<Point2>>,
    capacity: usize,
}

impl TrackHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            capacity: capacity.max(2),
        }
    }

    /// 追加一个轨迹点,返回该ID当前的历史长度
    pub fn record(&mut self, track_id: TrackId, point: Point2) -> usize {
        let capacity = self.capacity;
        let trail = self
            .tracks
            .entry(track_id)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        trail.push_back(point);
        while trail.len() > capacity {
            trail.pop_front();
        }
        trail.len()
    }

    /// 最近 n 个点 (按插入顺序)
    pub fn last_n(&self, track_id: TrackId, n: usize) -> Vec<Point2> {
        match self.tracks.get(&track_id) {
            Some(trail) => trail.iter().skip(trail.len().saturating_sub(n)).copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn latest(&self, track_id: TrackId) -> Option<Point2> {
        self.tracks.get(&track_id).and_then(|t| t.back().copied())
    }

    pub fn len_of(&self, track_id: TrackId) -> usize {
        self.tracks.get(&track_id).map_or(0, VecDeque::len)
    }

    /// 已知的跟踪ID数量
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

impl Default for TrackHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: f64) -> Point2 {
        Point2::new(v, v)
    }

    #[test]
    fn test_record_and_last_n() {
        let mut store = TrackHistoryStore::default();
        assert_eq!(store.record(1, p(1.0)), 1);
        assert_eq!(store.record(1, p(2.0)), 2);
        assert_eq!(store.record(1, p(3.0)), 3);

        assert_eq!(store.last_n(1, 2), vec![p(2.0), p(3.0)]);
        assert_eq!(store.last_n(1, 10), vec![p(1.0), p(2.0), p(3.0)]);
        assert!(store.last_n(99, 2).is_empty());
        assert_eq!(store.latest(1), Some(p(3.0)));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut store = TrackHistoryStore::new(3);
        for i in 0..5 {
            store.record(7, p(i as f64));
        }
        assert_eq!(store.len_of(7), 3);
        assert_eq!(store.last_n(7, 3), vec![p(2.0), p(3.0), p(4.0)]);
    }

    #[test]
    fn test_tracks_are_independent() {
        let mut store = TrackHistoryStore::default();
        store.record(1, p(1.0));
        store.record(2, p(5.0));
        store.record(2, p(6.0));
        assert_eq!(store.len_of(1), 1);
        assert_eq!(store.len_of(2), 2);
        assert_eq!(store.track_count(), 2);
    }

    #[test]
    fn test_minimum_capacity() {
        // 计数规则至少需要两个点
        let store = TrackHistoryStore::new(0);
        assert_eq!(store.capacity(), 2);
    }
}
