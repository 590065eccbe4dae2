// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::fmt;

use serde::Serialize;

use crate::detection::TrackId;

/// 告警消息
pub const CONGESTION_ALERT_MESSAGE: &str = "❗️ CONGESTION ALERT! Queue too long.";

/// 单帧告警 (Per-frame alert)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    /// 排队过长
    Congestion { queue_count: usize },
    /// 个人等待过久
    Dwell { track_id: TrackId, frames: u64 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Congestion { .. } => f.write_str(CONGESTION_ALERT_MESSAGE),
            Alert::Dwell { track_id, .. } => {
                write!(f, "TIME ALERT: Person {} is waiting too long!", track_id)
            }
        }
    }
}
