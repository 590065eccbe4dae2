// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 引擎配置参数
pub mod detection; // 跟踪检测数据
pub mod engine; // 区域占用与告警引擎
pub mod geometry; // 多边形区域
pub mod render; // 结果标注
pub mod replay; // 跟踪结果回放
pub mod worker; // 单路视频流工作线程

pub use crate::config::{ConfigurationError, EngineConfig};
pub use crate::detection::{BBox, Detection, TrackId};
pub use crate::engine::{Alert, FrameReport, QueueEngine, SessionSummary};
pub use crate::geometry::{contains, GeometryError, Point2, RegionPolygon};
pub use crate::replay::{DetectionSource, FrameRecord, JsonLinesSource};
pub use crate::render::Annotator;
pub use crate::worker::StreamWorker;

/// 本地时间字符串,用于输出目录命名
pub fn gen_time_string(delimiter: &str) -> String {
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    chrono::Local::now().format(&fmt).to_string()
}
