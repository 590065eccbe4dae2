// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测数据 (Detection Data)
///
/// 外部跟踪器的输出在进入引擎边界时统一转换为 `Detection`
/// - BBox:      检测框 (x1, y1, x2, y2)
/// - Detection: 带跟踪ID的检测结果
pub mod types;

pub use types::{BBox, Detection, TrackId};
