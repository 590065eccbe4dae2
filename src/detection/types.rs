// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// 跟踪ID (由外部跟踪器分配,跨帧稳定)
pub type TrackId = u32;

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 中心点 (精确浮点)
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.x1 as f64 + self.x2 as f64) / 2.0,
            (self.y1 as f64 + self.y2 as f64) / 2.0,
        )
    }

    /// 像素中心点: 坐标先截断为整数,再向下整除2
    pub fn pixel_center(&self) -> Point2 {
        let x1 = self.x1.trunc() as i64;
        let y1 = self.y1.trunc() as i64;
        let x2 = self.x2.trunc() as i64;
        let y2 = self.y2.trunc() as i64;
        Point2::new(
            (x1 + x2).div_euclid(2) as f64,
            (y1 + y2).div_euclid(2) as f64,
        )
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// 四个坐标均为有限值
    pub fn is_finite(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
    }

    /// 坐标顺序颠倒或含非有限值
    pub fn is_malformed(&self) -> bool {
        !self.is_finite() || self.x2 < self.x1 || self.y2 < self.y1
    }
}

/// 跟踪检测结果 (跟踪器 → 引擎)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(flatten)]
    pub bbox: BBox,

    /// 跟踪ID
    pub track_id: TrackId,

    /// 类别名称 (引擎不解释,仅透传给渲染)
    #[serde(default)]
    pub class_name: String,

    /// 检测置信度 [0, 1]
    #[serde(default)]
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BBox, track_id: TrackId, class_name: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            track_id,
            class_name: class_name.into(),
            confidence,
        }
    }

    /// 以中心点和尺寸构造
    #[cfg(test)]
    pub(crate) fn centered(track_id: TrackId, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(
            BBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0),
            track_id,
            "person",
            1.0,
        )
    }

    /// 标签文本: "person #7 0.83"
    pub fn label(&self) -> String {
        format!("{} #{} {:.2}", self.class_name, self.track_id, self.confidence)
    }
}
