// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 几何模块 (Geometry)
//!
//! 多边形区域与点包含测试 (射线法 + 边界判定)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 边界判定容差 (像素)
const EDGE_EPSILON: f64 = 1e-9;

/// 几何错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("invalid polygon: need at least 3 points, got {0}")]
    InvalidPolygon(usize),

    #[error("invalid polygon: point #{index} ({x}, {y}) is not finite")]
    NonFinitePoint { index: usize, x: f64, y: f64 },

    #[error("cannot parse region point {0:?}, expected \"x,y\"")]
    Parse(String),
}

/// 二维点 (像素坐标)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<(i32, i32)> for Point2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f64, y as f64)
    }
}

/// 监控区域多边形 (Region of interest)
///
/// 顶点顺序由上游选择工具决定,这里不做重排。创建后不可变。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegionPolygon {
    points: Vec<Point2>,
}

impl RegionPolygon {
    /// 创建区域 (至少3个有限坐标点)
    pub fn new(points: Vec<Point2>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::InvalidPolygon(points.len()));
        }
        if let Some((index, p)) = points.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(GeometryError::NonFinitePoint {
                index,
                x: p.x,
                y: p.y,
            });
        }
        Ok(Self { points })
    }

    /// 解析 "x,y;x,y;x,y;x,y" 格式 (区域选择工具的输出)
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let points = text
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let pair = pair.trim_start_matches('(').trim_end_matches(')');
                let mut parts = pair.split(',').map(str::trim);
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(x), Some(y), None) => match (x.parse::<f64>(), y.parse::<f64>()) {
                        (Ok(x), Ok(y)) => Ok(Point2::new(x, y)),
                        _ => Err(GeometryError::Parse(pair.to_string())),
                    },
                    _ => Err(GeometryError::Parse(pair.to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points)
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 点是否在区域内 (含边界)
    pub fn contains(&self, point: Point2) -> bool {
        contains(&self.points, point)
    }
}

impl<'de> Deserialize<'de> for RegionPolygon {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<Point2>::deserialize(deserializer)?;
        RegionPolygon::new(points).map_err(serde::de::Error::custom)
    }
}

/// 点包含测试 (Point-in-polygon)
///
/// 位于多边形内部或恰好在边界 (顶点/边) 上返回 true。
/// 少于3个顶点的退化多边形返回 false。
pub fn contains(polygon: &[Point2], point: Point2) -> bool {
    if polygon.len() < 3 || !point.is_finite() {
        return false;
    }

    let n = polygon.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[j];
        let b = polygon[i];

        if on_segment(a, b, point) {
            return true;
        }

        // 射线法: 向 +x 方向发射水平射线,统计穿越次数
        if (b.y > point.y) != (a.y > point.y) {
            let x_cross = (a.x - b.x) * (point.y - b.y) / (a.y - b.y) + b.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// 点是否在线段 ab 上
fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    let scale = (b.x - a.x).abs().max((b.y - a.y).abs()).max(1.0);
    if cross.abs() > EDGE_EPSILON * scale {
        return false;
    }
    p.x >= a.x.min(b.x) - EDGE_EPSILON
        && p.x <= a.x.max(b.x) + EDGE_EPSILON
        && p.y >= a.y.min(b.y) - EDGE_EPSILON
        && p.y <= a.y.max(b.y) + EDGE_EPSILON
}
