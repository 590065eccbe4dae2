// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 结果标注 (Annotation)
//!
//! 在原始帧上绘制监控区域、区域内检测框与告警文字。
//! 只负责绘制,不参与任何判定。

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::info;

use crate::detection::{BBox, TrackId};
use crate::engine::{Alert, FrameReport};
use crate::geometry::RegionPolygon;

// ========== 颜色 ==========

pub const REGION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const CONGESTION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const DWELL_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const COUNT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// 根据ID生成不同颜色
pub fn id_to_color(id: TrackId) -> Rgb<u8> {
    let hue = (id as f32 * 137.508) % 360.0; // 黄金角度采样
    let (r, g, b) = hsv_to_rgb(hue, 0.8, 0.9);
    Rgb([r, g, b])
}

/// HSV转RGB
// 色相按60°分六段,每段只有一个分量线性变化
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

/// 像素坐标裁剪到 [-1, max],超大坐标不会溢出
fn clamp_px(v: f32, max: i64) -> i64 {
    (v.round() as i64).clamp(-1, max)
}

// ========== 标注器 ==========

pub struct Annotator {
    font: Option<FontVec>,
    line_width: u32,
    font_scale: f32,
    display_counts: bool,
}

impl Annotator {
    pub fn new(line_width: u32) -> Self {
        Self {
            font: None,
            line_width: line_width.max(1),
            font_scale: 18.0,
            display_counts: true,
        }
    }

    /// 加载字体 (TTF/OTF),用于绘制文字
    pub fn with_font_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("读取字体失败: {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("字体解析失败 {}: {}", path.display(), e))?;
        info!("✅ 字体加载成功: {}", path.display());
        self.font = Some(font);
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// 隐藏排队人数
    pub fn hide_counts(&mut self) {
        self.display_counts = false;
    }

    /// 显示排队人数
    pub fn show_counts(&mut self) {
        self.display_counts = true;
    }

    /// 标注一帧
    pub fn annotate(&self, image: &mut RgbImage, region: &RegionPolygon, report: &FrameReport) {
        let region_color = if report.congestion_alert {
            CONGESTION_COLOR
        } else {
            REGION_COLOR
        };
        self.draw_region(image, region, region_color);

        for det in &report.filtered_detections {
            let color = if report.is_dwell_alerted(det.track_id) {
                DWELL_COLOR
            } else {
                id_to_color(det.track_id)
            };
            self.draw_box(image, &det.bbox, color);
            self.draw_label(image, &det.bbox, &det.label(), color);
        }

        let mut y = 30.0;
        if self.display_counts {
            self.draw_text(image, 10, y as i32, &format!("Queue Count: {}", report.queue_count), COUNT_COLOR);
        }
        for alert in report.alerts() {
            y += 50.0;
            let color = match alert {
                Alert::Congestion { .. } => CONGESTION_COLOR,
                Alert::Dwell { .. } => DWELL_COLOR,
            };
            self.draw_text(image, 10, y as i32, &alert.to_string(), color);
        }
    }

    fn draw_region(&self, image: &mut RgbImage, region: &RegionPolygon, color: Rgb<u8>) {
        let thickness = (self.line_width * 2) as i32;
        let points = region.points();
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            for t in 0..thickness {
                let off = (t - thickness / 2) as f32;
                draw_line_segment_mut(
                    image,
                    (a.x as f32 + off, a.y as f32 + off),
                    (b.x as f32 + off, b.y as f32 + off),
                    color,
                );
            }
        }
    }

    fn draw_box(&self, image: &mut RgbImage, bbox: &BBox, color: Rgb<u8>) {
        if !bbox.is_finite() {
            return;
        }
        // 裁剪到画面范围,画面外的边不绘制
        let max_x = image.width() as i64;
        let max_y = image.height() as i64;
        let x1 = clamp_px(bbox.x1.min(bbox.x2), max_x);
        let y1 = clamp_px(bbox.y1.min(bbox.y2), max_y);
        let x2 = clamp_px(bbox.x1.max(bbox.x2), max_x);
        let y2 = clamp_px(bbox.y1.max(bbox.y2), max_y);
        for t in 0..self.line_width as i64 {
            let w = x2 - x1 - 2 * t;
            let h = y2 - y1 - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at((x1 + t) as i32, (y1 + t) as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(image, rect, color);
        }
    }

    fn draw_label(&self, image: &mut RgbImage, bbox: &BBox, text: &str, color: Rgb<u8>) {
        if !bbox.is_finite() {
            return;
        }
        let x = clamp_px(bbox.x1.min(bbox.x2), image.width() as i64).max(0);
        let y = clamp_px(bbox.y1.min(bbox.y2) - self.font_scale, image.height() as i64).max(0);
        self.draw_text(image, x as i32, y as i32, text, color);
    }

    fn draw_text(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        if let Some(font) = &self.font {
            draw_text_mut(image, color, x, y, PxScale::from(self.font_scale), font, text);
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(2)
    }
}

/// 保存标注帧: <dir>/frame_000123.png
pub fn save_frame(image: &RgbImage, dir: impl AsRef<Path>, frame_index: u64) -> Result<PathBuf> {
    let path = dir.as_ref().join(format!("frame_{:06}.png", frame_index));
    image
        .save(&path)
        .with_context(|| format!("保存标注帧失败: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::detection::{BBox, Detection};
    use crate::engine::QueueEngine;
    use crate::geometry::Point2;

    fn engine(threshold: usize) -> QueueEngine {
        let config = EngineConfig {
            region: vec![
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            congestion_threshold: threshold,
            frame_rate: 10.0,
            ..Default::default()
        };
        QueueEngine::new(&config).unwrap()
    }

    #[test]
    fn test_id_colors_differ() {
        assert_ne!(id_to_color(1), id_to_color(2));
        assert_eq!(id_to_color(7), id_to_color(7));
    }

    #[test]
    fn test_hsv_primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), (0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), (0, 0, 255));
    }

    #[test]
    fn test_draws_region_and_boxes() {
        let mut engine = engine(3);
        let det = Detection::centered(4, 5.0, 5.0, 4.0, 4.0);
        let report = engine.process_frame(&[det]);

        let mut image = RgbImage::new(20, 20);
        Annotator::new(1).annotate(&mut image, engine.region(), &report);

        assert_eq!(*image.get_pixel(5, 0), REGION_COLOR);
        assert_eq!(*image.get_pixel(3, 5), id_to_color(4));
        assert_eq!(*image.get_pixel(15, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_congestion_turns_region_red() {
        let mut engine = engine(0);
        let det = [Detection::centered(1, 5.0, 5.0, 4.0, 4.0)];
        engine.process_frame(&det);
        let report = engine.process_frame(&det);
        assert!(report.congestion_alert);

        let mut image = RgbImage::new(20, 20);
        Annotator::new(1).annotate(&mut image, engine.region(), &report);
        assert_eq!(*image.get_pixel(5, 0), CONGESTION_COLOR);
    }

    #[test]
    fn test_huge_box_is_clipped_not_fatal() {
        let config = EngineConfig {
            region: vec![
                Point2::new(-10.0, -10.0),
                Point2::new(10.0, -10.0),
                Point2::new(10.0, 10.0),
                Point2::new(-10.0, 10.0),
            ],
            ..Default::default()
        };
        let mut engine = QueueEngine::new(&config).unwrap();
        let huge = Detection::new(BBox::new(-3e9, -3e9, 3e9, 3e9), 1, "person", 0.9);
        let report = engine.process_frame(&[huge]);
        assert_eq!(report.total_tracks, 1);

        let mut image = RgbImage::new(20, 20);
        Annotator::new(3).annotate(&mut image, engine.region(), &report);
        // 框的四条边都在画面外
        assert_eq!(*image.get_pixel(15, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_partly_outside_is_clipped() {
        let mut image = RgbImage::new(20, 20);
        let bbox = BBox::new(5.0, 5.0, 1e7, 1e7);
        Annotator::new(1).draw_box(&mut image, &bbox, DWELL_COLOR);
        assert_eq!(*image.get_pixel(5, 12), DWELL_COLOR);
        assert_eq!(*image.get_pixel(12, 5), DWELL_COLOR);
        assert_eq!(*image.get_pixel(12, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_non_finite_box_is_ignored() {
        let mut image = RgbImage::new(20, 20);
        let annotator = Annotator::new(2);
        let bbox = BBox::new(f32::NAN, 2.0, 8.0, f32::INFINITY);
        annotator.draw_box(&mut image, &bbox, DWELL_COLOR);
        annotator.draw_label(&mut image, &bbox, "x", DWELL_COLOR);
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_counts_toggle() {
        let mut annotator = Annotator::default();
        annotator.hide_counts();
        assert!(!annotator.display_counts);
        annotator.show_counts();
        assert!(annotator.display_counts);
        assert!(!annotator.has_font());
    }

    #[test]
    fn test_missing_font_is_error() {
        assert!(Annotator::default()
            .with_font_file("/nonexistent/font.ttf")
            .is_err());
    }

    #[test]
    fn test_save_frame() {
        let dir = std::env::temp_dir();
        let image = RgbImage::new(4, 4);
        let path = save_frame(&image, &dir, 987_654).unwrap();
        assert!(path.ends_with("frame_987654.png"));
        let _ = fs::remove_file(path);
    }
}
