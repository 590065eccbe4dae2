// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 跟踪结果回放 (Tracker dump replay)
//!
//! 每行一个JSON对象:
//! `{"frame": 12, "detections": [{"x1":..,"y1":..,"x2":..,"y2":..,"track_id":3,"class_name":"person","confidence":0.9}]}`

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::detection::Detection;

/// 单帧跟踪结果
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// 源帧号 (可选): 用于发现跟踪器丢帧,不影响引擎帧序号
    #[serde(default)]
    pub frame: Option<u64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// 检测来源 Trait
///
/// 外部跟踪器 (或其回放) 按帧顺序产出检测结果
pub trait DetectionSource {
    /// 下一帧; 流结束返回 `Ok(None)`
    fn next_frame(&mut self) -> Result<Option<FrameRecord>>;
}

/// JSON Lines 回放源
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    classes: Option<Vec<String>>,
    buf: String,
    last_frame: Option<u64>,
    gaps: u64,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("打开跟踪结果失败: {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            classes: None,
            buf: String::new(),
            last_frame: None,
            gaps: 0,
        }
    }

    /// 只保留指定类别 (如 "person"),不区分大小写
    pub fn with_classes(mut self, classes: Vec<String>) -> Self {
        self.classes = if classes.is_empty() {
            None
        } else {
            Some(classes.into_iter().map(|c| c.to_lowercase()).collect())
        };
        self
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// 源帧号不连续的次数
    pub fn gaps(&self) -> u64 {
        self.gaps
    }

    /// 检查源帧号是否连续; 无帧号的记录按 +1 推进
    fn check_sequence(&mut self, frame: Option<u64>) {
        let expected = self.last_frame.map(|prev| prev + 1);
        match (frame, expected) {
            (Some(got), Some(want)) if got != want => {
                self.gaps += 1;
                warn!(
                    "⚠️ 第 {} 行帧号不连续: 期望 {},实际 {}",
                    self.line_no, want, got
                );
                self.last_frame = Some(got);
            }
            (Some(got), _) => self.last_frame = Some(got),
            (None, expected) => self.last_frame = expected,
        }
    }

    fn keep(&self, det: &Detection) -> bool {
        match &self.classes {
            Some(classes) => classes.contains(&det.class_name.to_lowercase()),
            None => true,
        }
    }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<FrameRecord>> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    // 出错的行已被读走,行号照常推进
                    self.line_no += 1;
                    return Err(e).with_context(|| format!("读取第 {} 行失败", self.line_no));
                }
            }

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let mut record: FrameRecord = serde_json::from_str(line)
                .with_context(|| format!("第 {} 行不是有效的帧记录", self.line_no))?;
            if self.classes.is_some() {
                let detections = std::mem::take(&mut record.detections);
                record.detections = detections.into_iter().filter(|d| self.keep(d)).collect();
            }
            self.check_sequence(record.frame);
            return Ok(Some(record));
        }
    }
}

/// 内存中的帧序列 (测试与嵌入使用)
impl DetectionSource for std::vec::IntoIter<FrameRecord> {
    fn next_frame(&mut self) -> Result<Option<FrameRecord>> {
        Ok(self.next())
    }
}
