// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 单路视频流工作线程 (Per-stream worker)
//!
//! 每路流一个线程、一个独立引擎,状态不跨流共享:
//! 跟踪线程 → (Vec<Detection>) → 工作线程 → (FrameReport) → 渲染/上报

use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, SendError, Sender};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::detection::Detection;
use crate::engine::{FrameReport, QueueEngine, SessionSummary};

/// 输入通道容量 (帧)
pub const CHANNEL_CAPACITY: usize = 60;

pub struct StreamWorker {
    name: String,
    tx: Option<Sender<Vec<Detection>>>,
    reports: Receiver<FrameReport>,
    handle: Option<JoinHandle<SessionSummary>>,
}

impl StreamWorker {
    /// 启动工作线程 (配置无效时立即返回错误)
    pub fn spawn(name: impl Into<String>, config: &EngineConfig) -> Result<Self> {
        let name = name.into();
        let mut engine = QueueEngine::new(config)
            .with_context(|| format!("流 {} 的引擎配置无效", name))?;

        let (tx, rx) = bounded::<Vec<Detection>>(CHANNEL_CAPACITY);
        // 结果通道不限容量: 调用方可以先提交完再取结果,工作线程不会反压输入
        let (report_tx, reports) = unbounded::<FrameReport>();

        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(format!("queue-{}", name))
            .spawn(move || {
                info!("🎬 流 {} 工作线程启动", thread_name);
                for detections in rx.iter() {
                    let report = engine.process_frame(&detections);
                    if report_tx.send(report).is_err() {
                        warn!("⚠️ 流 {} 结果接收端已关闭,停止处理", thread_name);
                        break;
                    }
                }
                let summary = engine.summary().clone();
                info!(
                    "🛑 流 {} 结束,共处理 {} 帧",
                    thread_name, summary.frames_processed
                );
                summary
            })
            .context("创建工作线程失败")?;

        Ok(Self {
            name,
            tx: Some(tx),
            reports,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 提交一帧检测结果 (输入积压 CHANNEL_CAPACITY 帧时阻塞,直到工作线程取走)
    pub fn submit(&self, detections: Vec<Detection>) -> Result<(), SendError<Vec<Detection>>> {
        match &self.tx {
            Some(tx) => tx.send(detections),
            None => Err(SendError(detections)),
        }
    }

    /// 结果通道
    pub fn reports(&self) -> &Receiver<FrameReport> {
        &self.reports
    }

    /// 关闭输入,等待线程结束,返回会话统计
    pub fn join(mut self) -> Result<SessionSummary> {
        self.tx.take();
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("流 {} 已结束", self.name))?;
        handle
            .join()
            .map_err(|_| anyhow!("流 {} 工作线程崩溃", self.name))
    }
}

impl Drop for StreamWorker {
    fn drop(&mut self) {
        self.tx.take();
    }
}
