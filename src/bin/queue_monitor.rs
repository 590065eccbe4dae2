// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 排队监控 (Queue Monitor)
///
/// 回放跟踪器输出 (JSON Lines),逐帧计算排队人数、拥堵与停留超时告警。
///
/// 主程序入口: cargo run --bin queue-monitor --release -- --input tracks.jsonl
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use queue_sentinel::render::save_frame;
use queue_sentinel::{
    gen_time_string, Alert, Annotator, DetectionSource, EngineConfig, JsonLinesSource,
    QueueEngine, RegionPolygon,
};

/// 连续无效帧上限
const MAX_CONSECUTIVE_ERRORS: u32 = 100;

/// 排队监控参数
#[derive(Parser, Debug)]
#[command(author, version, about = "排队区域监控 - 拥堵与停留超时告警", long_about = None)]
struct Args {
    /// 跟踪结果文件 (每行一帧JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// JSON配置文件 (不存在时写出默认配置)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 监控区域 "x,y;x,y;x,y;x,y" (区域选择工具输出)
    #[arg(short, long)]
    region: Option<String>,

    /// 拥堵阈值 (排队人数 > 阈值)
    #[arg(long)]
    congestion_threshold: Option<usize>,

    /// 停留超时 (秒)
    #[arg(long)]
    dwell_seconds: Option<f64>,

    /// 视频帧率
    #[arg(long)]
    fps: Option<f64>,

    /// 拥堵告警去抖窗口 (帧, 0=关闭)
    #[arg(long)]
    debounce: Option<u32>,

    /// 只统计这些类别 (逗号分隔,如 person)
    #[arg(long, value_delimiter = ',')]
    classes: Vec<String>,

    /// 结果输出文件 (JSON Lines, 默认标准输出)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 标注背景图 (摄像头静帧),指定后逐帧输出标注图
    #[arg(long)]
    background: Option<PathBuf>,

    /// 标注图输出目录
    #[arg(long)]
    render_dir: Option<PathBuf>,

    /// 标注字体 (TTF)
    #[arg(long)]
    font: Option<PathBuf>,

    /// 标注线宽
    #[arg(long, default_value_t = 2)]
    line_width: u32,

    /// 不在标注图上显示排队人数
    #[arg(long)]
    hide_counts: bool,
}

impl Args {
    /// 配置文件 + 命令行覆盖
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load_or_create(path)?,
            None => EngineConfig::default(),
        };
        if let Some(region) = &self.region {
            config.region = RegionPolygon::parse(region)
                .context("监控区域格式错误")?
                .points()
                .to_vec();
        }
        if let Some(threshold) = self.congestion_threshold {
            config.congestion_threshold = threshold;
        }
        if let Some(seconds) = self.dwell_seconds {
            config.dwell_seconds = seconds;
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(debounce) = self.debounce {
            config.congestion_debounce_frames = debounce;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.engine_config()?;
    config.print_summary();

    let mut engine = QueueEngine::new(&config).context("引擎配置无效")?;

    let mut source = JsonLinesSource::open(&args.input)?.with_classes(args.classes.clone());
    info!("📹 跟踪结果: {}", args.input.display());
    if !args.classes.is_empty() {
        info!("🎯 类别过滤: {}", args.classes.join(", "));
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("创建输出文件失败: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    // ========== 标注输出 (可选) ==========
    let background = match &args.background {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("读取背景图失败: {}", path.display()))?
                .to_rgb8(),
        ),
        None => None,
    };
    let render_dir = match (&background, &args.render_dir) {
        (Some(_), Some(dir)) => Some(dir.clone()),
        (Some(_), None) => Some(PathBuf::from(format!("runs/queue_{}", gen_time_string("")))),
        (None, Some(_)) => {
            warn!("⚠️ 未指定 --background,忽略 --render-dir");
            None
        }
        (None, None) => None,
    };
    if let Some(dir) = &render_dir {
        fs::create_dir_all(dir).with_context(|| format!("创建输出目录失败: {}", dir.display()))?;
        info!("🖼️  标注图输出: {}", dir.display());
    }
    let mut annotator = Annotator::new(args.line_width);
    if let Some(font) = &args.font {
        annotator = annotator.with_font_file(font)?;
    }
    if args.hide_counts {
        annotator.hide_counts();
    }

    info!("✅ 系统就绪,开始监控...");

    let mut active: BTreeSet<String> = BTreeSet::new();
    let mut skipped = 0u64;
    let mut consecutive_errors = 0u32;
    loop {
        let record = match source.next_frame() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                // 单帧输入错误不影响引擎状态
                warn!("⚠️ 跳过无效帧: {:#}", e);
                skipped += 1;
                consecutive_errors += 1;
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    return Err(e.context("连续无效帧过多,停止回放"));
                }
                continue;
            }
        };
        consecutive_errors = 0;

        let report = engine.process_frame(&record.detections);

        // 告警变化时输出日志 (告警逐帧重新计算)
        let alerts: BTreeSet<String> = report.alerts().iter().map(Alert::to_string).collect();
        for raised in alerts.difference(&active) {
            warn!("🚨 帧 {}: {}", report.frame_index, raised);
        }
        for cleared in active.difference(&alerts) {
            info!("✅ 帧 {}: 解除 {}", report.frame_index, cleared);
        }
        active = alerts;

        serde_json::to_writer(&mut out, &report).context("写出结果失败")?;
        writeln!(out)?;

        if let (Some(background), Some(dir)) = (&background, &render_dir) {
            let mut canvas = background.clone();
            annotator.annotate(&mut canvas, engine.region(), &report);
            save_frame(&canvas, dir, report.frame_index)?;
        }
    }
    out.flush()?;

    let summary = engine.summary();
    info!("📊 处理完成: {} 帧 (跳过 {} 行)", summary.frames_processed, skipped);
    if source.gaps() > 0 {
        warn!("  源帧号不连续: {} 处 (跟踪器可能丢帧)", source.gaps());
    }
    info!("  最大排队人数: {}", summary.peak_queue_count);
    info!("  拥堵帧数: {}", summary.congested_frames);
    info!("  停留超时ID: {:?}", summary.dwell_alerted_ids);

    Ok(())
}
