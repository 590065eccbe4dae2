// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 拥堵判定 (Congestion Evaluator)
//!
//! `congested` 为逐帧原始比较,无迟滞。
//! 可选的去抖窗口单独输出为 `alert`,原始标志不受影响。

/// 拥堵判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CongestionState {
    /// 原始判定: 排队人数 > 阈值
    pub congested: bool,
    /// 去抖后的告警 (窗口为0时等于原始判定)
    pub alert: bool,
}

#[derive(Debug, Clone)]
pub struct CongestionEvaluator {
    threshold: usize,
    debounce_frames: u32,
    alert: bool,
    /// 与当前告警状态相反的连续帧数
    opposing_streak: u32,
}

impl CongestionEvaluator {
    pub fn new(threshold: usize, debounce_frames: u32) -> Self {
        Self {
            threshold,
            debounce_frames,
            alert: false,
            opposing_streak: 0,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 纯比较
    pub fn is_congested(&self, queue_count: usize) -> bool {
        queue_count > self.threshold
    }

    pub fn evaluate(&mut self, queue_count: usize) -> CongestionState {
        let congested = self.is_congested(queue_count);

        if congested == self.alert {
            self.opposing_streak = 0;
        } else {
            self.opposing_streak += 1;
            if self.opposing_streak >= self.debounce_frames {
                self.alert = congested;
                self.opposing_streak = 0;
            }
        }

        CongestionState {
            congested,
            alert: self.alert,
        }
    }

    pub fn reset(&mut self) {
        self.alert = false;
        self.opposing_streak = 0;
    }
}
