//! 标签平滑模块
//!
//! 固定长度环形缓冲区保存最近 N 帧原始标签，输出其中出现次数最多的
//! 非 none 标签；次数相同时取最早写入的标签。
//!
//! 同时维护"最近一次可信标签"时间戳：稳定标签为 none 且超过重置窗口后
//! 清空历史并复位时钟，之前的短暂丢失视为追踪抖动（宽限期）。

use serde::{Deserialize, Serialize};

use crate::classifier::ExerciseLabel;
use crate::config::StabilizerConfig;

/// 稳定标签所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPhase {
    /// 稳定标签为某个动作
    Tracking,
    /// 稳定标签为 none，但仍在重置窗口内
    Grace,
    /// 重置窗口刚刚耗尽，历史已清空
    Reset,
    /// 上次重置后尚未出现可信标签
    #[default]
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StableLabel {
    pub label: ExerciseLabel,
    pub phase: LabelPhase,
}

/// 多数投票标签平滑器
#[derive(Debug, Clone)]
pub struct LabelStabilizer {
    history: Vec<ExerciseLabel>,
    cursor: usize,
    last_confident_ts: Option<f64>,
    reset_window_ms: f64,
    current: StableLabel,
}

impl LabelStabilizer {
    pub fn new(window: usize, reset_window_ms: f64) -> Self {
        Self {
            history: vec![ExerciseLabel::None; window.max(1)],
            cursor: 0,
            last_confident_ts: None,
            reset_window_ms,
            current: StableLabel::default(),
        }
    }

    pub fn from_config(config: &StabilizerConfig) -> Self {
        Self::new(config.window, config.reset_window_ms)
    }

    /// 写入一帧原始标签，返回平滑后的标签
    pub fn push(&mut self, raw: ExerciseLabel, timestamp: f64) -> StableLabel {
        self.history[self.cursor] = raw;
        self.cursor = (self.cursor + 1) % self.history.len();

        let label = self.majority();
        let phase = if label.is_exercise() {
            self.last_confident_ts = Some(timestamp);
            LabelPhase::Tracking
        } else {
            match self.last_confident_ts {
                Some(ts) if timestamp - ts > self.reset_window_ms => {
                    self.clear();
                    LabelPhase::Reset
                }
                Some(_) => LabelPhase::Grace,
                None => LabelPhase::Idle,
            }
        };

        self.current = StableLabel { label, phase };
        self.current
    }

    pub fn current(&self) -> StableLabel {
        self.current
    }

    pub fn window(&self) -> usize {
        self.history.len()
    }

    pub fn last_confident_ts(&self) -> Option<f64> {
        self.last_confident_ts
    }

    /// 按写入顺序（由旧到新）遍历历史
    pub fn history(&self) -> impl Iterator<Item = ExerciseLabel> + '_ {
        let (newer, older) = self.history.split_at(self.cursor);
        older.iter().chain(newer.iter()).copied()
    }

    /// 清空历史并复位可信时钟
    pub fn clear(&mut self) {
        self.history.fill(ExerciseLabel::None);
        self.cursor = 0;
        self.last_confident_ts = None;
        self.current = StableLabel::default();
    }

    fn majority(&self) -> ExerciseLabel {
        // 按首次出现顺序记录计数，保证平局时结果确定
        let mut counts: Vec<(ExerciseLabel, usize)> = Vec::with_capacity(4);
        for label in self.history().filter(|l| l.is_exercise()) {
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }

        let mut best = ExerciseLabel::None;
        let mut best_count = 0;
        for (label, count) in counts {
            if count > best_count {
                best = label;
                best_count = count;
            }
        }
        best
    }
}
