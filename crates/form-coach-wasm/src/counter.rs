//! 计次 / 计时状态机
//!
//! 深蹲、弓步、俯卧撑共用同一个两态机，只是驱动角度和阈值不同：
//! Up →（角度 < down_below）→ Down →（角度 > up_above 且超过去抖间隔）→ Up，计数 +1
//!
//! 平板支撑是连续计时：身体直线角度持续高于阈值时累计秒数，
//! 任何一帧中断都会清零，不做暂停/恢复。

use serde::{Deserialize, Serialize};

use crate::classifier::ExerciseLabel;
use crate::config::{CounterConfig, RepThresholds};
use crate::geometry::FrameGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Up,
    Down,
}

/// 单帧状态机更新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOutcome {
    #[default]
    #[serde(rename = "none")]
    Unchanged,
    WentDown,
    RepCompleted,
    HoldStarted,
    Holding,
    HoldBroken,
}

/// 当前跟踪动作的计数状态，由会话独占
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepState {
    pub exercise: ExerciseLabel,
    pub stage: Stage,
    pub count: u32,
    /// 上次计数时间戳，None 表示尚未计数（不受去抖限制）
    pub last_rep_at: Option<f64>,
    pub hold_started_at: Option<f64>,
    pub hold_seconds: u32,
}

impl RepState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 清零并切换到新的跟踪动作
    pub fn reset_for(&mut self, exercise: ExerciseLabel) {
        *self = Self {
            exercise,
            ..Self::default()
        };
    }

    pub fn is_holding(&self) -> bool {
        self.hold_started_at.is_some()
    }

    fn update_reps(
        &mut self,
        angle: f64,
        thresholds: RepThresholds,
        min_interval_ms: f64,
        timestamp: f64,
    ) -> CounterOutcome {
        match self.stage {
            Stage::Up if angle < thresholds.down_below => {
                self.stage = Stage::Down;
                CounterOutcome::WentDown
            }
            Stage::Down if angle > thresholds.up_above => {
                let debounced = self
                    .last_rep_at
                    .map_or(true, |last| timestamp - last > min_interval_ms);
                if !debounced {
                    // 保持 Down，下一帧满足间隔后再计数
                    return CounterOutcome::Unchanged;
                }
                self.stage = Stage::Up;
                self.count += 1;
                self.last_rep_at = Some(timestamp);
                CounterOutcome::RepCompleted
            }
            _ => CounterOutcome::Unchanged,
        }
    }

    fn update_hold(&mut self, body_line: f64, hold_min: f64, timestamp: f64) -> CounterOutcome {
        if !(body_line > hold_min) {
            return self.break_hold();
        }
        match self.hold_started_at {
            None => {
                self.hold_started_at = Some(timestamp);
                self.hold_seconds = 0;
                CounterOutcome::HoldStarted
            }
            Some(start) => {
                self.hold_seconds = ((timestamp - start) / 1000.0).floor().max(0.0) as u32;
                CounterOutcome::Holding
            }
        }
    }

    /// 中断计时并清零秒数
    pub fn break_hold(&mut self) -> CounterOutcome {
        let was_holding = self.hold_started_at.take().is_some();
        self.hold_seconds = 0;
        if was_holding {
            CounterOutcome::HoldBroken
        } else {
            CounterOutcome::Unchanged
        }
    }
}

/// 计次动作的驱动角度；非计次动作返回 NaN
pub fn driving_angle(label: ExerciseLabel, g: &FrameGeometry) -> f64 {
    match label {
        ExerciseLabel::Squats => g.avg_knee(),
        ExerciseLabel::Lunges => g.front_knee(),
        ExerciseLabel::Pushups => g.avg_elbow(),
        ExerciseLabel::Plank => g.body_line,
        ExerciseLabel::None => f64::NAN,
    }
}

fn thresholds_for(label: ExerciseLabel, cfg: &CounterConfig) -> Option<RepThresholds> {
    match label {
        _ if !label.is_counted() => None,
        ExerciseLabel::Squats => Some(cfg.squats),
        ExerciseLabel::Lunges => Some(cfg.lunges),
        _ => Some(cfg.pushups),
    }
}

/// 按稳定标签推进状态机
///
/// 标签切换时的清零由调用方（会话）负责，这里只处理阶段转换。
pub fn update(
    state: &mut RepState,
    label: ExerciseLabel,
    g: &FrameGeometry,
    cfg: &CounterConfig,
    timestamp: f64,
) -> CounterOutcome {
    if label != ExerciseLabel::Plank && state.is_holding() {
        return state.break_hold();
    }

    match label {
        ExerciseLabel::Plank => state.update_hold(g.body_line, cfg.plank_hold_min, timestamp),
        counted => match thresholds_for(counted, cfg) {
            Some(t) => state.update_reps(
                driving_angle(counted, g),
                t,
                cfg.min_rep_interval_ms,
                timestamp,
            ),
            None => CounterOutcome::Unchanged,
        },
    }
}
