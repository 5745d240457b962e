//! 动作反馈模块
//!
//! 纯函数：根据稳定标签、几何特征和计数状态生成一条主提示、严重程度
//! 以及若干条动作建议。没有需要纠正的问题时给出一条正向鼓励。
//!
//! 深度类判断复用计数阈值，保证"下蹲到位"提示与状态机进入 Down 一致。

use serde::{Deserialize, Serialize};

use crate::classifier::ExerciseLabel;
use crate::config::CoachConfig;
use crate::counter::{driving_angle, CounterOutcome, RepState};
use crate::geometry::FrameGeometry;
use crate::stabilizer::LabelPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warn,
    Bad,
}

impl Severity {
    /// 界面颜色
    pub fn color(self) -> &'static str {
        match self {
            Severity::Good => "#00ff00",
            Severity::Warn => "#ffcc00",
            Severity::Bad => "#ff4757",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub severity: Severity,
    pub advice: Vec<String>,
}

impl Feedback {
    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            advice: Vec::new(),
        }
    }

    fn with_advice(mut self, advice: Vec<String>) -> Self {
        self.advice = advice;
        self
    }
}

/// 生成反馈所需的单帧上下文
#[derive(Debug, Clone, Copy)]
pub struct FeedbackContext<'a> {
    pub label: ExerciseLabel,
    pub phase: LabelPhase,
    pub pose_present: bool,
    pub geometry: &'a FrameGeometry,
    pub reps: &'a RepState,
    pub outcome: CounterOutcome,
}

const POSITIONING_TIPS: [&str; 3] = [
    "Stand side-on to the camera",
    "Make sure your whole body is in the frame",
    "Wear fitted clothing",
];

const NO_POSE_TIPS: [&str; 3] = [
    "Keep your whole body in the frame",
    "Use good lighting",
    "Stand side-on to the camera",
];

fn tips(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn generate(ctx: &FeedbackContext<'_>, cfg: &CoachConfig) -> Feedback {
    if !ctx.pose_present {
        return Feedback::new("No pose detected", Severity::Bad).with_advice(tips(&NO_POSE_TIPS));
    }

    if ctx.label.is_exercise() && driving_angle(ctx.label, ctx.geometry).is_nan() {
        return Feedback::new("Key joints are not visible", Severity::Warn)
            .with_advice(tips(&POSITIONING_TIPS));
    }

    match ctx.label {
        ExerciseLabel::Squats => squats(ctx, cfg),
        ExerciseLabel::Lunges => lunges(ctx, cfg),
        ExerciseLabel::Plank => plank(ctx, cfg),
        ExerciseLabel::Pushups => pushups(ctx, cfg),
        ExerciseLabel::None => stance(ctx.phase),
    }
}

fn stance(phase: LabelPhase) -> Feedback {
    match phase {
        LabelPhase::Grace => Feedback::new("Tracking lost, hold your position", Severity::Warn)
            .with_advice(vec!["Stay inside the frame".to_string()]),
        _ => Feedback::new("Stance. Get into position for an exercise.", Severity::Warn)
            .with_advice(tips(&POSITIONING_TIPS)),
    }
}

/// 状态转换帧的提示覆盖动作质量提示
fn transition(outcome: CounterOutcome, going_down: &str, rep_done: &str) -> Option<Feedback> {
    match outcome {
        CounterOutcome::WentDown => Some(Feedback::new(going_down, Severity::Warn)),
        CounterOutcome::RepCompleted => Some(Feedback::new(rep_done, Severity::Good)),
        _ => None,
    }
}

fn squats(ctx: &FeedbackContext<'_>, cfg: &CoachConfig) -> Feedback {
    let g = ctx.geometry;
    let fb = &cfg.feedback;
    let knee = g.avg_knee();
    let deep = knee < cfg.counter.squats.down_below;

    let base = if deep && g.hip_angle > fb.squat_back_angle_min {
        Feedback::new("Great! Deep squat, straight back", Severity::Good)
    } else if deep {
        Feedback::new("Deep, but your back is leaning", Severity::Bad)
    } else if knee < fb.squat_partial_depth {
        Feedback::new("Good, you can squat a little deeper", Severity::Warn)
    } else {
        Feedback::new("Start the squat", Severity::Bad)
    };
    let message = transition(ctx.outcome, "Going down...", "Great! +1 rep").unwrap_or(base);

    let mut advice = Vec::new();
    if knee > fb.squat_partial_depth {
        advice.push("Squat deeper (aim for about 90° at the knees)".to_string());
    }
    if g.hip_angle < fb.squat_back_angle_min {
        advice.push("Keep your back straight, chest up".to_string());
    }
    if g.knee_asymmetry() > fb.symmetry_tolerance {
        advice.push("Spread your weight evenly over both legs".to_string());
    }
    if advice.is_empty() {
        advice.push("Great technique! Keep it up".to_string());
    }
    message.with_advice(advice)
}

fn lunges(ctx: &FeedbackContext<'_>, cfg: &CoachConfig) -> Feedback {
    let g = ctx.geometry;
    let fb = &cfg.feedback;
    let front = g.front_knee();
    let offset = front - fb.lunge_target_angle;

    let base = if offset.abs() < fb.lunge_target_tolerance {
        Feedback::new("Perfect! Front knee at 90°", Severity::Good)
    } else if offset < 0.0 {
        Feedback::new("Don't sink too low on the front leg", Severity::Bad)
    } else {
        Feedback::new("Bend your front leg more", Severity::Bad)
    };
    let message =
        transition(ctx.outcome, "Lowering into the lunge...", "Great! +1 lunge").unwrap_or(base);

    let mut advice = Vec::new();
    if offset > fb.lunge_advice_tolerance {
        advice.push("Bend your front knee more (target 90°)".to_string());
    } else if offset < -fb.lunge_advice_tolerance {
        advice.push("Don't drop too low, keep the front knee at 90°".to_string());
    }
    if g.back_knee() < fb.lunge_back_leg_min {
        advice.push("Keep your back leg almost straight".to_string());
    }
    if g.hip_level_offset > fb.pelvis_level_max {
        advice.push("Keep your pelvis level, don't tilt to one side".to_string());
    }
    if advice.is_empty() {
        advice.push("Perfect lunge! Knee stays behind the toes".to_string());
    }
    message.with_advice(advice)
}

fn plank(ctx: &FeedbackContext<'_>, cfg: &CoachConfig) -> Feedback {
    let g = ctx.geometry;
    let fb = &cfg.feedback;

    let message = match ctx.outcome {
        CounterOutcome::HoldStarted => Feedback::new("Plank started! Hold it", Severity::Warn),
        CounterOutcome::Holding => {
            let secs = ctx.reps.hold_seconds;
            let mut text = format!("Hold it! {secs} s, body straight");
            if secs > fb.plank_long_hold_secs {
                text.push_str(" Excellent!");
            }
            Feedback::new(text, Severity::Good)
        }
        _ => Feedback::new("Your back or hips are sagging, straighten up!", Severity::Bad),
    };

    let mut advice = Vec::new();
    if g.body_line < cfg.counter.plank_hold_min {
        advice.push("Brace your abs and glutes to keep the body straight".to_string());
    }
    if g.hip_angle < fb.plank_hip_angle_min {
        advice.push("Lower your hips so the body forms a straight line".to_string());
    }
    if g.hip_y < g.shoulder_y {
        advice.push("Hips are too high, lower them".to_string());
    }
    if advice.is_empty() {
        advice.push("Great plank! Straight as a string".to_string());
    }
    message.with_advice(advice)
}

fn pushups(ctx: &FeedbackContext<'_>, cfg: &CoachConfig) -> Feedback {
    let g = ctx.geometry;
    let fb = &cfg.feedback;
    let elbow = g.avg_elbow();

    let base = if elbow < cfg.counter.pushups.down_below {
        Feedback::new("Great! Full range of motion", Severity::Good)
    } else if elbow < fb.pushup_partial_depth {
        Feedback::new("Good, go a little lower", Severity::Warn)
    } else {
        Feedback::new("Start the push-up", Severity::Bad)
    };
    let message = transition(ctx.outcome, "Going down...", "Great! +1 push-up").unwrap_or(base);

    let mut advice = Vec::new();
    if elbow > fb.pushup_partial_depth {
        advice.push("Go lower, bend your elbows to 90°".to_string());
    }
    if g.elbow_asymmetry() > fb.symmetry_tolerance {
        advice.push("Keep your elbows symmetric".to_string());
    }
    if g.body_line < fb.pushup_body_line_min {
        advice.push("Keep your body in a straight line, don't sag at the waist".to_string());
    }
    if advice.is_empty() {
        advice.push("Great push-up technique!".to_string());
    }
    message.with_advice(advice)
}
