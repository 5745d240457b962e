//! 会话模块
//!
//! `CoachSession` 独占标签平滑器与计数状态，串联单帧流水线：
//! 几何特征 → 分类（锁定动作时跳过）→ 标签平滑 → 计次/计时 → 反馈。
//!
//! 计数清零时机：
//! - 用户手动重置
//! - 稳定标签切换到另一个动作
//! - 平滑器报告重置（长时间无可信标签）
//! - 开始实时会话、分析照片、切换动作选择
//!
//! 宽限期内不清零，短暂丢失追踪不会丢掉已完成的次数。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::classifier::{classify_geometry, ExerciseLabel, UnknownLabel};
use crate::config::CoachConfig;
use crate::counter::{self, CounterOutcome, RepState, Stage};
use crate::feedback::{self, FeedbackContext, Severity};
use crate::geometry::FrameGeometry;
use crate::pose::Pose;
use crate::stabilizer::{LabelPhase, LabelStabilizer, StableLabel};

/// 输入来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Live,
    Photo,
}

/// 自动识别，或锁定为某个动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExerciseSelection {
    #[default]
    Auto,
    Pinned(ExerciseLabel),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Unknown(#[from] UnknownLabel),
    #[error("'none' is not an exercise; use 'auto' to resume automatic detection")]
    NotAnExercise,
}

impl FromStr for ExerciseSelection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ExerciseSelection::Auto);
        }
        match s.parse::<ExerciseLabel>()? {
            ExerciseLabel::None => Err(SelectionError::NotAnExercise),
            label => Ok(ExerciseSelection::Pinned(label)),
        }
    }
}

impl fmt::Display for ExerciseSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseSelection::Auto => f.write_str("auto"),
            ExerciseSelection::Pinned(label) => write!(f, "{label}"),
        }
    }
}

/// 单帧处理结果，UI 或测试只观察这一结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResult {
    /// 时间戳（毫秒）
    pub timestamp_ms: f64,
    pub mode: SessionMode,
    pub pose_present: bool,
    /// 分类器原始输出（锁定动作时为锁定标签）
    pub raw_label: ExerciseLabel,
    pub stable_label: ExerciseLabel,
    /// 展示名称
    pub exercise_name: String,
    pub phase: LabelPhase,
    pub stage: Stage,
    pub rep_count: u32,
    /// 非平板支撑时为 0
    pub hold_seconds: u32,
    pub outcome: CounterOutcome,
    pub message: String,
    pub severity: Severity,
    pub color: String,
    pub advice: Vec<String>,
}

/// 动作识别与计数会话
#[wasm_bindgen]
pub struct CoachSession {
    config: CoachConfig,
    stabilizer: LabelStabilizer,
    reps: RepState,
    selection: ExerciseSelection,
    mode: SessionMode,
    frames_processed: u64,
}

impl Default for CoachSession {
    fn default() -> Self {
        Self::build(CoachConfig::default())
    }
}

impl CoachSession {
    fn build(config: CoachConfig) -> Self {
        Self {
            stabilizer: LabelStabilizer::from_config(&config.stabilizer),
            config,
            reps: RepState::new(),
            selection: ExerciseSelection::Auto,
            mode: SessionMode::Live,
            frames_processed: 0,
        }
    }

    /// 使用自定义阈值表创建会话，阈值不合法时返回错误
    pub fn with_config(config: CoachConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn rep_state(&self) -> &RepState {
        &self.reps
    }

    pub fn stable_label(&self) -> StableLabel {
        self.stabilizer.current()
    }

    pub fn selection(&self) -> ExerciseSelection {
        self.selection
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// 处理一帧；`pose` 为 None 表示该帧未检测到人体
    pub fn process(&mut self, pose: Option<&Pose>, timestamp: f64) -> FrameResult {
        let geometry = match pose {
            Some(p) => FrameGeometry::measure(p, &self.config.geometry),
            None => FrameGeometry::undetermined(),
        };

        let raw_label = match (pose, self.selection) {
            (None, _) => ExerciseLabel::None,
            (Some(_), ExerciseSelection::Pinned(label)) => label,
            (Some(_), ExerciseSelection::Auto) => {
                classify_geometry(&geometry, &self.config.classifier)
            }
        };

        let stable = self.stabilizer.push(raw_label, timestamp);
        if stable.phase == LabelPhase::Reset {
            self.reps.reset();
        } else if stable.label.is_exercise() && stable.label != self.reps.exercise {
            self.reps.reset_for(stable.label);
        }

        let outcome = counter::update(
            &mut self.reps,
            stable.label,
            &geometry,
            &self.config.counter,
            timestamp,
        );

        let fb = feedback::generate(
            &FeedbackContext {
                label: stable.label,
                phase: stable.phase,
                pose_present: pose.is_some(),
                geometry: &geometry,
                reps: &self.reps,
                outcome,
            },
            &self.config,
        );

        self.frames_processed += 1;

        FrameResult {
            timestamp_ms: timestamp,
            mode: self.mode,
            pose_present: pose.is_some(),
            raw_label,
            stable_label: stable.label,
            exercise_name: stable.label.display_name().to_string(),
            phase: stable.phase,
            stage: self.reps.stage,
            rep_count: self.reps.count,
            hold_seconds: if stable.label == ExerciseLabel::Plank {
                self.reps.hold_seconds
            } else {
                0
            },
            outcome,
            color: fb.severity.color().to_string(),
            message: fb.message,
            severity: fb.severity,
            advice: fb.advice,
        }
    }

    /// 开始新的实时会话
    pub fn begin_live(&mut self) {
        self.mode = SessionMode::Live;
        self.restart();
    }

    /// 单张照片分析：清空状态后只处理这一帧
    pub fn analyze_still(&mut self, pose: Option<&Pose>, timestamp: f64) -> FrameResult {
        self.mode = SessionMode::Photo;
        self.restart();
        self.process(pose, timestamp)
    }

    pub fn select_exercise(&mut self, selection: ExerciseSelection) {
        self.selection = selection;
        self.restart();
    }

    /// 计数清零，保留标签平滑历史
    pub fn reset_counters(&mut self) {
        let exercise = self.reps.exercise;
        self.reps.reset_for(exercise);
    }

    /// 清空全部会话状态（动作选择与模式除外）
    pub fn restart(&mut self) {
        self.stabilizer.clear();
        self.reps.reset();
        self.frames_processed = 0;
    }
}

#[wasm_bindgen]
impl CoachSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JS 对象（camelCase 阈值表，可部分覆盖）创建会话
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn from_js_config(config: JsValue) -> Result<CoachSession, JsError> {
        let config: CoachConfig = serde_wasm_bindgen::from_value(config)?;
        Self::with_config(config).map_err(|e| JsError::new(&e))
    }

    /// 处理一帧 MediaPipe 输出
    ///
    /// # 参数
    /// - `landmarks`: 按 x, y, z, visibility 扁平排列的关键点；空数组表示未检测到人体
    /// - `timestamp`: 毫秒时间戳，缺省取 `Date.now()`
    ///
    /// # 返回
    /// 序列化为 JsValue 的 FrameResult
    #[wasm_bindgen(js_name = "processFrame")]
    pub fn process_frame(
        &mut self,
        landmarks: &[f64],
        timestamp: Option<f64>,
    ) -> Result<JsValue, JsError> {
        let pose = Self::parse_landmarks(landmarks)?;
        let ts = timestamp.unwrap_or_else(js_sys::Date::now);
        let result = self.process(pose.as_ref(), ts);
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    #[wasm_bindgen(js_name = "analyzePhoto")]
    pub fn analyze_photo(&mut self, landmarks: &[f64]) -> Result<JsValue, JsError> {
        let pose = Self::parse_landmarks(landmarks)?;
        let result = self.analyze_still(pose.as_ref(), js_sys::Date::now());
        Ok(serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL))
    }

    /// `name` 为动作名或 "auto"
    #[wasm_bindgen(js_name = "selectExercise")]
    pub fn select_exercise_js(&mut self, name: &str) -> Result<(), JsError> {
        let selection: ExerciseSelection = name.parse()?;
        self.select_exercise(selection);
        Ok(())
    }

    #[wasm_bindgen(js_name = "startCamera")]
    pub fn start_camera(&mut self) {
        self.begin_live();
    }

    pub fn reset(&mut self) {
        self.reset_counters();
    }

    #[wasm_bindgen(js_name = "restart")]
    pub fn restart_js(&mut self) {
        self.restart();
    }

    #[wasm_bindgen(getter, js_name = "repCount")]
    pub fn rep_count(&self) -> u32 {
        self.reps.count
    }

    #[wasm_bindgen(getter, js_name = "holdSeconds")]
    pub fn hold_seconds(&self) -> u32 {
        self.reps.hold_seconds
    }

    #[wasm_bindgen(getter, js_name = "currentExercise")]
    pub fn current_exercise(&self) -> String {
        self.stabilizer.current().label.as_str().to_string()
    }
}

impl CoachSession {
    fn parse_landmarks(landmarks: &[f64]) -> Result<Option<Pose>, crate::pose::PoseError> {
        if landmarks.is_empty() {
            return Ok(None);
        }
        Pose::from_flat(landmarks).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{plank_pose, standing_pose, KneeBend};

    fn squat(angle: f64) -> Pose {
        standing_pose(KneeBend::both(angle))
    }

    /// 每 100ms 一帧
    fn feed(session: &mut CoachSession, start_ts: f64, poses: &[Option<Pose>]) -> Vec<FrameResult> {
        poses
            .iter()
            .enumerate()
            .map(|(i, p)| session.process(p.as_ref(), start_ts + i as f64 * 100.0))
            .collect()
    }

    fn squat_cycle() -> Vec<Option<Pose>> {
        [170.0, 130.0, 110.0, 90.0, 90.0, 120.0, 150.0, 165.0, 170.0]
            .into_iter()
            .map(|a| Some(squat(a)))
            .collect()
    }

    #[test]
    fn auto_mode_counts_a_squat() {
        let mut session = CoachSession::default();
        let results = feed(&mut session, 0.0, &squat_cycle());

        assert_eq!(results[0].stable_label, ExerciseLabel::None);
        assert_eq!(results[1].stable_label, ExerciseLabel::Squats);
        assert_eq!(results[3].outcome, CounterOutcome::WentDown);
        assert_eq!(results[7].outcome, CounterOutcome::RepCompleted);
        assert_eq!(results[7].message, "Great! +1 rep");
        // 回到站立后原始标签为 none，稳定标签仍是深蹲
        assert_eq!(results[8].raw_label, ExerciseLabel::None);
        assert_eq!(results[8].stable_label, ExerciseLabel::Squats);
        assert_eq!(session.rep_state().count, 1);
    }

    #[test]
    fn grace_keeps_count_and_reset_clears_it() {
        let mut session = CoachSession::default();
        feed(&mut session, 0.0, &squat_cycle());
        assert_eq!(session.rep_state().count, 1);

        // 窗口内最后一个深蹲标签在 900ms 这一帧被挤出
        let lost: Vec<Option<Pose>> = vec![None; 5];
        let results = feed(&mut session, 900.0, &lost);
        assert!(results.iter().all(|r| r.rep_count == 1));
        assert_eq!(results[4].phase, LabelPhase::Grace);
        assert!(!results[4].pose_present);

        let late = session.process(None, 3000.0);
        assert_eq!(late.phase, LabelPhase::Reset);
        assert_eq!(late.rep_count, 0);
        assert_eq!(session.rep_state().exercise, ExerciseLabel::None);
    }

    #[test]
    fn switching_exercise_resets_count() {
        let mut session = CoachSession::default();
        feed(&mut session, 0.0, &squat_cycle());
        assert_eq!(session.rep_state().count, 1);

        let planks: Vec<Option<Pose>> = (0..8).map(|_| Some(plank_pose(178.0))).collect();
        let results = feed(&mut session, 1000.0, &planks);
        let last = results.last().unwrap();
        assert_eq!(last.stable_label, ExerciseLabel::Plank);
        assert_eq!(last.rep_count, 0);
        assert_eq!(session.rep_state().exercise, ExerciseLabel::Plank);
    }

    #[test]
    fn plank_hold_reports_seconds() {
        let mut session = CoachSession::default();
        let first = session.process(Some(&plank_pose(178.0)), 0.0);
        assert_eq!(first.outcome, CounterOutcome::HoldStarted);
        let later = session.process(Some(&plank_pose(178.0)), 2500.0);
        assert_eq!(later.hold_seconds, 2);
        assert_eq!(later.severity, Severity::Good);
    }

    #[test]
    fn pinned_exercise_bypasses_classifier() {
        let mut session = CoachSession::default();
        session.select_exercise("lunges".parse().unwrap());
        let r = session.process(Some(&squat(175.0)), 0.0);
        assert_eq!(r.raw_label, ExerciseLabel::Lunges);
        assert_eq!(r.stable_label, ExerciseLabel::Lunges);

        // 锁定时无人体帧仍为 none
        let r = session.process(None, 100.0);
        assert_eq!(r.raw_label, ExerciseLabel::None);
    }

    #[test]
    fn selecting_none_is_rejected() {
        assert_eq!(
            "none".parse::<ExerciseSelection>(),
            Err(SelectionError::NotAnExercise)
        );
        assert!("jumping".parse::<ExerciseSelection>().is_err());
        assert_eq!("AUTO".parse::<ExerciseSelection>(), Ok(ExerciseSelection::Auto));
        assert_eq!(
            ExerciseSelection::Pinned(ExerciseLabel::Plank).to_string(),
            "plank"
        );
    }

    #[test]
    fn reset_counters_keeps_tracking() {
        let mut session = CoachSession::default();
        feed(&mut session, 0.0, &squat_cycle());
        session.reset_counters();
        assert_eq!(session.rep_state().count, 0);
        assert_eq!(session.rep_state().exercise, ExerciseLabel::Squats);
        assert_eq!(session.stable_label().label, ExerciseLabel::Squats);
    }

    #[test]
    fn still_analysis_starts_from_scratch() {
        let mut session = CoachSession::default();
        feed(&mut session, 0.0, &squat_cycle());

        let r = session.analyze_still(Some(&squat(90.0)), 5000.0);
        assert_eq!(r.mode, SessionMode::Photo);
        assert_eq!(r.stable_label, ExerciseLabel::Squats);
        assert_eq!(r.rep_count, 0);
        assert_eq!(session.frames_processed(), 1);

        session.begin_live();
        assert_eq!(session.mode(), SessionMode::Live);
        assert_eq!(session.stable_label().label, ExerciseLabel::None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = CoachConfig::default();
        config.stabilizer.window = 0;
        assert!(CoachSession::with_config(config).is_err());
    }

    #[test]
    fn frame_result_uses_camel_case() {
        let mut session = CoachSession::default();
        let r = session.process(None, 0.0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["stableLabel"], "none");
        assert_eq!(json["repCount"], 0);
        assert_eq!(json["severity"], "bad");
        assert_eq!(json["color"], "#ff4757");
        assert_eq!(json["phase"], "idle");
    }
}
