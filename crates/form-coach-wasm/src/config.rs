//! 阈值配置表
//!
//! 分类、平滑、计数与反馈用到的全部数值都集中在这里，一套规范取值，
//! 可通过 JSON（camelCase）整体或部分覆盖，构建会话前需通过 `validate`。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeometryConfig {
    /// 肩髋平均高度差低于此值视为身体水平（归一化坐标）
    pub horizontal_tolerance: f64,
    /// 关键点可见度低于此值时，该关节角度视为无法确定
    pub joint_min_visibility: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            horizontal_tolerance: 0.10,
            joint_min_visibility: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// 双肩、双髋、双膝平均可见度门限
    pub min_key_visibility: f64,
    /// 自动识别是否包含俯卧撑
    pub pushups_enabled: bool,
    pub pushup_elbow_max: f64,
    pub pushup_body_line_min: f64,
    /// 双膝角度差超过此值才可能是弓步
    pub lunge_asymmetry_min: f64,
    pub lunge_front_knee_max: f64,
    pub lunge_back_knee_min: f64,
    /// 左右髋或左右踝高度差下限，用于确认前后错步
    pub lunge_stance_offset_min: f64,
    pub squat_knee_max: f64,
    pub squat_asymmetry_max: f64,
    pub plank_knee_min: f64,
    pub plank_body_line_min: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_key_visibility: 0.30,
            pushups_enabled: false,
            pushup_elbow_max: 120.0,
            pushup_body_line_min: 160.0,
            lunge_asymmetry_min: 40.0,
            lunge_front_knee_max: 120.0,
            lunge_back_knee_min: 150.0,
            lunge_stance_offset_min: 0.03,
            squat_knee_max: 140.0,
            squat_asymmetry_max: 40.0,
            plank_knee_min: 160.0,
            plank_body_line_min: 165.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StabilizerConfig {
    /// 多数投票窗口长度（帧）
    pub window: usize,
    /// 连续无可信标签超过此时长后清空历史（毫秒）
    pub reset_window_ms: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: 5,
            reset_window_ms: 2000.0,
        }
    }
}

/// 两态计数阈值：低于 `down_below` 进入下蹲态，高于 `up_above` 回到站立态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepThresholds {
    pub down_below: f64,
    pub up_above: f64,
}

impl RepThresholds {
    pub const fn new(down_below: f64, up_above: f64) -> Self {
        Self {
            down_below,
            up_above,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounterConfig {
    /// 两次计数之间的最短间隔（毫秒）
    pub min_rep_interval_ms: f64,
    pub squats: RepThresholds,
    pub lunges: RepThresholds,
    pub pushups: RepThresholds,
    /// 平板支撑计时要求的身体直线角度
    pub plank_hold_min: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            min_rep_interval_ms: 800.0,
            squats: RepThresholds::new(95.0, 155.0),
            lunges: RepThresholds::new(90.0, 150.0),
            pushups: RepThresholds::new(100.0, 150.0),
            plank_hold_min: 170.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackConfig {
    pub squat_partial_depth: f64,
    pub squat_back_angle_min: f64,
    /// 左右膝/肘角度差容忍度
    pub symmetry_tolerance: f64,
    pub lunge_target_angle: f64,
    pub lunge_target_tolerance: f64,
    pub lunge_advice_tolerance: f64,
    pub lunge_back_leg_min: f64,
    pub pelvis_level_max: f64,
    pub plank_hip_angle_min: f64,
    pub plank_long_hold_secs: u32,
    pub pushup_partial_depth: f64,
    pub pushup_body_line_min: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            squat_partial_depth: 120.0,
            squat_back_angle_min: 140.0,
            symmetry_tolerance: 20.0,
            lunge_target_angle: 90.0,
            lunge_target_tolerance: 5.0,
            lunge_advice_tolerance: 10.0,
            lunge_back_leg_min: 120.0,
            pelvis_level_max: 0.10,
            plank_hip_angle_min: 170.0,
            plank_long_hold_secs: 30,
            pushup_partial_depth: 130.0,
            pushup_body_line_min: 170.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachConfig {
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub stabilizer: StabilizerConfig,
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

fn check_angle(name: &str, value: f64) -> Result<(), String> {
    if !(0.0..=180.0).contains(&value) {
        return Err(format!("{name} must be in [0,180] (got {value})"));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{name} must be in [0,1] (got {value})"));
    }
    Ok(())
}

fn check_rep_thresholds(name: &str, t: &RepThresholds) -> Result<(), String> {
    check_angle(&format!("{name}.downBelow"), t.down_below)?;
    check_angle(&format!("{name}.upAbove"), t.up_above)?;
    if t.down_below >= t.up_above {
        return Err(format!("{name}.downBelow must be < {name}.upAbove"));
    }
    Ok(())
}

impl CoachConfig {
    pub fn validate(&self) -> Result<(), String> {
        // GeometryConfig
        if !(self.geometry.horizontal_tolerance > 0.0 && self.geometry.horizontal_tolerance < 1.0) {
            return Err("geometry.horizontalTolerance must be in (0,1)".to_string());
        }
        check_unit(
            "geometry.jointMinVisibility",
            self.geometry.joint_min_visibility,
        )?;

        // ClassifierConfig
        let c = &self.classifier;
        check_unit("classifier.minKeyVisibility", c.min_key_visibility)?;
        check_angle("classifier.pushupElbowMax", c.pushup_elbow_max)?;
        check_angle("classifier.pushupBodyLineMin", c.pushup_body_line_min)?;
        check_angle("classifier.lungeAsymmetryMin", c.lunge_asymmetry_min)?;
        check_angle("classifier.lungeFrontKneeMax", c.lunge_front_knee_max)?;
        check_angle("classifier.lungeBackKneeMin", c.lunge_back_knee_min)?;
        check_angle("classifier.squatKneeMax", c.squat_knee_max)?;
        check_angle("classifier.squatAsymmetryMax", c.squat_asymmetry_max)?;
        check_angle("classifier.plankKneeMin", c.plank_knee_min)?;
        check_angle("classifier.plankBodyLineMin", c.plank_body_line_min)?;
        check_unit("classifier.lungeStanceOffsetMin", c.lunge_stance_offset_min)?;
        if c.lunge_front_knee_max >= c.lunge_back_knee_min {
            return Err(
                "classifier.lungeFrontKneeMax must be < classifier.lungeBackKneeMin".to_string(),
            );
        }

        // StabilizerConfig
        if !(1..=30).contains(&self.stabilizer.window) {
            return Err("stabilizer.window must be in [1,30]".to_string());
        }
        if self.stabilizer.reset_window_ms <= 0.0 {
            return Err("stabilizer.resetWindowMs must be > 0".to_string());
        }

        // CounterConfig
        if self.counter.min_rep_interval_ms < 0.0 {
            return Err("counter.minRepIntervalMs must be >= 0".to_string());
        }
        check_rep_thresholds("counter.squats", &self.counter.squats)?;
        check_rep_thresholds("counter.lunges", &self.counter.lunges)?;
        check_rep_thresholds("counter.pushups", &self.counter.pushups)?;
        check_angle("counter.plankHoldMin", self.counter.plank_hold_min)?;

        // FeedbackConfig
        let f = &self.feedback;
        check_angle("feedback.squatPartialDepth", f.squat_partial_depth)?;
        check_angle("feedback.squatBackAngleMin", f.squat_back_angle_min)?;
        check_angle("feedback.lungeTargetAngle", f.lunge_target_angle)?;
        check_angle("feedback.lungeBackLegMin", f.lunge_back_leg_min)?;
        check_angle("feedback.plankHipAngleMin", f.plank_hip_angle_min)?;
        check_angle("feedback.pushupPartialDepth", f.pushup_partial_depth)?;
        check_angle("feedback.pushupBodyLineMin", f.pushup_body_line_min)?;
        if f.symmetry_tolerance < 0.0
            || f.lunge_target_tolerance < 0.0
            || f.lunge_advice_tolerance < f.lunge_target_tolerance
        {
            return Err(
                "feedback tolerances must be >= 0 and lungeAdviceTolerance >= lungeTargetTolerance"
                    .to_string(),
            );
        }
        check_unit("feedback.pelvisLevelMax", f.pelvis_level_max)?;
        if f.squat_partial_depth <= self.counter.squats.down_below {
            return Err("feedback.squatPartialDepth must be > counter.squats.downBelow".to_string());
        }
        if f.pushup_partial_depth <= self.counter.pushups.down_below {
            return Err(
                "feedback.pushupPartialDepth must be > counter.pushups.downBelow".to_string(),
            );
        }

        Ok(())
    }
}
