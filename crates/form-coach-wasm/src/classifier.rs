//! 动作分类模块
//!
//! 单帧、无状态、按优先级依次匹配：
//! 可见度门限 → 俯卧撑 → 弓步 → 深蹲 → 平板支撑 → none。
//!
//! 弓步与深蹲都满足"屈膝"，必须先用双膝不对称度识别弓步，
//! 再匹配对称屈膝的深蹲；平板支撑要求双膝伸直且身体水平，
//! 直立站姿最终落到 none。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, CoachConfig};
use crate::geometry::FrameGeometry;
use crate::pose::Pose;

/// 动作标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseLabel {
    #[default]
    None,
    Squats,
    Lunges,
    Plank,
    Pushups,
}

impl ExerciseLabel {
    pub const EXERCISES: [ExerciseLabel; 4] = [
        ExerciseLabel::Squats,
        ExerciseLabel::Lunges,
        ExerciseLabel::Plank,
        ExerciseLabel::Pushups,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseLabel::None => "none",
            ExerciseLabel::Squats => "squats",
            ExerciseLabel::Lunges => "lunges",
            ExerciseLabel::Plank => "plank",
            ExerciseLabel::Pushups => "pushups",
        }
    }

    /// 界面展示名称
    pub fn display_name(self) -> &'static str {
        match self {
            ExerciseLabel::None => "Stance",
            ExerciseLabel::Squats => "Squats",
            ExerciseLabel::Lunges => "Lunges",
            ExerciseLabel::Plank => "Plank",
            ExerciseLabel::Pushups => "Push-ups",
        }
    }

    pub fn is_exercise(self) -> bool {
        self != ExerciseLabel::None
    }

    /// 需要计次（而非计时）的动作
    pub fn is_counted(self) -> bool {
        matches!(
            self,
            ExerciseLabel::Squats | ExerciseLabel::Lunges | ExerciseLabel::Pushups
        )
    }
}

impl fmt::Display for ExerciseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown exercise label: {0}")]
pub struct UnknownLabel(pub String);

impl FromStr for ExerciseLabel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ExerciseLabel::None),
            "squats" | "squat" => Ok(ExerciseLabel::Squats),
            "lunges" | "lunge" => Ok(ExerciseLabel::Lunges),
            "plank" => Ok(ExerciseLabel::Plank),
            "pushups" | "pushup" | "push-ups" => Ok(ExerciseLabel::Pushups),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// 对单帧姿态分类
pub fn classify(pose: &Pose, config: &CoachConfig) -> ExerciseLabel {
    let geometry = FrameGeometry::measure(pose, &config.geometry);
    classify_geometry(&geometry, &config.classifier)
}

/// 基于已测得的几何特征分类
pub fn classify_geometry(g: &FrameGeometry, cfg: &ClassifierConfig) -> ExerciseLabel {
    // 写成取反形式，NaN 可见度同样被拒绝
    if !(g.key_visibility >= cfg.min_key_visibility) {
        return ExerciseLabel::None;
    }

    if cfg.pushups_enabled && is_pushup(g, cfg) {
        ExerciseLabel::Pushups
    } else if is_lunge(g, cfg) {
        ExerciseLabel::Lunges
    } else if is_squat(g, cfg) {
        ExerciseLabel::Squats
    } else if is_plank(g, cfg) {
        ExerciseLabel::Plank
    } else {
        ExerciseLabel::None
    }
}

fn is_pushup(g: &FrameGeometry, cfg: &ClassifierConfig) -> bool {
    g.avg_elbow() < cfg.pushup_elbow_max
        && g.is_horizontal()
        && g.body_line >= cfg.pushup_body_line_min
}

fn is_lunge(g: &FrameGeometry, cfg: &ClassifierConfig) -> bool {
    let staggered = g.hip_level_offset > cfg.lunge_stance_offset_min
        || g.ankle_level_offset > cfg.lunge_stance_offset_min;
    g.knee_asymmetry() > cfg.lunge_asymmetry_min
        && g.front_knee() < cfg.lunge_front_knee_max
        && g.back_knee() > cfg.lunge_back_knee_min
        && g.is_vertical()
        && staggered
}

fn is_squat(g: &FrameGeometry, cfg: &ClassifierConfig) -> bool {
    g.left_knee < cfg.squat_knee_max
        && g.right_knee < cfg.squat_knee_max
        && g.knee_asymmetry() <= cfg.squat_asymmetry_max
        && g.is_vertical()
        && g.hips_below_shoulders()
}

fn is_plank(g: &FrameGeometry, cfg: &ClassifierConfig) -> bool {
    g.left_knee > cfg.plank_knee_min
        && g.right_knee > cfg.plank_knee_min
        && g.is_horizontal()
        && g.body_line > cfg.plank_body_line_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Joint, Landmark};
    use crate::test_support::{plank_pose, pushup_pose, standing_pose, with_visibility, KneeBend};

    fn cfg() -> CoachConfig {
        CoachConfig::default()
    }

    #[test]
    fn asymmetric_bend_is_a_lunge() {
        let pose = standing_pose(KneeBend::new(80.0, 170.0));
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::Lunges);
    }

    #[test]
    fn symmetric_bend_is_a_squat() {
        let pose = standing_pose(KneeBend::new(85.0, 90.0));
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::Squats);
    }

    #[test]
    fn upright_stance_is_none() {
        let pose = standing_pose(KneeBend::both(175.0));
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::None);
    }

    #[test]
    fn straight_horizontal_body_is_a_plank() {
        assert_eq!(classify(&plank_pose(178.0), &cfg()), ExerciseLabel::Plank);
    }

    #[test]
    fn vertical_straight_body_is_not_a_plank() {
        // 同样伸直，但髋部明显低于肩部
        let pose = standing_pose(KneeBend::both(180.0));
        assert_ne!(classify(&pose, &cfg()), ExerciseLabel::Plank);
    }

    #[test]
    fn sagging_plank_is_not_classified() {
        assert_eq!(classify(&plank_pose(150.0), &cfg()), ExerciseLabel::None);
    }

    #[test]
    fn low_confidence_is_rejected_regardless_of_angles() {
        let pose = with_visibility(&standing_pose(KneeBend::new(85.0, 90.0)), 0.2);
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::None);
        let pose = with_visibility(&plank_pose(180.0), 0.29);
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::None);
    }

    #[test]
    fn pushups_only_when_enabled() {
        let pose = pushup_pose(178.0, 90.0);
        let mut config = cfg();
        // 关闭时弯肘的水平身体按平板支撑处理
        assert_eq!(classify(&pose, &config), ExerciseLabel::Plank);

        config.classifier.pushups_enabled = true;
        assert_eq!(classify(&pose, &config), ExerciseLabel::Pushups);
        // 手臂伸直时仍是平板支撑
        assert_eq!(classify(&plank_pose(178.0), &config), ExerciseLabel::Plank);
    }

    #[test]
    fn missing_knee_fails_closed() {
        let mut pose = standing_pose(KneeBend::new(85.0, 90.0));
        pose.set(
            Joint::LeftAnkle,
            Landmark {
                visibility: 0.9,
                ..Landmark::MISSING
            },
        );
        assert_eq!(classify(&pose, &cfg()), ExerciseLabel::None);
    }

    #[test]
    fn lunge_needs_a_staggered_stance() {
        let pose = standing_pose(KneeBend::new(80.0, 170.0));
        let mut config = cfg();
        config.classifier.lunge_stance_offset_min = 0.5;
        // 不满足错步条件，且不对称度超出深蹲上限
        assert_eq!(classify(&pose, &config), ExerciseLabel::None);
    }

    #[test]
    fn classification_is_pure() {
        let pose = standing_pose(KneeBend::new(100.0, 110.0));
        let config = cfg();
        assert_eq!(classify(&pose, &config), classify(&pose, &config));
    }

    #[test]
    fn labels_parse_and_print() {
        for label in ExerciseLabel::EXERCISES {
            assert_eq!(label.as_str().parse::<ExerciseLabel>().unwrap(), label);
        }
        assert_eq!("Squat".parse::<ExerciseLabel>().unwrap(), ExerciseLabel::Squats);
        assert!("burpees".parse::<ExerciseLabel>().is_err());
        assert_eq!(ExerciseLabel::Pushups.to_string(), "pushups");
    }

    #[test]
    fn counted_exercises_exclude_plank() {
        let counted: Vec<_> = ExerciseLabel::EXERCISES
            .into_iter()
            .filter(|l| l.is_counted())
            .collect();
        assert_eq!(
            counted,
            vec![ExerciseLabel::Squats, ExerciseLabel::Lunges, ExerciseLabel::Pushups]
        );
        assert!(!ExerciseLabel::None.is_counted());
    }
}
