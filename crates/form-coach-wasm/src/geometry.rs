//! 几何计算模块
//!
//! - `angle_at`: 三点夹角（0°-180°）
//! - `is_body_horizontal`: 肩髋高度差判断身体是否水平
//! - `FrameGeometry`: 每帧只计算一次的几何特征，供分类、计数和反馈共用
//!
//! 任何缺失或可见度不足的关键点都会让对应角度变成 NaN，
//! 下游所有比较在 NaN 上都返回 false。

use crate::config::GeometryConfig;
use crate::pose::{Joint, Landmark, Pose, Side};

/// 顶点 B 处由射线 B→A 与 B→C 构成的夹角（度）
///
/// 结果始终落在 [0, 180]，且 `angle_at(a, b, c) == angle_at(c, b, a)`。
/// 坐标为 NaN 时返回 NaN，由调用方视为"无法确定"。
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// 双肩平均高度与双髋平均高度之差小于 `tolerance` 时视为水平
pub fn is_body_horizontal(pose: &Pose, tolerance: f64) -> bool {
    torso_drop(pose) < tolerance
}

fn torso_drop(pose: &Pose) -> f64 {
    (shoulder_y(pose) - hip_y(pose)).abs()
}

fn shoulder_y(pose: &Pose) -> f64 {
    (pose[Joint::LeftShoulder].y + pose[Joint::RightShoulder].y) / 2.0
}

fn hip_y(pose: &Pose) -> f64 {
    (pose[Joint::LeftHip].y + pose[Joint::RightHip].y) / 2.0
}

/// 任一参数为 NaN 时返回 NaN（`f64::min` 会吞掉 NaN）
fn strict_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn strict_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// 单帧几何特征
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub left_knee: f64,
    pub right_knee: f64,
    pub left_elbow: f64,
    pub right_elbow: f64,
    /// 主侧 肩-髋-踝 角度，身体直线度
    pub body_line: f64,
    /// 主侧 肩-髋-膝 角度，反映躯干前倾或塌腰
    pub hip_angle: f64,
    pub shoulder_y: f64,
    pub hip_y: f64,
    pub hip_level_offset: f64,
    pub ankle_level_offset: f64,
    /// 双肩、双髋、双膝平均可见度
    pub key_visibility: f64,
    /// 可见度更高的一侧（侧身面对镜头时远侧关键点噪声较大）
    pub dominant_side: Side,
    horizontal_tolerance: f64,
}

impl FrameGeometry {
    pub fn measure(pose: &Pose, config: &GeometryConfig) -> Self {
        let min_vis = config.joint_min_visibility;
        let joint_angle = |a: Joint, b: Joint, c: Joint| -> f64 {
            let (la, lb, lc) = (&pose[a], &pose[b], &pose[c]);
            if la.is_usable(min_vis) && lb.is_usable(min_vis) && lc.is_usable(min_vis) {
                angle_at(la, lb, lc)
            } else {
                f64::NAN
            }
        };

        let side_visibility = |side: Side| -> f64 {
            [side.shoulder(), side.hip(), side.knee(), side.ankle()]
                .iter()
                .map(|&j| pose[j].visibility)
                .sum()
        };
        let dominant_side = if side_visibility(Side::Right) > side_visibility(Side::Left) {
            Side::Right
        } else {
            Side::Left
        };

        let knee = |side: Side| joint_angle(side.hip(), side.knee(), side.ankle());
        let elbow = |side: Side| joint_angle(side.shoulder(), side.elbow(), side.wrist());

        Self {
            left_knee: knee(Side::Left),
            right_knee: knee(Side::Right),
            left_elbow: elbow(Side::Left),
            right_elbow: elbow(Side::Right),
            body_line: joint_angle(
                dominant_side.shoulder(),
                dominant_side.hip(),
                dominant_side.ankle(),
            ),
            hip_angle: joint_angle(
                dominant_side.shoulder(),
                dominant_side.hip(),
                dominant_side.knee(),
            ),
            shoulder_y: shoulder_y(pose),
            hip_y: hip_y(pose),
            hip_level_offset: (pose[Joint::LeftHip].y - pose[Joint::RightHip].y).abs(),
            ankle_level_offset: (pose[Joint::LeftAnkle].y - pose[Joint::RightAnkle].y).abs(),
            key_visibility: pose.mean_visibility(&Joint::KEY_POINTS),
            dominant_side,
            horizontal_tolerance: config.horizontal_tolerance,
        }
    }

    /// 未检测到人体时的占位值，所有特征均为 NaN
    pub fn undetermined() -> Self {
        Self {
            left_knee: f64::NAN,
            right_knee: f64::NAN,
            left_elbow: f64::NAN,
            right_elbow: f64::NAN,
            body_line: f64::NAN,
            hip_angle: f64::NAN,
            shoulder_y: f64::NAN,
            hip_y: f64::NAN,
            hip_level_offset: f64::NAN,
            ankle_level_offset: f64::NAN,
            key_visibility: 0.0,
            dominant_side: Side::Left,
            horizontal_tolerance: GeometryConfig::default().horizontal_tolerance,
        }
    }

    pub fn avg_knee(&self) -> f64 {
        (self.left_knee + self.right_knee) / 2.0
    }

    pub fn knee_asymmetry(&self) -> f64 {
        (self.left_knee - self.right_knee).abs()
    }

    /// 弓步前腿：弯曲更大的一侧
    pub fn front_knee(&self) -> f64 {
        strict_min(self.left_knee, self.right_knee)
    }

    pub fn back_knee(&self) -> f64 {
        strict_max(self.left_knee, self.right_knee)
    }

    pub fn avg_elbow(&self) -> f64 {
        (self.left_elbow + self.right_elbow) / 2.0
    }

    pub fn elbow_asymmetry(&self) -> f64 {
        (self.left_elbow - self.right_elbow).abs()
    }

    pub fn torso_drop(&self) -> f64 {
        (self.shoulder_y - self.hip_y).abs()
    }

    pub fn is_horizontal(&self) -> bool {
        self.torso_drop() < self.horizontal_tolerance
    }

    /// 与 `is_horizontal` 互斥，NaN 时两者都为 false
    pub fn is_vertical(&self) -> bool {
        self.torso_drop() >= self.horizontal_tolerance
    }

    pub fn hips_below_shoulders(&self) -> bool {
        self.hip_y > self.shoulder_y
    }
}
