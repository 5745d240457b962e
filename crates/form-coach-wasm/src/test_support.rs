//! 测试用姿态构造：侧身面向 +x，大腿/小腿长度均为 0.2

use crate::pose::{Joint, Landmark, Pose};

const SEGMENT: f64 = 0.2;
const VISIBILITY: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
pub struct KneeBend {
    pub left: f64,
    pub right: f64,
}

impl KneeBend {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn both(angle: f64) -> Self {
        Self::new(angle, angle)
    }
}

/// 从 `from` 出发、与竖直向上方向成 `angle` 度的点
fn bend_from(from: (f64, f64), angle: f64, length: f64) -> (f64, f64) {
    let r = angle.to_radians();
    (from.0 + length * r.sin(), from.1 - length * r.cos())
}

fn point(p: (f64, f64)) -> Landmark {
    Landmark::new(p.0, p.1, VISIBILITY)
}

/// 直立姿态，膝角由 `bend` 给定，双臂自然下垂
pub fn standing_pose(bend: KneeBend) -> Pose {
    let shoulder = (0.5, 0.3);
    let hip = (0.5, 0.5);
    let knee = (0.5, 0.5 + SEGMENT);
    let left_ankle = bend_from(knee, bend.left, SEGMENT);
    let right_ankle = bend_from(knee, bend.right, SEGMENT);
    Pose::from_fn(|joint| match joint {
        Joint::LeftShoulder | Joint::RightShoulder => point(shoulder),
        Joint::LeftElbow | Joint::RightElbow => point((0.5, 0.45)),
        Joint::LeftWrist | Joint::RightWrist => point((0.5, 0.6)),
        Joint::LeftHip | Joint::RightHip => point(hip),
        Joint::LeftKnee | Joint::RightKnee => point(knee),
        Joint::LeftAnkle => point(left_ankle),
        Joint::RightAnkle => point(right_ankle),
    })
}

/// 身体水平的撑地姿态：肩-髋-踝角度为 `body_line`，手臂伸直
pub fn plank_pose(body_line: f64) -> Pose {
    pushup_pose(body_line, 180.0)
}

/// 身体水平、手肘弯曲 `elbow` 度的撑地姿态
pub fn pushup_pose(body_line: f64, elbow: f64) -> Pose {
    let shoulder = (0.3, 0.5);
    let hip = (0.55, 0.5);
    let drop = (180.0 - body_line).to_radians();
    let leg = (drop.cos(), drop.sin());
    let knee = (hip.0 + SEGMENT * leg.0, hip.1 + SEGMENT * leg.1);
    let ankle = (hip.0 + 2.0 * SEGMENT * leg.0, hip.1 + 2.0 * SEGMENT * leg.1);
    let elbow_point = (shoulder.0, shoulder.1 + 0.15);
    let wrist = bend_from(elbow_point, elbow, 0.15);
    Pose::from_fn(|joint| match joint {
        Joint::LeftShoulder | Joint::RightShoulder => point(shoulder),
        Joint::LeftElbow | Joint::RightElbow => point(elbow_point),
        Joint::LeftWrist | Joint::RightWrist => point(wrist),
        Joint::LeftHip | Joint::RightHip => point(hip),
        Joint::LeftKnee | Joint::RightKnee => point(knee),
        Joint::LeftAnkle | Joint::RightAnkle => point(ankle),
    })
}

pub fn with_visibility(pose: &Pose, visibility: f64) -> Pose {
    Pose::from_fn(|joint| Landmark {
        visibility,
        ..pose[joint]
    })
}
