//! 人体关键点模块
//!
//! 输入为 MediaPipe BlazePose 的 33 点输出，这里只保留分类与计数用到的
//! 12 个关节，并通过 `Joint` 枚举按名称访问，避免裸数组下标带来的错位。
//!
//! 坐标约定：x、y 归一化到 [0,1]，y 轴向下；visibility 为 [0,1] 的可见度。

use std::ops::Index;

use serde::{Deserialize, Serialize};

/// MediaPipe BlazePose 输出的关键点数量
pub const MEDIAPIPE_LANDMARK_COUNT: usize = 33;

/// 扁平数组中每个关键点占用的浮点数 (x, y, z, visibility)
pub const VALUES_PER_LANDMARK: usize = 4;

/// 单个关键点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    /// 缺省按 0 处理，与可见度门限配合时视为不可靠
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    /// 缺失的关键点：坐标为 NaN，可见度为 0
    pub const MISSING: Landmark = Landmark {
        x: f64::NAN,
        y: f64::NAN,
        z: f64::NAN,
        visibility: 0.0,
    };

    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    pub fn is_missing(&self) -> bool {
        !(self.x.is_finite() && self.y.is_finite())
    }

    /// 坐标有效且可见度不低于 `min_visibility` 时才可参与角度计算
    pub fn is_usable(&self, min_visibility: f64) -> bool {
        !self.is_missing() && self.visibility >= min_visibility
    }
}

/// 身体左右侧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn shoulder(self) -> Joint {
        match self {
            Side::Left => Joint::LeftShoulder,
            Side::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Side::Left => Joint::LeftElbow,
            Side::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Side::Left => Joint::LeftWrist,
            Side::Right => Joint::RightWrist,
        }
    }

    pub fn hip(self) -> Joint {
        match self {
            Side::Left => Joint::LeftHip,
            Side::Right => Joint::RightHip,
        }
    }

    pub fn knee(self) -> Joint {
        match self {
            Side::Left => Joint::LeftKnee,
            Side::Right => Joint::RightKnee,
        }
    }

    pub fn ankle(self) -> Joint {
        match self {
            Side::Left => Joint::LeftAnkle,
            Side::Right => Joint::RightAnkle,
        }
    }
}

/// 流水线使用的解剖学关节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const COUNT: usize = 12;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// 可见度门限统计的关键点：双肩、双髋、双膝
    pub const KEY_POINTS: [Joint; 6] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
    ];

    /// BlazePose 输出中的下标
    pub const fn mediapipe_index(self) -> usize {
        match self {
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// 关键点解析错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("landmark list too short: need at least {needed} points, got {got}")]
    TooFewLandmarks { needed: usize, got: usize },
    #[error("flat landmark array length {0} is not a multiple of 4")]
    RaggedFlatArray(usize),
}

/// 一帧中单个人的全部关节
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<Landmark>>", into = "Vec<Option<Landmark>>")]
pub struct Pose {
    landmarks: [Landmark; Joint::COUNT],
}

impl Pose {
    /// 解析时至少需要覆盖到最大的关节下标
    pub const MIN_MEDIAPIPE_POINTS: usize = Joint::RightAnkle.mediapipe_index() + 1;

    pub fn from_fn(mut f: impl FnMut(Joint) -> Landmark) -> Self {
        let mut landmarks = [Landmark::MISSING; Joint::COUNT];
        for joint in Joint::ALL {
            landmarks[joint.slot()] = f(joint);
        }
        Self { landmarks }
    }

    /// 从 MediaPipe 关键点列表构建
    pub fn from_mediapipe(points: &[Landmark]) -> Result<Self, PoseError> {
        if points.len() < Self::MIN_MEDIAPIPE_POINTS {
            return Err(PoseError::TooFewLandmarks {
                needed: Self::MIN_MEDIAPIPE_POINTS,
                got: points.len(),
            });
        }
        Ok(Self::from_fn(|joint| points[joint.mediapipe_index()]))
    }

    /// 从扁平数组构建
    ///
    /// 输入: N × 4 个浮点数，按 x, y, z, visibility 排列，与浏览器端
    /// `Float64Array` 的打包方式一致。
    pub fn from_flat(values: &[f64]) -> Result<Self, PoseError> {
        if values.len() % VALUES_PER_LANDMARK != 0 {
            return Err(PoseError::RaggedFlatArray(values.len()));
        }
        let count = values.len() / VALUES_PER_LANDMARK;
        if count < Self::MIN_MEDIAPIPE_POINTS {
            return Err(PoseError::TooFewLandmarks {
                needed: Self::MIN_MEDIAPIPE_POINTS,
                got: count,
            });
        }
        Ok(Self::from_fn(|joint| {
            let base = joint.mediapipe_index() * VALUES_PER_LANDMARK;
            Landmark {
                x: values[base],
                y: values[base + 1],
                z: values[base + 2],
                visibility: values[base + 3],
            }
        }))
    }

    pub fn get(&self, joint: Joint) -> &Landmark {
        &self.landmarks[joint.slot()]
    }

    pub fn set(&mut self, joint: Joint, landmark: Landmark) {
        self.landmarks[joint.slot()] = landmark;
    }

    pub fn mean_visibility(&self, joints: &[Joint]) -> f64 {
        if joints.is_empty() {
            return 0.0;
        }
        let sum: f64 = joints.iter().map(|&j| self.get(j).visibility).sum();
        sum / joints.len() as f64
    }
}

impl Index<Joint> for Pose {
    type Output = Landmark;

    fn index(&self, joint: Joint) -> &Landmark {
        self.get(joint)
    }
}

impl TryFrom<Vec<Option<Landmark>>> for Pose {
    type Error = PoseError;

    fn try_from(points: Vec<Option<Landmark>>) -> Result<Self, Self::Error> {
        let points: Vec<Landmark> = points
            .into_iter()
            .map(|p| p.unwrap_or(Landmark::MISSING))
            .collect();
        Self::from_mediapipe(&points)
    }
}

/// 序列化为 BlazePose 下标排列的列表，未使用或缺失的位置为 null
impl From<Pose> for Vec<Option<Landmark>> {
    fn from(pose: Pose) -> Self {
        let mut points = vec![None; Pose::MIN_MEDIAPIPE_POINTS];
        for joint in Joint::ALL {
            let landmark = pose[joint];
            if !landmark.is_missing() {
                points[joint.mediapipe_index()] = Some(landmark);
            }
        }
        points
    }
}
