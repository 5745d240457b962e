//! 健身动作识别与计数 WASM 库
//!
//! 输入为 MediaPipe BlazePose 的人体关键点，逐帧输出动作标签、
//! 计次/计时结果和动作反馈。既可编译为 WebAssembly 在浏览器端运行，
//! 也可作为普通 Rust 库被原生程序调用。
//!
//! ## 模块
//! - `pose`: 关键点与关节定义
//! - `geometry`: 关节角度与身体朝向
//! - `classifier`: 按优先级规则识别动作
//! - `stabilizer`: 多数投票平滑标签
//! - `counter`: 计次 / 平板支撑计时状态机
//! - `feedback`: 动作提示与建议
//! - `session`: 串联以上模块的会话
//! - `config`: 阈值配置表

pub mod classifier;
pub mod config;
pub mod counter;
pub mod feedback;
pub mod geometry;
pub mod pose;
pub mod session;
pub mod stabilizer;

#[cfg(test)]
mod test_support;

// 重新导出核心类型，方便外部使用
pub use classifier::{classify, ExerciseLabel};
pub use config::CoachConfig;
pub use counter::{CounterOutcome, RepState, Stage};
pub use feedback::{Feedback, Severity};
pub use geometry::{angle_at, is_body_horizontal, FrameGeometry};
pub use pose::{Joint, Landmark, Pose, PoseError};
pub use session::{CoachSession, ExerciseSelection, FrameResult, SelectionError, SessionMode};
pub use stabilizer::{LabelPhase, LabelStabilizer, StableLabel};
