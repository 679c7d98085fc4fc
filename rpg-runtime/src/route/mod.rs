//! # Route 模块
//!
//! 移动宏编译（[`compiler`]）与路线指令定义（[`instruction`]）。

pub mod compiler;
pub mod instruction;

pub use compiler::{MacroCompiler, speed_to_frames};
pub use instruction::{MotionInstruction, MoveRoute};
