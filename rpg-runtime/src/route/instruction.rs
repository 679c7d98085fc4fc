//! # Instruction 模块
//!
//! 定义移动宏编译后的原始路线指令。
//!
//! ## 设计原则
//!
//! - **声明式**：指令描述"做什么"，由宿主的路线执行器逐帧消化
//! - **引擎无关**：不含任何渲染或实体类型
//! - 指令序列一经产出即不可变，始终以 [`MotionInstruction::End`] 结尾

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// 原始路线指令
///
/// 与宿主引擎的路线命令一一对应的最小动作单元。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionInstruction {
    /// 向指定方位走一步（含斜方位）
    Move { direction: Direction },

    /// 转向指定方位
    Turn { direction: Direction },

    /// 前进一步（按当前朝向）
    MoveForward,

    /// 后退一步
    MoveBackward,

    /// 随机走一步
    MoveRandom,

    /// 向玩家接近一步
    MoveToward,

    /// 远离玩家一步
    MoveAway,

    /// 随机转向
    TurnRandom,

    /// 右转 90°
    Turn90Right,

    /// 左转 90°
    Turn90Left,

    /// 跳跃（相对位移，タイル数）
    Jump { dx: i64, dy: i64 },

    /// 等待指定帧数
    Wait { frames: u32 },

    /// 变更移动速度（1〜6）
    ChangeSpeed { speed: u8 },

    /// 变更移动频度（1〜5）
    ChangeFrequency { frequency: u8 },

    /// 步行动画开关
    WalkAnime { on: bool },

    /// 踏步动画开关
    StepAnime { on: bool },

    /// 朝向固定开关
    DirectionFix { on: bool },

    /// 穿透开关
    Through { on: bool },

    /// 透明开关
    Transparent { on: bool },

    /// 操作开关
    Switch { id: u32, on: bool },

    /// 变更キャラ图案
    ///
    /// 路线执行时交给图案控制器消化；省略的字段保持当前值。
    ChangePattern {
        /// キャラ番号（0〜7）
        index: Option<u8>,
        /// 歩行パターン（0〜2）
        pattern: Option<u8>,
        /// 朝向
        direction: Option<Direction>,
    },

    /// 路线终端标记
    End,
}

/// 编译完成的移动路线
///
/// 指令列表与执行旗标一起交给宿主的路线执行器。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRoute {
    /// 是否循环执行
    pub repeat: bool,
    /// 受阻时是否跳过该步
    pub skippable: bool,
    /// 是否等待路线执行完毕
    pub wait: bool,
    /// 指令列表（以 [`MotionInstruction::End`] 结尾）
    pub list: Vec<MotionInstruction>,
}

impl MoveRoute {
    /// 创建路线（规定旗标：不循环、不跳过、等待完成）
    pub fn new(list: Vec<MotionInstruction>) -> Self {
        Self {
            repeat: false,
            skippable: false,
            wait: true,
            list,
        }
    }

    /// 设定循环旗标
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// 设定跳过旗标
    pub fn with_skippable(mut self, skippable: bool) -> Self {
        self.skippable = skippable;
        self
    }

    /// 设定等待旗标
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// 指令条数（不含终端标记）
    pub fn step_count(&self) -> usize {
        self.list
            .iter()
            .filter(|i| !matches!(i, MotionInstruction::End))
            .count()
    }
}
