//! # Compiler 模块
//!
//! 移动宏（紧凑记法的移动脚本）编译器。
//!
//! ## 记法
//!
//! 宏由「操作码片段 + 数值参数」的连写构成，例如 `↑4→2z30j1,-1`：
//! 上 4 步、右 2 步、等待 30 帧、向 (1,-1) 跳跃。
//!
//! ## 架构
//!
//! ```text
//! 宏字符串 → [词法扫描] → Vec<MacroToken> → [逐操作码展开] → MoveRoute
//! ```
//!
//! ## 设计原则
//!
//! - 手写字符扫描，不引入 regex 依赖
//! - 编译是纯函数：同一输入（宏、初始速度、配置）必然产出同一路线
//! - 未知操作码沿用源脚本的兼容行为静默跳过，
//!   可用 [`CompileConfig::strict_opcodes`] 升级为报错

use crate::config::CompileConfig;
use crate::direction::Direction;
use crate::error::MacroError;
use crate::route::instruction::{MotionInstruction, MoveRoute};

/// 移动速度 → 转向等待帧数
///
/// `128 >> speed`，速度 1〜6 对应 64, 32, 16, 8, 4, 2 帧。
pub fn speed_to_frames(speed: u8) -> u32 {
    128 >> speed.clamp(1, 6) as u32
}

/// 词法单元：一对（操作码片段、参数文字列）
///
/// 编译过程中的临时产物，一次编译内生成即消化。
#[derive(Debug, Clone, PartialEq)]
struct MacroToken {
    /// 操作码片段（非参数字符的最长连续）
    fragment: String,
    /// 参数文字列（`[0-9.,-]` 的最长连续）
    argument: String,
    /// 片段起点（字符位置，1 起）
    position: usize,
}

/// 参数字符判定
fn is_argument_char(c: char) -> bool {
    c.is_ascii_digit() || c == ',' || c == '-' || c == '.'
}

/// 词法扫描
///
/// 每个片段必须紧跟参数连续（容许夹杂空白）。
/// 片段后没有参数时报 [`MacroError::MissingArgument`]。
fn tokenize(source: &str) -> Result<Vec<MacroToken>, MacroError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().enumerate().peekable();

    loop {
        // 跳过空白与片段前的孤立参数字符（源脚本对这类残片不做配对）
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() || is_argument_char(c) {
                chars.next();
            } else {
                break;
            }
        }
        let Some(&(start, _)) = chars.peek() else {
            break;
        };

        // 片段：非参数・非空白字符的最长连续
        let mut fragment = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if is_argument_char(c) || c.is_whitespace() {
                break;
            }
            fragment.push(c);
            chars.next();
        }

        // 参数：参数字符的最长连续
        while let Some(&(_, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
            } else {
                break;
            }
        }
        let mut argument = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if is_argument_char(c) {
                argument.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if argument.is_empty() {
            return Err(MacroError::MissingArgument {
                position: start + 1,
                fragment,
            });
        }
        tokens.push(MacroToken {
            fragment,
            argument,
            position: start + 1,
        });
    }
    Ok(tokens)
}

/// 操作码种类（片段查表的结果）
#[derive(Debug, Clone, Copy, PartialEq)]
enum Opcode {
    /// 方位移动（0 = 转向）
    Dir(Direction),
    /// 随机（0 = 随机转向、n = 随机移动）
    Random,
    /// 前进
    Forward,
    /// 后退
    Backward,
    /// 接近玩家
    Toward,
    /// 远离玩家
    Away,
    /// 跳跃
    Jump,
    /// 等待
    Wait,
    /// 右转 90°
    TurnRight,
    /// 左转 90°
    TurnLeft,
    /// 移动速度
    Speed,
    /// 移动频度
    Frequency,
    /// 步行动画
    WalkAnime,
    /// 踏步动画
    StepAnime,
    /// 朝向固定
    DirFix,
    /// 穿透
    Through,
    /// 透明
    Transparent,
    /// 可见（透明的逻辑反转）
    Visible,
    /// 图案变更
    Change,
    /// 开关操作
    Switch,
}

/// 片段 → 操作码（对整个片段做不区分大小写的全字匹配）
fn lookup_opcode(fragment: &str) -> Option<Opcode> {
    let lower = fragment.to_lowercase();
    let op = match lower.as_str() {
        "↑" | "u" | "up" => Opcode::Dir(Direction::Up),
        "↓" | "d" | "down" => Opcode::Dir(Direction::Down),
        "←" | "l" | "left" => Opcode::Dir(Direction::Left),
        "→" | "r" | "right" => Opcode::Dir(Direction::Right),
        "↖" | "↖︎" | "ul" | "upleft" => Opcode::Dir(Direction::UpLeft),
        "↗" | "↗︎" | "ur" | "upright" => Opcode::Dir(Direction::UpRight),
        "↙" | "↙︎" | "dl" | "downleft" => Opcode::Dir(Direction::DownLeft),
        "↘" | "↘︎" | "dr" | "downright" => Opcode::Dir(Direction::DownRight),
        "&" | "random" => Opcode::Random,
        "f" | "forward" => Opcode::Forward,
        "b" | "backward" => Opcode::Backward,
        "t" | "toward" => Opcode::Toward,
        "a" | "away" => Opcode::Away,
        "j" | "jump" => Opcode::Jump,
        "z" | "wait" => Opcode::Wait,
        ">" | "turnright" => Opcode::TurnRight,
        "<" | "turnleft" => Opcode::TurnLeft,
        "s" | "speed" => Opcode::Speed,
        "q" | "freq" => Opcode::Frequency,
        "w" | "walk" => Opcode::WalkAnime,
        "e" | "step" => Opcode::StepAnime,
        "x" | "fix" => Opcode::DirFix,
        "p" | "through" => Opcode::Through,
        "i" | "transparent" => Opcode::Transparent,
        "v" | "visible" => Opcode::Visible,
        "c" | "change" => Opcode::Change,
        "sw" | "switch" => Opcode::Switch,
        _ => return None,
    };
    Some(op)
}

/// 移动宏编译器
///
/// 编译期间追踪移动速度：`s` 操作码改写的速度会影响其后
/// `>`/`<` 展开里的等待帧数。
pub struct MacroCompiler {
    config: CompileConfig,
}

impl MacroCompiler {
    /// 以规定配置（兼容模式）创建编译器
    pub fn new() -> Self {
        Self {
            config: CompileConfig::default(),
        }
    }

    /// 以指定配置创建编译器
    pub fn with_config(config: CompileConfig) -> Self {
        Self { config }
    }

    /// 编译移动宏
    ///
    /// # 参数
    ///
    /// - `source`: 宏字符串
    /// - `move_speed`: 对象キャラ当前的移动速度（1〜6），
    ///   作为转向等待帧数计算的初始值
    ///
    /// # 返回
    ///
    /// 以 [`MotionInstruction::End`] 结尾的 [`MoveRoute`]。
    pub fn compile(&self, source: &str, move_speed: u8) -> Result<MoveRoute, MacroError> {
        let tokens = tokenize(source)?;
        let mut list = Vec::new();
        // 编译期内部状态：当前移动速度
        let mut speed = move_speed.clamp(1, 6);

        for token in &tokens {
            let Some(opcode) = lookup_opcode(&token.fragment) else {
                if self.config.strict_opcodes {
                    return Err(MacroError::UnknownOpcode {
                        position: token.position,
                        fragment: token.fragment.clone(),
                    });
                }
                // 兼容模式：未知操作码静默跳过
                continue;
            };
            self.expand(opcode, token, &mut speed, &mut list)?;
        }

        list.push(MotionInstruction::End);
        Ok(MoveRoute::new(list))
    }

    /// 展开单个操作码
    fn expand(
        &self,
        opcode: Opcode,
        token: &MacroToken,
        speed: &mut u8,
        list: &mut Vec<MotionInstruction>,
    ) -> Result<(), MacroError> {
        let components = split_components(token)?;
        let main = components.first().copied().flatten().unwrap_or(0);

        match opcode {
            Opcode::Dir(direction) => {
                // 0 = 转向、n = n 步移动
                if main == 0 {
                    list.push(MotionInstruction::Turn { direction });
                } else {
                    for _ in 0..main.max(0) {
                        list.push(MotionInstruction::Move { direction });
                    }
                }
            }
            Opcode::Random => {
                if main == 0 {
                    list.push(MotionInstruction::TurnRandom);
                } else {
                    for _ in 0..main.max(0) {
                        list.push(MotionInstruction::MoveRandom);
                    }
                }
            }
            Opcode::Forward => {
                for _ in 0..main.max(0) {
                    list.push(MotionInstruction::MoveForward);
                }
            }
            Opcode::Backward => {
                for _ in 0..main.max(0) {
                    list.push(MotionInstruction::MoveBackward);
                }
            }
            Opcode::Toward => {
                for _ in 0..main.max(0) {
                    list.push(MotionInstruction::MoveToward);
                }
            }
            Opcode::Away => {
                for _ in 0..main.max(0) {
                    list.push(MotionInstruction::MoveAway);
                }
            }
            Opcode::Jump => {
                let dx = components.first().copied().flatten().unwrap_or(0);
                let dy = components.get(1).copied().flatten().unwrap_or(0);
                list.push(MotionInstruction::Jump { dx, dy });
            }
            Opcode::Wait => {
                list.push(MotionInstruction::Wait {
                    frames: main.max(0) as u32,
                });
            }
            Opcode::TurnRight | Opcode::TurnLeft => {
                let turn = if matches!(opcode, Opcode::TurnRight) {
                    MotionInstruction::Turn90Right
                } else {
                    MotionInstruction::Turn90Left
                };
                match main {
                    // 0 = 随机转向
                    ..=0 => list.push(MotionInstruction::TurnRandom),
                    // 1 = 立即转向一次
                    1 => list.push(turn),
                    // n ≥ 2 = n 组（转向、等待）、等待帧数由当前速度导出
                    n => {
                        for _ in 0..n {
                            list.push(turn.clone());
                            list.push(MotionInstruction::Wait {
                                frames: speed_to_frames(*speed),
                            });
                        }
                    }
                }
            }
            Opcode::Speed => {
                let value = main.clamp(1, 6) as u8;
                // 速度变更同时更新编译期状态，影响后续转向等待
                *speed = value;
                list.push(MotionInstruction::ChangeSpeed { speed: value });
            }
            Opcode::Frequency => {
                list.push(MotionInstruction::ChangeFrequency {
                    frequency: main.clamp(1, 5) as u8,
                });
            }
            Opcode::WalkAnime => list.push(MotionInstruction::WalkAnime { on: main != 0 }),
            Opcode::StepAnime => list.push(MotionInstruction::StepAnime { on: main != 0 }),
            Opcode::DirFix => list.push(MotionInstruction::DirectionFix { on: main != 0 }),
            Opcode::Through => list.push(MotionInstruction::Through { on: main != 0 }),
            Opcode::Transparent => list.push(MotionInstruction::Transparent { on: main != 0 }),
            // 可见是透明的逻辑反转
            Opcode::Visible => list.push(MotionInstruction::Transparent { on: main == 0 }),
            Opcode::Change => {
                let as_u8 = |v: Option<i64>| v.and_then(|n| u8::try_from(n).ok());
                let index = as_u8(components.first().copied().flatten());
                let pattern = as_u8(components.get(1).copied().flatten());
                let direction = as_u8(components.get(2).copied().flatten())
                    .and_then(Direction::from_numpad);
                list.push(MotionInstruction::ChangePattern {
                    index,
                    pattern,
                    direction,
                });
            }
            Opcode::Switch => {
                // (开关 ID, 状态)：状态缺省为 ON
                let id = main.max(0) as u32;
                let on = components.get(1).copied().flatten().unwrap_or(1) != 0;
                list.push(MotionInstruction::Switch { id, on });
            }
        }
        Ok(())
    }
}

impl Default for MacroCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// 逗号分割参数文字列
///
/// 空成分视为"缺省"（None）；非数值成分报 [`MacroError::BadArgument`]。
/// 带小数点的成分按整数截断（沿用源脚本 parseInt 的宽容度）。
fn split_components(token: &MacroToken) -> Result<Vec<Option<i64>>, MacroError> {
    token
        .argument
        .split(',')
        .map(|part| {
            if part.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = part.parse::<i64>() {
                return Ok(Some(n));
            }
            match part.parse::<f64>() {
                Ok(f) => Ok(Some(f.trunc() as i64)),
                Err(_) => Err(MacroError::BadArgument {
                    fragment: token.fragment.clone(),
                    argument: part.to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Vec<MotionInstruction> {
        MacroCompiler::new().compile(source, 4).unwrap().list
    }

    #[test]
    fn test_directional_moves() {
        // ↑4 → 4 步向上移动 + 终端、无转向指令
        let list = compile("↑4");
        assert_eq!(list.len(), 5);
        for instruction in &list[..4] {
            assert_eq!(
                *instruction,
                MotionInstruction::Move {
                    direction: Direction::Up
                }
            );
        }
        assert_eq!(list[4], MotionInstruction::End);
    }

    #[test]
    fn test_directional_zero_is_turn() {
        assert_eq!(
            compile("l0"),
            vec![
                MotionInstruction::Turn {
                    direction: Direction::Left
                },
                MotionInstruction::End
            ]
        );
        // 斜方位同规则
        assert_eq!(
            compile("↘0"),
            vec![
                MotionInstruction::Turn {
                    direction: Direction::DownRight
                },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_word_forms_case_insensitive() {
        assert_eq!(compile("UP2"), compile("↑2"));
        assert_eq!(compile("DownLeft1"), compile("dl1"));
        assert_eq!(compile("Wait10"), compile("z10"));
    }

    #[test]
    fn test_wait() {
        assert_eq!(
            compile("z10"),
            vec![MotionInstruction::Wait { frames: 10 }, MotionInstruction::End]
        );
    }

    #[test]
    fn test_random() {
        assert_eq!(
            compile("&0"),
            vec![MotionInstruction::TurnRandom, MotionInstruction::End]
        );
        assert_eq!(
            compile("&3"),
            vec![
                MotionInstruction::MoveRandom,
                MotionInstruction::MoveRandom,
                MotionInstruction::MoveRandom,
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_jump_components() {
        assert_eq!(
            compile("j1,-2"),
            vec![MotionInstruction::Jump { dx: 1, dy: -2 }, MotionInstruction::End]
        );
        // 缺省成分为 0
        assert_eq!(
            compile("j0"),
            vec![MotionInstruction::Jump { dx: 0, dy: 0 }, MotionInstruction::End]
        );
        assert_eq!(
            compile("j,3"),
            vec![MotionInstruction::Jump { dx: 0, dy: 3 }, MotionInstruction::End]
        );
    }

    #[test]
    fn test_turn_ninety() {
        // >0 随机转向
        assert_eq!(
            compile(">0"),
            vec![MotionInstruction::TurnRandom, MotionInstruction::End]
        );
        // >1 立即右转一次
        assert_eq!(
            compile(">1"),
            vec![MotionInstruction::Turn90Right, MotionInstruction::End]
        );
        // >3 = 3 组（右转、等待）、速度 4 → 8 帧
        let list = compile(">3");
        assert_eq!(list.len(), 7);
        for pair in list[..6].chunks(2) {
            assert_eq!(pair[0], MotionInstruction::Turn90Right);
            assert_eq!(pair[1], MotionInstruction::Wait { frames: 8 });
        }
        assert_eq!(
            compile("<1"),
            vec![MotionInstruction::Turn90Left, MotionInstruction::End]
        );
    }

    #[test]
    fn test_speed_to_frames_table() {
        assert_eq!(speed_to_frames(1), 64);
        assert_eq!(speed_to_frames(2), 32);
        assert_eq!(speed_to_frames(3), 16);
        assert_eq!(speed_to_frames(4), 8);
        assert_eq!(speed_to_frames(5), 4);
        assert_eq!(speed_to_frames(6), 2);
    }

    #[test]
    fn test_speed_change_affects_later_turns() {
        // s 改写速度后、其后的 > 展开要用新速度的等待帧数
        let list = compile("s6>2");
        assert_eq!(
            list,
            vec![
                MotionInstruction::ChangeSpeed { speed: 6 },
                MotionInstruction::Turn90Right,
                MotionInstruction::Wait { frames: 2 },
                MotionInstruction::Turn90Right,
                MotionInstruction::Wait { frames: 2 },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_boolean_toggles() {
        assert_eq!(
            compile("w0w1"),
            vec![
                MotionInstruction::WalkAnime { on: false },
                MotionInstruction::WalkAnime { on: true },
                MotionInstruction::End
            ]
        );
        assert_eq!(
            compile("x1p1"),
            vec![
                MotionInstruction::DirectionFix { on: true },
                MotionInstruction::Through { on: true },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_visible_inverts_transparent() {
        assert_eq!(
            compile("v1"),
            vec![
                MotionInstruction::Transparent { on: false },
                MotionInstruction::End
            ]
        );
        assert_eq!(
            compile("v0"),
            vec![
                MotionInstruction::Transparent { on: true },
                MotionInstruction::End
            ]
        );
        assert_eq!(
            compile("i1"),
            vec![
                MotionInstruction::Transparent { on: true },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_change_pattern() {
        assert_eq!(
            compile("c2,0,2"),
            vec![
                MotionInstruction::ChangePattern {
                    index: Some(2),
                    pattern: Some(0),
                    direction: Some(Direction::Down),
                },
                MotionInstruction::End
            ]
        );
        // 缺省成分保持当前值
        assert_eq!(
            compile("c,1"),
            vec![
                MotionInstruction::ChangePattern {
                    index: None,
                    pattern: Some(1),
                    direction: None,
                },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_switch_defaults_on() {
        assert_eq!(
            compile("sw5"),
            vec![
                MotionInstruction::Switch { id: 5, on: true },
                MotionInstruction::End
            ]
        );
        assert_eq!(
            compile("sw5,0"),
            vec![
                MotionInstruction::Switch { id: 5, on: false },
                MotionInstruction::End
            ]
        );
        assert_eq!(
            compile("switch7,1"),
            vec![
                MotionInstruction::Switch { id: 7, on: true },
                MotionInstruction::End
            ]
        );
    }

    #[test]
    fn test_unknown_opcode_skipped_by_default() {
        // 兼容模式：未知片段静默跳过、其余照常编译
        assert_eq!(compile("??3↑1"), compile("↑1"));
    }

    #[test]
    fn test_unknown_opcode_strict_mode() {
        let compiler = MacroCompiler::with_config(CompileConfig::strict());
        let err = compiler.compile("??3", 4).unwrap_err();
        assert!(matches!(err, MacroError::UnknownOpcode { position: 1, .. }));
    }

    #[test]
    fn test_trailing_fragment_rejected() {
        let err = MacroCompiler::new().compile("↑4z", 4).unwrap_err();
        assert!(matches!(err, MacroError::MissingArgument { ref fragment, .. } if fragment == "z"));
    }

    #[test]
    fn test_bad_argument_rejected() {
        let err = MacroCompiler::new().compile("z1-2", 4).unwrap_err();
        assert!(matches!(err, MacroError::BadArgument { .. }));
    }

    #[test]
    fn test_empty_macro() {
        assert_eq!(compile(""), vec![MotionInstruction::End]);
    }

    #[test]
    fn test_route_shape_snapshot() {
        let route = MacroCompiler::new().compile("↑2>1j1,1z5", 4).unwrap();
        insta::assert_debug_snapshot!(route.list, @r"
        [
            Move {
                direction: Up,
            },
            Move {
                direction: Up,
            },
            Turn90Right,
            Jump {
                dx: 1,
                dy: 1,
            },
            Wait {
                frames: 5,
            },
            End,
        ]
        ");
    }
}
