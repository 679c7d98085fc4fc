//! # Character 模块
//!
//! キャラ图案（スプライトシート）与自由坐标的控制。
//!
//! ## 设计原则
//!
//! - 核心通过 [`CharacterControl`] 这一个窄接口操纵宿主的キャラ实体，
//!   不持有实体本身
//! - 省略的参数用显式的 `Option` 字段表达，规定值写在文档里，
//!   不依赖调用侧的参数个数

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::route::instruction::{MotionInstruction, MoveRoute};

/// 宿主キャラ实体的能力集
///
/// 核心对キャラ的全部读写都经由此接口（spec 的协作者契约）。
pub trait CharacterControl {
    /// 当前图像文件名（不含扩展名）
    fn image_file(&self) -> String;
    /// 当前キャラ番号（0〜7）
    fn character_index(&self) -> u8;
    /// 设定图像（文件名与キャラ番号）
    fn set_image(&mut self, file: &str, index: u8);

    /// 设定歩行パターン（0〜2）
    ///
    /// 同时更新静止时回归的基准パターン。
    fn set_walk_pattern(&mut self, pattern: u8);

    /// 当前朝向
    fn direction(&self) -> Direction;
    /// 设定朝向
    fn set_direction(&mut self, direction: Direction);
    /// 朝向固定中か
    fn is_direction_fixed(&self) -> bool;
    /// 设定朝向固定
    fn set_direction_fix(&mut self, fixed: bool);

    /// 设定穿透
    fn set_through(&mut self, through: bool);
    /// 设定动画模式旗标（宿主据此抑制默认的移动中判定）
    fn set_animating(&mut self, animating: bool);

    /// 连续坐标（タイル単位、可含小数）
    fn real_x(&self) -> f64;
    /// 连续坐标
    fn real_y(&self) -> f64;
    /// 设定连续坐标
    fn set_real_position(&mut self, x: f64, y: f64);
    /// 设定逻辑网格坐标
    fn set_grid_position(&mut self, x: f64, y: f64);

    /// 当前移动速度（1〜6）
    fn move_speed(&self) -> u8;
    /// 当前移动频度（1〜5）
    fn move_frequency(&self) -> u8;
}

/// 图案设定参数
///
/// 全字段可省略；省略的含义见 [`apply_pattern`]。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternArgs {
    /// 图像文件名（省略 = 当前文件）
    pub file: Option<String>,
    /// キャラ番号 0〜7（省略 = 当前番号）
    pub index: Option<u8>,
    /// 歩行パターン 0〜2、或组合パターン番号 3〜11
    ///
    /// 省略时图案与朝向都保持不变。
    pub pattern: Option<u8>,
    /// 朝向（优先于组合パターン番号分解出的朝向；
    /// パターン ≤ 2 时省略 = 向下）
    pub direction: Option<Direction>,
}

impl PatternArgs {
    /// 仅指定パターン
    pub fn pattern(pattern: u8) -> Self {
        Self {
            pattern: Some(pattern),
            ..Self::default()
        }
    }

    /// 指定パターン与朝向
    pub fn pattern_facing(pattern: u8, direction: Direction) -> Self {
        Self {
            pattern: Some(pattern),
            direction: Some(direction),
            ..Self::default()
        }
    }
}

/// 设定キャラ图案
///
/// 组合パターン番号（3〜11）分解为
/// `朝向 = (n / 3 + 1) * 2`、`パターン = n % 3`；
/// 显式给出的 `direction` 始终优先。
///
/// 朝向的应用不改变朝向固定状态：先解除、设定后恢复原状。
pub fn apply_pattern(character: &mut dyn CharacterControl, args: &PatternArgs) {
    let file = args
        .file
        .clone()
        .unwrap_or_else(|| character.image_file());
    let index = args.index.unwrap_or_else(|| character.character_index());
    character.set_image(&file, index);

    // パターン省略时、朝向也一并保持
    let Some(pattern) = args.pattern else {
        return;
    };

    let (walk_pattern, decomposed) = if pattern > 2 {
        (
            pattern % 3,
            Direction::from_numpad((pattern / 3 + 1) * 2),
        )
    } else {
        (pattern, None)
    };
    let direction = args
        .direction
        .or(decomposed)
        .unwrap_or(Direction::Down);

    character.set_walk_pattern(walk_pattern);

    // 朝向固定を一时解除して适用、その后复元
    let fixed = character.is_direction_fixed();
    character.set_direction_fix(false);
    character.set_direction(direction);
    character.set_direction_fix(fixed);
}

/// 自由坐标配置
///
/// 直接改写连续坐标（タイル単位、可含小数），绕过网格移动。
/// 给出 `args` 时先适用图案。
pub fn locate(character: &mut dyn CharacterControl, x: f64, y: f64, args: Option<&PatternArgs>) {
    if let Some(args) = args {
        apply_pattern(character, args);
    }
    character.set_real_position(x, y);
}

/// 像素单位的相对位移
///
/// 给出 `args` 时先适用图案，然后把连续坐标偏移
/// `(dx / tile_w, dy / tile_h)` タイル。逐帧驱动的手动动画用。
pub fn nudge(
    character: &mut dyn CharacterControl,
    dx: i64,
    dy: i64,
    tile_w: u32,
    tile_h: u32,
    args: &PatternArgs,
) {
    apply_pattern(character, args);
    let x = character.real_x() + dx as f64 / tile_w as f64;
    let y = character.real_y() + dy as f64 / tile_h as f64;
    character.set_real_position(x, y);
}

/// 下→左→右→上 的转向路线（宝箱、扉の开放演出用）
///
/// 适用前需解除朝向固定，朝向先设为下。
pub fn turn_cycle_route() -> MoveRoute {
    MoveRoute::new(vec![
        MotionInstruction::Turn {
            direction: Direction::Left,
        },
        MotionInstruction::Wait { frames: 3 },
        MotionInstruction::Turn {
            direction: Direction::Right,
        },
        MotionInstruction::Wait { frames: 3 },
        MotionInstruction::Turn {
            direction: Direction::Up,
        },
        MotionInstruction::End,
    ])
    .with_skippable(true)
}

/// 进入动画模式
///
/// 穿透 ON、动画旗标 ON（宿主据此停用自动歩行动画）。
pub fn start_anime(character: &mut dyn CharacterControl) {
    character.set_through(true);
    character.set_animating(true);
}

/// 退出动画模式
///
/// 穿透 OFF、动画旗标 OFF，并把连续坐标折回逻辑网格坐标。
/// `round_unit`：0 = 原值保留、1 = 整タイル、其他 = 吸附到该单位的倍数。
/// 这是连续坐标回写网格坐标的**唯一**场所。
pub fn end_anime(character: &mut dyn CharacterControl, round_unit: f64) {
    character.set_through(false);
    character.set_animating(false);

    let snap = |v: f64| {
        if round_unit == 0.0 {
            v
        } else {
            (v / round_unit).round() * round_unit
        }
    };
    let x = snap(character.real_x());
    let y = snap(character.real_y());
    character.set_grid_position(x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试用キャラ实体
    struct MockCharacter {
        file: String,
        index: u8,
        walk_pattern: u8,
        direction: Direction,
        direction_fixed: bool,
        through: bool,
        animating: bool,
        real: (f64, f64),
        grid: (f64, f64),
    }

    impl MockCharacter {
        fn new() -> Self {
            Self {
                file: "Actor1".to_string(),
                index: 0,
                walk_pattern: 1,
                direction: Direction::Down,
                direction_fixed: false,
                through: false,
                animating: false,
                real: (0.0, 0.0),
                grid: (0.0, 0.0),
            }
        }
    }

    impl CharacterControl for MockCharacter {
        fn image_file(&self) -> String {
            self.file.clone()
        }
        fn character_index(&self) -> u8 {
            self.index
        }
        fn set_image(&mut self, file: &str, index: u8) {
            self.file = file.to_string();
            self.index = index;
        }
        fn set_walk_pattern(&mut self, pattern: u8) {
            self.walk_pattern = pattern;
        }
        fn direction(&self) -> Direction {
            self.direction
        }
        fn set_direction(&mut self, direction: Direction) {
            if !self.direction_fixed {
                self.direction = direction;
            }
        }
        fn is_direction_fixed(&self) -> bool {
            self.direction_fixed
        }
        fn set_direction_fix(&mut self, fixed: bool) {
            self.direction_fixed = fixed;
        }
        fn set_through(&mut self, through: bool) {
            self.through = through;
        }
        fn set_animating(&mut self, animating: bool) {
            self.animating = animating;
        }
        fn real_x(&self) -> f64 {
            self.real.0
        }
        fn real_y(&self) -> f64 {
            self.real.1
        }
        fn set_real_position(&mut self, x: f64, y: f64) {
            self.real = (x, y);
        }
        fn set_grid_position(&mut self, x: f64, y: f64) {
            self.grid = (x, y);
        }
        fn move_speed(&self) -> u8 {
            4
        }
        fn move_frequency(&self) -> u8 {
            3
        }
    }

    #[test]
    fn test_combined_pattern_decomposition() {
        // 组合パターン 11 → 歩行パターン 2、朝向 8（上）
        let mut ch = MockCharacter::new();
        apply_pattern(&mut ch, &PatternArgs::pattern(11));
        assert_eq!(ch.walk_pattern, 2);
        assert_eq!(ch.direction, Direction::Up);
    }

    #[test]
    fn test_explicit_direction_wins_over_decomposed() {
        // 组合パターン 4（分解朝向 4）+ 显式朝向 6 → 6 优先
        let mut ch = MockCharacter::new();
        apply_pattern(
            &mut ch,
            &PatternArgs::pattern_facing(4, Direction::Right),
        );
        assert_eq!(ch.walk_pattern, 1);
        assert_eq!(ch.direction, Direction::Right);
    }

    #[test]
    fn test_plain_pattern_defaults_down() {
        let mut ch = MockCharacter::new();
        ch.direction = Direction::Left;
        apply_pattern(&mut ch, &PatternArgs::pattern(2));
        assert_eq!(ch.walk_pattern, 2);
        assert_eq!(ch.direction, Direction::Down);
    }

    #[test]
    fn test_omitted_pattern_leaves_direction() {
        let mut ch = MockCharacter::new();
        ch.direction = Direction::Left;
        ch.walk_pattern = 0;
        apply_pattern(
            &mut ch,
            &PatternArgs {
                file: Some("!Door2".to_string()),
                index: Some(2),
                ..PatternArgs::default()
            },
        );
        assert_eq!(ch.file, "!Door2");
        assert_eq!(ch.index, 2);
        // パターン省略 → 朝向・パターン不动
        assert_eq!(ch.direction, Direction::Left);
        assert_eq!(ch.walk_pattern, 0);
    }

    #[test]
    fn test_direction_fix_restored() {
        // 朝向固定中でも図案設定は朝向を适用し、固定状态は复元される
        let mut ch = MockCharacter::new();
        ch.direction_fixed = true;
        ch.direction = Direction::Left;
        apply_pattern(&mut ch, &PatternArgs::pattern_facing(0, Direction::Up));
        assert_eq!(ch.direction, Direction::Up);
        assert!(ch.direction_fixed);

        // 非固定なら非固定のまま
        let mut ch = MockCharacter::new();
        apply_pattern(&mut ch, &PatternArgs::pattern(0));
        assert!(!ch.direction_fixed);
    }

    #[test]
    fn test_omitted_image_keeps_current() {
        let mut ch = MockCharacter::new();
        apply_pattern(&mut ch, &PatternArgs::pattern(1));
        assert_eq!(ch.file, "Actor1");
        assert_eq!(ch.index, 0);
    }

    #[test]
    fn test_locate_sets_real_position() {
        let mut ch = MockCharacter::new();
        locate(&mut ch, 10.5, 25.0, None);
        assert_eq!(ch.real, (10.5, 25.0));
    }

    #[test]
    fn test_nudge_offsets_by_pixels() {
        let mut ch = MockCharacter::new();
        ch.real = (2.0, 3.0);
        nudge(&mut ch, 24, -12, 48, 48, &PatternArgs::default());
        assert_eq!(ch.real, (2.5, 2.75));
    }

    #[test]
    fn test_anime_mode_round_trip() {
        let mut ch = MockCharacter::new();
        start_anime(&mut ch);
        assert!(ch.through);
        assert!(ch.animating);

        ch.real = (4.3, 7.6);
        end_anime(&mut ch, 1.0);
        assert!(!ch.through);
        assert!(!ch.animating);
        // 整タイルに吸着
        assert_eq!(ch.grid, (4.0, 8.0));
    }

    #[test]
    fn test_end_anime_round_units() {
        // 0 = 原值保留
        let mut ch = MockCharacter::new();
        ch.real = (4.3, 7.6);
        end_anime(&mut ch, 0.0);
        assert_eq!(ch.grid, (4.3, 7.6));

        // 0.5 = 半タイル吸着
        let mut ch = MockCharacter::new();
        ch.real = (4.3, 7.6);
        end_anime(&mut ch, 0.5);
        assert_eq!(ch.grid, (4.5, 7.5));
    }

    #[test]
    fn test_turn_cycle_route_shape() {
        let route = turn_cycle_route();
        assert!(route.skippable);
        assert_eq!(
            route.list,
            vec![
                MotionInstruction::Turn {
                    direction: Direction::Left
                },
                MotionInstruction::Wait { frames: 3 },
                MotionInstruction::Turn {
                    direction: Direction::Right
                },
                MotionInstruction::Wait { frames: 3 },
                MotionInstruction::Turn {
                    direction: Direction::Up
                },
                MotionInstruction::End,
            ]
        );
    }
}
