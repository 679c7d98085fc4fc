//! # RPG Runtime
//!
//! 2D タイル RPG エンジン向け拡張の核心运行时库：
//! 移动宏（Movement Macro）编译与图层地图（Layered Map）。
//!
//! ## 架构概述
//!
//! `rpg-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 宿主引擎通过窄接口（能力 trait）与数据类型与核心通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │── 宏字符串 + 速度 ──────────────►│ MacroCompiler::compile
//!   │◄─ MoveRoute（指令列表 + 旗标）──│
//!   │                                   │
//!   │── 生旗标表（地图读入时）───────►│ TilesetFlags::from_raw
//!   │◄─ 改写済み旗标表 ───────────────│
//!   │                                   │
//!   │── 位置・方向（每帧）───────────►│ Passability::passable
//!   │◄─ 可否 + 高架状态更新 ──────────│
//! ```
//!
//! ## 核心类型
//!
//! - [`MacroCompiler`]：移动宏 → [`MoveRoute`]
//! - [`TilesetFlags`]：读入时一次性改写的タイル旗标表
//! - [`Passability`]：通行判定与立体交差状态机
//! - [`Resolver`]：字符串参数 → 数值・布尔・方位・引用
//! - [`MapConfig`] / [`CompileConfig`]：启动时构造一次的不可变配置
//!
//! ## 模块结构
//!
//! - [`config`]：参数配置
//! - [`direction`]：テンキー方位模型
//! - [`resolve`]：参数解析（外部命名状态の唯一入口）
//! - [`route`]：移动宏编译与路线指令
//! - [`character`]：キャラ图案・自由坐标控制
//! - [`map`]：旗标改写・通行判定・描画层分类
//! - [`error`]：错误类型定义

pub mod character;
pub mod config;
pub mod direction;
pub mod error;
pub mod map;
pub mod resolve;
pub mod route;

// 重导出核心类型
pub use character::{CharacterControl, PatternArgs, apply_pattern, end_anime, locate, nudge,
    start_anime, turn_cycle_route};
pub use config::{CompileConfig, MapConfig};
pub use direction::Direction;
pub use error::{CoreError, CoreResult, MacroError, ResolveError};
pub use map::flags::TileFlag;
pub use map::layer::{RenderLayer, render_layer, wall_side_type};
pub use map::passability::{HalfPos, OverpassActor, Passability, follow_direction, half_pos};
pub use map::transform::{TilesetFlags, fill_lower_layer};
pub use map::{MapGrid, MapView};
pub use resolve::{EventRef, GameStateView, Resolver, VarValue};
pub use route::{MacroCompiler, MotionInstruction, MoveRoute, speed_to_frames};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let route = MacroCompiler::new().compile("↑1", 4).unwrap();
        assert_eq!(route.step_count(), 1);

        let config = MapConfig::default();
        let flags = TilesetFlags::from_raw(vec![0; 64], &config);
        assert!(!flags.is_empty());

        let _dir = Direction::Up.opposite();
        let _layer = render_layer(0, 0, &flags);
    }
}
