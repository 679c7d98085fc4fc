//! # Config 模块
//!
//! 地图与编译器的参数配置。
//!
//! ## 设计原则
//!
//! - 配置在启动时由宿主构造一次，之后以引用传入各入口，**不允许隐式全局状态**
//! - 所有字段可序列化，方便宿主从自己的参数源（插件参数、配置文件）反序列化

use serde::{Deserialize, Serialize};

/// 图层地图参数
///
/// 对应宿主引擎的插件参数，规定值与原插件一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// 书割（billboard）层放在手前（true）还是奥（false）
    pub billboard_in_front: bool,

    /// 低层空缺是否用周边（北、南）的タイル补全
    pub fill_with_neighbor_tile: bool,

    /// 补全用タイル编号（A5 页左上起的偏移）
    pub default_lower_tile: u32,

    /// A2 カウンター是否按书割处理
    pub use_layered_counter: bool,

    /// 地面（A2）[×] 设置是否整块不可通行（false 时内侧可通行）
    pub a2_full_collision: bool,

    /// 屋根（A3）南侧碰撞是否开放
    pub a3_upper_open: bool,

    /// 壁上面（A4）南侧碰撞是否开放
    pub a4_upper_open: bool,

    /// 立体交差的地形タグ（0 = 不使用立体交差）
    pub overpass_terrain_tag: u16,

    /// 2 タイル高キャラ用的碰撞调整
    pub tall_character: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            billboard_in_front: false,
            fill_with_neighbor_tile: true,
            default_lower_tile: 16,
            use_layered_counter: true,
            a2_full_collision: true,
            a3_upper_open: false,
            a4_upper_open: true,
            overpass_terrain_tag: 3,
            tall_character: false,
        }
    }
}

impl MapConfig {
    /// 立体交差是否启用
    pub fn overpass_enabled(&self) -> bool {
        self.overpass_terrain_tag != 0
    }
}

/// 移动宏编译参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompileConfig {
    /// 严格模式：未知操作码报错。
    /// 关闭（规定值）时沿用源脚本的兼容行为：静默跳过。
    pub strict_opcodes: bool,
}

impl CompileConfig {
    /// 兼容模式（未知操作码静默跳过）
    pub fn lenient() -> Self {
        Self {
            strict_opcodes: false,
        }
    }

    /// 严格模式
    pub fn strict() -> Self {
        Self {
            strict_opcodes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_config_defaults() {
        let cfg = MapConfig::default();
        assert!(!cfg.billboard_in_front);
        assert!(cfg.fill_with_neighbor_tile);
        assert_eq!(cfg.default_lower_tile, 16);
        assert!(cfg.use_layered_counter);
        assert!(cfg.a2_full_collision);
        assert!(!cfg.a3_upper_open);
        assert!(cfg.a4_upper_open);
        assert_eq!(cfg.overpass_terrain_tag, 3);
        assert!(!cfg.tall_character);
        assert!(cfg.overpass_enabled());
    }

    #[test]
    fn test_overpass_disabled_by_zero_tag() {
        let cfg = MapConfig {
            overpass_terrain_tag: 0,
            ..MapConfig::default()
        };
        assert!(!cfg.overpass_enabled());
    }

    #[test]
    fn test_config_serialization() {
        let cfg = MapConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
