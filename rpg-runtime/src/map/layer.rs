//! # Layer 模块
//!
//! 描画层の分类。
//!
//! [☆] タイルを一律最前面に置く代わりに、通行设定の组合せに応じて
//! 行ごとの书割（billboard）层へ振り分け、疑似的な奥行きを出す。
//! 2 阶・3 阶の振り分けは直下のタイルの壁形状から决める。

use serde::{Deserialize, Serialize};

use crate::map::flags::{
    FLOOR1_N_FULL, FLOOR1_N_HALF, FLOOR2_BOARD, FLOOR3_BOARD,
    tile_id::{autotile_shape, is_wall_side_tile},
};
use crate::map::transform::TilesetFlags;

/// タイルの描画先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderLayer {
    /// 低层（通常の地面描画）
    Lower,
    /// 高层（通常の [☆] 描画）
    Upper,
    /// 行ごとの书割层
    ///
    /// `floor` は 1〜3。2 阶は一つ下、3 阶は二つ下の行の书割に、
    /// それぞれタイル高 2・3 分上へずらして描く。
    Billboard { floor: u8 },
}

/// 壁（侧面）の状态
///
/// 0: 壁ではない、1: 下端、2: 上下に接続した壁、3: 上端。
pub fn wall_side_type(tile_id: u32) -> u8 {
    if !is_wall_side_tile(tile_id) {
        return 0;
    }
    // 形状の位は 下右上左 に対応する
    let shape = autotile_shape(tile_id);
    if shape & 2 != 0 {
        return 3;
    }
    if shape & 8 != 0 {
        return 1;
    }
    2
}

/// タイルの描画层を决める
///
/// `below_tile_id` は同セルひとつ南（画面下）の低层タイル。
/// 2 阶・3 阶指定の实际の阶数はその壁形状で决まる。
pub fn render_layer(tile_id: u32, below_tile_id: u32, flags: &TilesetFlags) -> RenderLayer {
    let flag = flags.get(tile_id);
    let collision = flag.collision_type();

    if !flag.is_upper() || collision == FLOOR1_N_FULL || collision == FLOOR1_N_HALF {
        // 高层タイルではない
        return RenderLayer::Lower;
    }

    // 优先阶
    let priority_floor = match collision {
        FLOOR2_BOARD => 2,
        FLOOR3_BOARD => 3,
        _ => 1,
    };

    let floor_number = if priority_floor >= 2 {
        match wall_side_type(below_tile_id) {
            1 => 2,
            2 => 3,
            // 上端・壁以外は指定の阶数そのまま
            _ => priority_floor,
        }
    } else {
        1
    };

    if floor_number >= 2 {
        RenderLayer::Billboard {
            floor: floor_number,
        }
    } else if flag.blocks_any() {
        // 通行不可设定のどれかが ON なら书割
        RenderLayer::Billboard { floor: 1 }
    } else {
        // 全方向通行可は通常の高层 [☆] 表示
        RenderLayer::Upper
    }
}
