//! # Transform 模块
//!
//! タイルセット读入时的旗标改写。
//!
//! 宿主编辑器里"无效果"的组合（A3・A4 的カウンター、[☆] 的 4 方向
//! 设定等）在这里被赋予图层地图语义：按ブロック内スロット查表，
//! 改写通行・[☆]（・梯子）位，其余位（尤其地形タグ）原样保留。
//!
//! ## 中心不变量
//!
//! 每条规则都是 `flag & PRESERVE_MASK | TABLE[slot]` ——
//! 改写的位与保留的位由各自的掩码显式划定。
//!
//! 改写**只在构造时执行一次**：[`TilesetFlags`] 构造后不可变，
//! 对已改写数据再次改写是未定义的，类型上也不可表达。

use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::map::flags::{
    AUTOTILE_BLOCK, FLAG_UPPER, MASK_ALL_DIR, MASK_CLIF, MASK_WITHOUT_DIR_UPPER,
    MASK_WITHOUT_DIR_UPPER_LADDER, TileFlag,
    tile_id::{
        TILE_ID_A2, TILE_ID_A3, TILE_ID_A4, TILE_ID_A5, TILE_ID_MAX, is_roof_tile,
        is_tile_a3, is_tile_a4, is_wall_top_tile,
    },
};
use crate::map::MapGrid;

// オートタイル通行テーブル
// 通行不可设定 1:下  2:左  4:右  8:上、16: 高层表示 [☆]

/// A2 カウンター
const COUNTER_PASS: [u16; 48] = [
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 28, 28, 28, 28, //
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 28, 28, 28, 28, 28, 15, 15, //
    15, 15, 28, 28, 15, 28, 28, 28, //
];

/// A2 [×] の内侧开放
const AUTO_TILE_EMPTY_PASS: [u16; 48] = [
    0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, //
    2, 2, 2, 2, 8, 8, 8, 8, //
    4, 4, 4, 4, 1, 1, 1, 1, //
    6, 9, 10, 10, 12, 12, 5, 5, //
    3, 3, 14, 11, 7, 13, 15, 15, //
];

/// 屋根 A3 奇数列（立体交差）
fn a3_upper_overpass(config: &MapConfig) -> [u16; 16] {
    let optt = (config.overpass_terrain_tag & 0xF) << 12;
    if config.a3_upper_open {
        [
            0, 2, optt + 8, optt + 10, //
            4, 6, optt + 12, optt + 14, //
            0, 2, optt + 8, optt + 10, //
            4, 6, optt + 12, optt + 14, //
        ]
    } else {
        [
            0, 2, optt + 8, optt + 10, //
            4, 6, optt + 12, optt + 14, //
            1, 3, optt + 9, optt + 11, //
            5, 7, optt + 15, optt + 13, //
        ]
    }
}

/// 屋根 A3 奇数列
fn a3_upper_pass(config: &MapConfig) -> [u16; 16] {
    if config.a3_upper_open {
        [
            0, 2, 17, 17, //
            4, 6, 17, 17, //
            0, 2, 17, 17, //
            4, 6, 17, 17, //
        ]
    } else {
        [
            0, 2, 17, 17, //
            4, 6, 17, 17, //
            1, 3, 17, 17, //
            5, 7, 17, 17, //
        ]
    }
}

/// 屋根 A3 奇数列（地面）
fn a3_bottom_pass(config: &MapConfig) -> [u16; 16] {
    if config.a3_upper_open {
        [
            0, 2, 8, 10, //
            4, 6, 12, 14, //
            0, 2, 8, 10, //
            4, 6, 12, 14, //
        ]
    } else {
        [
            0, 2, 8, 10, //
            4, 6, 12, 14, //
            1, 3, 9, 11, //
            5, 7, 13, 15, //
        ]
    }
}

/// 壁（上面）A4 奇数列
fn a4_upper_pass(config: &MapConfig) -> [u16; 48] {
    if config.a4_upper_open {
        [
            0, 2, 4, 6, 0, 2, 4, 6, //
            0, 2, 4, 6, 0, 2, 4, 6, //
            2, 6, 2, 6, 17, 17, 17, 17, //
            4, 4, 6, 6, 0, 2, 4, 6, //
            6, 17, 17, 17, 17, 17, 4, 6, //
            2, 6, 17, 17, 6, 17, 17, 17, //
        ]
    } else {
        [
            0, 2, 4, 6, 0, 2, 4, 6, //
            0, 2, 4, 6, 0, 2, 4, 6, //
            2, 6, 2, 6, 17, 17, 17, 17, //
            4, 4, 6, 6, 1, 3, 5, 7, //
            6, 17, 17, 17, 17, 17, 5, 7, //
            3, 7, 17, 17, 7, 17, 17, 17, //
        ]
    }
}

/// 壁（上面）A4 奇数列、北端のみ [☆]、他は全通行不可
const A4_UPPER_STAR_PASS: [u16; 48] = [
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 15, 15, 15, 16, 16, 16, 16, //
    15, 15, 15, 15, 15, 15, 15, 15, //
    15, 16, 16, 16, 16, 16, 15, 15, //
    15, 15, 16, 16, 15, 16, 16, 16, //
];

/// 壁（侧面）A3・A4 偶数列 [×]
const WALL_SIDE_PASS_EDGE: [u16; 16] = [
    15, 15, 17, 17, //
    15, 15, 17, 17, //
    15, 15, 17, 17, //
    15, 15, 17, 17, //
];

/// 壁（侧面）A3・A4 偶数列 [○]
const WALL_SIDE_PASS: [u16; 16] = [
    25, 25, 26, 26, //
    25, 25, 26, 26, //
    17, 17, 17, 17, //
    17, 17, 17, 17, //
];

/// 改写済みタイルセット旗标表
///
/// [`TilesetFlags::from_raw`] で一度だけ改写され、以降は只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetFlags {
    flags: Vec<u16>,
}

impl TilesetFlags {
    /// 生の旗标表から构造し、读入时改写を适用する
    pub fn from_raw(raw: Vec<u16>, config: &MapConfig) -> Self {
        let mut flags = raw;

        if config.use_layered_counter {
            // カウンタータイル（A2）を走查
            for block in autotile_blocks(TILE_ID_A2, TILE_ID_A3, flags.len()) {
                if TileFlag(flags[block]).is_counter() {
                    rewrite(&mut flags, block, 47, MASK_WITHOUT_DIR_UPPER, &COUNTER_PASS);
                }
            }
        }

        if !config.a2_full_collision {
            // 地面タイル（A2）の [×] 判定の中を通行可に变更
            for block in autotile_blocks(TILE_ID_A2, TILE_ID_A3, flags.len()) {
                if flags[block + 15] & MASK_ALL_DIR != 0 {
                    rewrite(
                        &mut flags,
                        block,
                        47,
                        MASK_WITHOUT_DIR_UPPER,
                        &AUTO_TILE_EMPTY_PASS,
                    );
                }
            }
        }

        // 屋根タイル（A3）を走查
        for block in autotile_blocks(TILE_ID_A3, TILE_ID_A4, flags.len()) {
            if TileFlag(flags[block]).is_counter() {
                if is_roof_tile(block as u32) {
                    roof_to_upper(&mut flags, block, config);
                } else {
                    wall_side_to_upper(&mut flags, block);
                }
            } else if is_roof_tile(block as u32) {
                roof_to_bottom(&mut flags, block, config);
            }
        }

        // 壁タイル（A4）を走查
        for block in autotile_blocks(TILE_ID_A4, TILE_ID_MAX, flags.len()) {
            if TileFlag(flags[block]).is_counter() {
                if is_wall_top_tile(block as u32) {
                    wall_top_to_upper(&mut flags, block, config);
                } else {
                    wall_side_to_upper(&mut flags, block);
                }
            } else if !config.a4_upper_open && is_wall_top_tile(block as u32) {
                wall_top_to_close(&mut flags, block);
            }
        }

        Self { flags }
    }

    /// 指定タイルの旗标
    ///
    /// 范围外の ID は全方向通行不可として扱う（帧路径は决して失败しない）。
    pub fn get(&self, tile_id: u32) -> TileFlag {
        self.flags
            .get(tile_id as usize)
            .copied()
            .map(TileFlag)
            .unwrap_or(TileFlag(MASK_ALL_DIR))
    }

    /// 表の长さ
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// 表が空か
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// ブロック先头 ID の列（表の长さで打ち切り）
fn autotile_blocks(start: u32, end: u32, len: usize) -> impl Iterator<Item = usize> {
    (start..end)
        .step_by(AUTOTILE_BLOCK as usize)
        .map(|id| id as usize)
        .filter(move |&id| id + AUTOTILE_BLOCK as usize <= len)
}

/// `flag & mask | table[slot]` を count スロット分适用
fn rewrite(flags: &mut [u16], block: usize, count: usize, mask: u16, table: &[u16]) {
    for i in 0..count {
        flags[block + i] = flags[block + i] & mask | table[i];
    }
}

/// 屋根の通行设定（カウンター ON）
fn roof_to_upper(flags: &mut [u16], block: usize, config: &MapConfig) {
    let decider = flags[block + 15];
    if decider & MASK_ALL_DIR != 0 {
        // [×]
        if config.overpass_enabled() && decider >> 12 == config.overpass_terrain_tag {
            // 上端を立体交差表示、适宜通行不可 [・]
            rewrite(flags, block, 16, MASK_CLIF, &a3_upper_overpass(config));
        } else {
            // 上端を书割表示 [☆]、适宜通行不可 [・]
            rewrite(flags, block, 16, MASK_WITHOUT_DIR_UPPER, &a3_upper_pass(config));
        }
    } else {
        // [○] : 全体を高层表示 [☆] かつ通行可
        rewrite(flags, block, 16, MASK_WITHOUT_DIR_UPPER, &[FLAG_UPPER; 16]);
    }
}

/// 屋根の通行设定（カウンター OFF）
fn roof_to_bottom(flags: &mut [u16], block: usize, config: &MapConfig) {
    if flags[block + 15] & MASK_ALL_DIR == 0 {
        return;
    }
    // [×] : 全体を闭じる
    rewrite(flags, block, 16, MASK_WITHOUT_DIR_UPPER, &a3_bottom_pass(config));
}

/// 壁（上面）の通行设定
fn wall_top_to_upper(flags: &mut [u16], block: usize, config: &MapConfig) {
    if flags[block + 46] & MASK_ALL_DIR != 0 {
        if TileFlag(flags[block]).is_ladder() {
            // [梯子][×] : 北端のみ [☆]、他は全通行不可（梯子位は外す）
            rewrite(
                flags,
                block,
                47,
                MASK_WITHOUT_DIR_UPPER_LADDER,
                &A4_UPPER_STAR_PASS,
            );
        } else {
            // [×] : 北端を高层表示 [☆]、适宜通行不可 [・]
            rewrite(flags, block, 47, MASK_WITHOUT_DIR_UPPER, &a4_upper_pass(config));
        }
    } else {
        // [○] : 全体を高层表示 [☆] かつ通行可
        rewrite(flags, block, 47, MASK_WITHOUT_DIR_UPPER, &[FLAG_UPPER; 47]);
    }
}

/// 壁（上面）の通行设定（地面）
fn wall_top_to_close(flags: &mut [u16], block: usize) {
    if flags[block + 46] & MASK_ALL_DIR == 0 {
        return;
    }
    // [×] : 全体を闭じる
    rewrite(flags, block, 47, MASK_WITHOUT_DIR_UPPER, &AUTO_TILE_EMPTY_PASS);
}

/// 壁（侧面）の通行设定
fn wall_side_to_upper(flags: &mut [u16], block: usize) {
    if flags[block + 15] & MASK_ALL_DIR != 0 {
        // [×] : 上端を高层表示 [☆]、适宜通行不可 [・]
        rewrite(flags, block, 16, MASK_WITHOUT_DIR_UPPER, &WALL_SIDE_PASS_EDGE);
    } else {
        // [○] : 全体を高层表示 [☆] かつ通行可（一番下のみ通行不可）
        rewrite(flags, block, 16, MASK_WITHOUT_DIR_UPPER, &WALL_SIDE_PASS);
    }
}

/// 地图读入时の低层补完
///
/// 低层（z0）が A3・A4 のセルは、タイルを z2 に写した上で
/// 低层を北邻（最下段は南邻）か既定タイルで埋める。
/// 高架の下の地面が空洞として见えるのを防ぐ。
pub fn fill_lower_layer(map: &mut MapGrid, config: &MapConfig) {
    let default_tile = TILE_ID_A5 + config.default_lower_tile;

    for y in 0..map.height() as i64 {
        for x in 0..map.width() as i64 {
            let tile_id = map.tile(x, y, 0);
            if !is_a3_a4(tile_id) {
                continue;
            }

            // タイルを补完
            map.set_tile(x, y, 2, tile_id);

            if config.fill_with_neighbor_tile {
                // 北タイルで补完、ただし一番南は南で补完
                let south = map.tile(x, map.round_y(y + 1), 0);
                if is_a3_a4(south) {
                    let north = map.tile(x, map.round_y(y - 1), 0);
                    map.set_tile(x, y, 0, if north != 0 { north } else { default_tile });
                } else {
                    map.set_tile(x, y, 0, if south != 0 { south } else { default_tile });
                }
            } else {
                // 指定タイルで补完
                map.set_tile(x, y, 0, default_tile);
            }
        }
    }
}

/// A3・A4 タイルか
fn is_a3_a4(tile_id: u32) -> bool {
    is_tile_a3(tile_id) || is_tile_a4(tile_id)
}
