//! # Map 模块
//!
//! 图层地图核心：タイル旗标的位布局（[`flags`]）、读入时的旗标改写
//! （[`transform`]）、通行判定与立体交差（[`passability`]）、
//! 描画层分类（[`layer`]）。
//!
//! ## 数据流
//!
//! ```text
//! 地图读入时（一次性）:
//!   raw flags ─► TilesetFlags::from_raw ─► 改写済み旗标表
//!   MapGrid   ─► fill_lower_layer      ─► 低层补完済み地图
//!
//! 每帧（只读）:
//!   旗标表 + MapGrid ─► Passability / render_layer
//! ```

pub mod flags;
pub mod layer;
pub mod passability;
pub mod transform;

use serde::{Deserialize, Serialize};

/// 地图タイル格子
///
/// 与宿主的地图数据同构：`data[x + (y + z * height) * width]`。
/// z 层 0〜1 为低层（地面），2〜3 为高层（B〜E）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapGrid {
    width: u32,
    height: u32,
    layers: u32,
    loop_horizontal: bool,
    loop_vertical: bool,
    data: Vec<u32>,
}

impl MapGrid {
    /// 从平坦数组构造
    ///
    /// `data.len()` 必须等于 `width * height * layers`。
    pub fn from_data(
        width: u32,
        height: u32,
        layers: u32,
        data: Vec<u32>,
        loop_horizontal: bool,
        loop_vertical: bool,
    ) -> Self {
        assert_eq!(data.len(), (width * height * layers) as usize);
        Self {
            width,
            height,
            layers,
            loop_horizontal,
            loop_vertical,
            data,
        }
    }

    /// 全零数据的地图（测试・生成用）
    pub fn empty(width: u32, height: u32, layers: u32) -> Self {
        Self::from_data(
            width,
            height,
            layers,
            vec![0; (width * height * layers) as usize],
            false,
            false,
        )
    }

    /// 横幅（タイル数）
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 纵幅（タイル数）
    pub fn height(&self) -> u32 {
        self.height
    }

    /// 横方向のループ折り返し
    pub fn round_x(&self, x: i64) -> i64 {
        if self.loop_horizontal {
            x.rem_euclid(self.width as i64)
        } else {
            x
        }
    }

    /// 纵方向のループ折り返し
    pub fn round_y(&self, y: i64) -> i64 {
        if self.loop_vertical {
            y.rem_euclid(self.height as i64)
        } else {
            y
        }
    }

    /// 座标が范围内か
    pub fn is_valid(&self, x: i64, y: i64) -> bool {
        (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y)
    }

    /// 指定位置・层のタイル ID（折り返し込み、范围外は 0）
    pub fn tile(&self, x: i64, y: i64, z: u32) -> u32 {
        let x = self.round_x(x);
        let y = self.round_y(y);
        if !self.is_valid(x, y) || z >= self.layers {
            return 0;
        }
        self.data[(x as u32 + (y as u32 + z * self.height) * self.width) as usize]
    }

    /// 指定位置・层にタイル ID を书き込む（范围外は无视）
    pub fn set_tile(&mut self, x: i64, y: i64, z: u32, tile_id: u32) {
        let x = self.round_x(x);
        let y = self.round_y(y);
        if !self.is_valid(x, y) || z >= self.layers {
            return;
        }
        self.data[(x as u32 + (y as u32 + z * self.height) * self.width) as usize] = tile_id;
    }
}

/// 地图查询的窄接口
///
/// 通行判定が必要とする最小限：重なったタイル ID と座标折り返し。
pub trait MapView {
    /// 指定位置に重なった全タイル ID（上の层から顺）
    fn all_tiles(&self, x: i64, y: i64) -> Vec<u32>;
    /// 横方向の折り返し
    fn round_x(&self, x: i64) -> i64;
    /// 纵方向の折り返し
    fn round_y(&self, y: i64) -> i64;
}

impl MapView for MapGrid {
    fn all_tiles(&self, x: i64, y: i64) -> Vec<u32> {
        // 描画上の重なり顺（z3 → z0）
        (0..4.min(self.layers))
            .map(|z| self.tile(x, y, 3.min(self.layers - 1) - z))
            .collect()
    }

    fn round_x(&self, x: i64) -> i64 {
        MapGrid::round_x(self, x)
    }

    fn round_y(&self, y: i64) -> i64 {
        MapGrid::round_y(self, y)
    }
}
