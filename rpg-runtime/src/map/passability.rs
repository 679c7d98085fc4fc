//! # Passability 模块
//!
//! 逐帧的通行判定与立体交差（高架）状态机。
//!
//! ## 模型
//!
//! - キャラの连续坐标はタイル内の 4 分割（[`HalfPos`]）に分类され、
//!   特殊碰撞（棚・机・椅子・杭）は（分割 × 方向）の组合ごとに独立の
//!   规则を持つ
//! - 高架状态はキャラ侧の `higher_level` 一个の布尔だけを持续状态とし、
//!   升降の判定は每步、坐标と旗标表から再计算する
//! - 各分支は原典の挙动を分支単位で保存している（方向・分割ごとの
//!   非对称も含む）。対称化による整理はしない
//!
//! 判定は决して失败しない：範囲外のタイルは全方向通行不可として扱う。

use crate::config::MapConfig;
use crate::direction::Direction;
use crate::map::MapView;
use crate::map::flags::{
    FLAG_NORTH_DIR, FLOOR1_N_FULL, FLOOR1_N_HALF, FLOOR1_S_FLAT, FLOOR1_S_FULL, FLOOR1_S_HALF,
};
use crate::map::transform::TilesetFlags;

/// タイル内の 4 分割位置
///
/// x・y それぞれが整数タイルに整列しているかで分类する
/// （半タイル移动の世界では .5 刻みの位置があり得る）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfPos {
    /// 左上（x・y とも半端）
    UpperLeft,
    /// 上（x 整列、y 半端）
    Upper,
    /// 左下（x 半端、y 整列）
    LowerLeft,
    /// 下（x・y とも整列）
    Lower,
}

/// 连续坐标 → タイル内分割位置
pub fn half_pos(x: f64, y: f64) -> HalfPos {
    match (x.fract() == 0.0, y.fract() == 0.0) {
        (false, false) => HalfPos::UpperLeft,
        (true, false) => HalfPos::Upper,
        (false, true) => HalfPos::LowerLeft,
        (true, true) => HalfPos::Lower,
    }
}

/// 高架状态を持つキャラの能力集
///
/// 持续状态は `higher_level` のみ。位置は判定の入力。
pub trait OverpassActor {
    /// 连续 x 坐标（タイル単位）
    fn real_x(&self) -> f64;
    /// 连续 y 坐标
    fn real_y(&self) -> f64;
    /// 高架上か
    fn higher_level(&self) -> bool;
    /// 高架状态の更新
    fn set_higher_level(&mut self, higher: bool);
}

/// 通行判定エンジン
///
/// 改写済み旗标表・地图・配置を束ねた只读の判定器。
pub struct Passability<'a> {
    map: &'a dyn MapView,
    flags: &'a TilesetFlags,
    config: &'a MapConfig,
}

impl<'a> Passability<'a> {
    /// 判定器を构成
    pub fn new(map: &'a dyn MapView, flags: &'a TilesetFlags, config: &'a MapConfig) -> Self {
        Self { map, flags, config }
    }

    /// 指定位置に指定碰撞类型のタイルがあるか
    fn check_collision(&self, x: i64, y: i64, collision_type: u16) -> bool {
        self.map
            .all_tiles(x, y)
            .iter()
            .any(|&tile| self.flags.get(tile).collision_type() == collision_type)
    }

    /// 指定位置の立体交差タイルの通行设定
    ///
    /// `Some(true)` = その方向が通行不可、`Some(false)` = 通行可、
    /// `None` = 立体交差タイルではない。
    fn overpass_blocked(&self, x: i64, y: i64, direction: Direction) -> Option<bool> {
        let x = self.map.round_x(x);
        let y = self.map.round_y(y);
        for tile in self.map.all_tiles(x, y) {
            let flag = self.flags.get(tile);
            if flag.terrain_tag() == self.config.overpass_terrain_tag {
                return Some(flag.blocks(direction));
            }
        }
        None
    }

    /// 指定位置の地形タグ（重なり上位优先、0 は无视）
    fn terrain_tag(&self, x: i64, y: i64) -> u16 {
        for tile in self.map.all_tiles(x, y) {
            let tag = self.flags.get(tile).terrain_tag();
            if tag > 0 {
                return tag;
            }
        }
        0
    }

    /// 立体交差タイルか
    fn is_overpass_tile(&self, x: i64, y: i64) -> bool {
        self.terrain_tag(self.map.round_x(x), self.map.round_y(y)) == self.config.overpass_terrain_tag
    }

    /// 移动可否の判定
    ///
    /// `default_pass` は宿主の既定通行判定の结果。特殊碰撞・高架の
    /// 规则が何も当てはまらない场合はそれをそのまま返す。
    /// 升降はここで `actor` の高架状态に书き戻される。
    pub fn passable(
        &self,
        actor: &mut dyn OverpassActor,
        direction: Direction,
        default_pass: bool,
    ) -> bool {
        let x = (actor.real_x() + 0.5).floor() as i64;
        let y = (actor.real_y() + 0.5).floor() as i64;
        let half = half_pos(actor.real_x(), actor.real_y());
        let d = direction.numpad();

        use HalfPos::{Lower, LowerLeft, Upper, UpperLeft};

        // 棚（北半分通行不可、全幅）
        match d {
            2 => {
                if matches!(half, LowerLeft | Lower) && self.check_collision(x, y + 1, FLOOR1_N_FULL)
                {
                    return false;
                }
                if half == LowerLeft && self.check_collision(x - 1, y + 1, FLOOR1_N_FULL) {
                    return false;
                }
            }
            8 => {
                if matches!(half, LowerLeft | Lower) && self.check_collision(x, y, FLOOR1_N_FULL) {
                    return false;
                }
                if half == LowerLeft && self.check_collision(x - 1, y, FLOOR1_N_FULL) {
                    return false;
                }
            }
            4 => {
                if half == Upper && self.check_collision(x - 1, y, FLOOR1_N_FULL) {
                    return false;
                }
            }
            6 => {
                if half == Upper && self.check_collision(x + 1, y, FLOOR1_N_FULL) {
                    return false;
                }
            }
            _ => {}
        }

        // 机（南半分通行不可、全幅）
        match d {
            2 => {
                if matches!(half, UpperLeft | Upper) && self.check_collision(x, y, FLOOR1_S_FULL) {
                    return false;
                }
                if half == UpperLeft && self.check_collision(x - 1, y, FLOOR1_S_FULL) {
                    return false;
                }
            }
            8 => {
                if matches!(half, UpperLeft | Upper) && self.check_collision(x, y - 1, FLOOR1_S_FULL)
                {
                    return false;
                }
                if half == UpperLeft && self.check_collision(x - 1, y - 1, FLOOR1_S_FULL) {
                    return false;
                }
            }
            4 => {
                if half == Lower && self.check_collision(x - 1, y, FLOOR1_S_FULL) {
                    return false;
                }
            }
            6 => {
                if half == Lower && self.check_collision(x + 1, y, FLOOR1_S_FULL) {
                    return false;
                }
            }
            _ => {}
        }

        // 根元（北半分、两胁通行可）
        match d {
            2 => {
                if half == Lower && self.check_collision(x, y + 1, FLOOR1_N_HALF) {
                    return false;
                }
            }
            8 => {
                if half == Lower && self.check_collision(x, y, FLOOR1_N_HALF) {
                    return false;
                }
            }
            4 => {
                if half == UpperLeft && self.check_collision(x - 1, y, FLOOR1_N_HALF) {
                    return false;
                }
            }
            6 => {
                if half == UpperLeft && self.check_collision(x, y, FLOOR1_N_HALF) {
                    return false;
                }
            }
            _ => {}
        }

        // 椅子（南半分、两胁通行可）
        match d {
            2 => {
                if half == Upper && self.check_collision(x, y, FLOOR1_S_HALF) {
                    return false;
                }
            }
            8 => {
                if half == Upper && self.check_collision(x, y - 1, FLOOR1_S_HALF) {
                    return false;
                }
            }
            4 => {
                if half == LowerLeft && self.check_collision(x - 1, y, FLOOR1_S_HALF) {
                    return false;
                }
            }
            6 => {
                if half == LowerLeft && self.check_collision(x, y, FLOOR1_S_HALF) {
                    return false;
                }
            }
            _ => {}
        }

        // 杭（南缘のみ）
        if d == 2 {
            if half == Lower && self.check_collision(x, y, FLOOR1_S_FLAT) {
                return false;
            }
        } else if d == 8 && half == Upper && self.check_collision(x, y - 1, FLOOR1_S_FLAT) {
            return false;
        }

        // ここから立体交差
        if !self.config.overpass_enabled() {
            return default_pass;
        }

        if actor.higher_level() {
            if self.is_down_from_upper(x, y, half) {
                actor.set_higher_level(false);
            }
            return default_pass;
        }

        // 下を潜っている状态は端の通行判定を逆転
        if self.is_overpass_tile(x, y) {
            if matches!(half, UpperLeft | Upper) {
                if d == 8
                    && !self.is_overpass_tile(x, y - 2)
                    && self.overpass_blocked(x, y - 1, Direction::Down) == Some(false)
                {
                    return false;
                }
            } else if d == 2
                && !self.is_overpass_tile(x, y + 1)
                && self.overpass_blocked(x, y, Direction::Down) == Some(false)
            {
                return false;
            }
            if matches!(half, Upper | Lower) {
                if d == 4 {
                    if !self.is_overpass_tile(x - 1, y)
                        && self.overpass_blocked(x, y, Direction::Left) == Some(false)
                    {
                        return false;
                    }
                } else if d == 6
                    && !self.is_overpass_tile(x + 1, y)
                    && self.overpass_blocked(x, y, Direction::Right) == Some(false)
                {
                    return false;
                }
            }
            return true;
        } else if half == UpperLeft {
            // 东の境界
            if d == 8 && self.is_overpass_tile(x - 1, y) {
                return !(!self.is_overpass_tile(x - 1, y - 2)
                    && self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(false));
            }
        } else if half == LowerLeft && d == 2 {
            if self.is_overpass_tile(x - 1, y) {
                return !(!self.is_overpass_tile(x - 1, y + 1)
                    && self.overpass_blocked(x - 1, y, Direction::Down) == Some(false));
            }
            if self.overpass_blocked(x - 1, y + 1, Direction::Up) == Some(true)
                && self.overpass_blocked(x - 1, y + 1, Direction::Right) == Some(true)
            {
                return true;
            }
            // 西の境界
            if self.overpass_blocked(x, y + 1, Direction::Up) == Some(true)
                && self.overpass_blocked(x, y + 1, Direction::Left) == Some(true)
            {
                return true;
            }
        }

        // 潜る
        match half {
            UpperLeft => {
                if d == 8
                    && self.overpass_blocked(x, y - 1, Direction::Down) == Some(true)
                    && self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(true)
                {
                    return true;
                }
            }
            Upper => {
                if d == 4 {
                    if self.overpass_blocked(x - 1, y, Direction::Right) == Some(true) {
                        if self.overpass_blocked(x - 1, y, Direction::Up) == Some(true) {
                            return true;
                        } else if self.overpass_blocked(x - 1, y - 1, Direction::Right)
                            == Some(true)
                        {
                            return true;
                        }
                    }
                } else if d == 6 {
                    if self.overpass_blocked(x + 1, y, Direction::Left) == Some(true) {
                        if self.overpass_blocked(x + 1, y, Direction::Up) == Some(true) {
                            return true;
                        } else if self.overpass_blocked(x + 1, y - 1, Direction::Left)
                            == Some(true)
                        {
                            return true;
                        }
                    }
                } else if d == 8 && self.overpass_blocked(x, y - 1, Direction::Down) == Some(true) {
                    return true;
                }
            }
            LowerLeft => {
                if d == 2
                    && self.overpass_blocked(x, y + 1, Direction::Up) == Some(true)
                    && self.overpass_blocked(x - 1, y + 1, Direction::Up) == Some(true)
                {
                    return true;
                }
            }
            Lower => {
                if d == 2 {
                    if self.overpass_blocked(x, y + 1, Direction::Up) == Some(true) {
                        return true;
                    }
                } else if d == 4 {
                    if self.overpass_blocked(x - 1, y, Direction::Right) == Some(true) {
                        if self.overpass_blocked(x - 1, y, Direction::Up) == Some(true) {
                            return true;
                        } else if self.config.tall_character {
                            if self.overpass_blocked(x - 1, y - 1, Direction::Right) == Some(true) {
                                return true;
                            }
                        } else {
                            return true;
                        }
                    }
                } else if d == 6 {
                    if self.overpass_blocked(x + 1, y, Direction::Left) == Some(true) {
                        if self.overpass_blocked(x + 1, y, Direction::Up) == Some(true) {
                            return true;
                        } else if self.config.tall_character {
                            if self.overpass_blocked(x + 1, y - 1, Direction::Left) == Some(true) {
                                return true;
                            }
                        } else {
                            return true;
                        }
                    }
                }
            }
        }

        // 境界の北の冲突判定
        if half == Lower {
            if d == 4 {
                if !self.is_overpass_tile(x - 1, y)
                    && !self.is_overpass_tile(x - 1, y + 1)
                    && self.overpass_blocked(x, y + 1, Direction::Left) == Some(false)
                    && self.overpass_blocked(x, y + 1, Direction::Up) == Some(true)
                {
                    return false;
                }
                if !self.is_overpass_tile(x - 1, y)
                    && !self.is_overpass_tile(x, y + 1)
                    && self.overpass_blocked(x - 1, y + 1, Direction::Right) == Some(false)
                    && self.overpass_blocked(x - 1, y + 1, Direction::Up) == Some(true)
                {
                    return false;
                }
            } else if d == 6 {
                if !self.is_overpass_tile(x + 1, y)
                    && !self.is_overpass_tile(x + 1, y + 1)
                    && self.overpass_blocked(x, y + 1, Direction::Right) == Some(false)
                    && self.overpass_blocked(x, y + 1, Direction::Up) == Some(true)
                {
                    return false;
                }
                if !self.is_overpass_tile(x + 1, y)
                    && !self.is_overpass_tile(x, y + 1)
                    && self.overpass_blocked(x + 1, y + 1, Direction::Left) == Some(false)
                    && self.overpass_blocked(x + 1, y + 1, Direction::Up) == Some(true)
                {
                    return false;
                }
            }
        } else if half == LowerLeft
            && d == 2
            && !self.is_overpass_tile(x, y + 1)
            && !self.is_overpass_tile(x - 1, y + 1)
        {
            if !self.is_overpass_tile(x - 1, y + 2)
                && self.overpass_blocked(x, y + 2, Direction::Left) == Some(false)
                && self.overpass_blocked(x, y + 2, Direction::Down) == Some(true)
            {
                return false;
            }
            if !self.is_overpass_tile(x, y + 2)
                && self.overpass_blocked(x - 1, y + 2, Direction::Right) == Some(false)
                && self.overpass_blocked(x - 1, y + 2, Direction::Down) == Some(true)
            {
                return false;
            }
        }

        // 境界の南の冲突判定
        if half == Upper || (self.config.tall_character && half == Lower) {
            if d == 4 {
                if !self.is_overpass_tile(x - 1, y)
                    && !self.is_overpass_tile(x - 1, y - 1)
                    && self.overpass_blocked(x, y - 1, Direction::Left) == Some(false)
                    && self.overpass_blocked(x, y - 1, Direction::Down) == Some(true)
                {
                    return false;
                }
                if !self.is_overpass_tile(x - 1, y)
                    && !self.is_overpass_tile(x, y - 1)
                    && self.overpass_blocked(x - 1, y - 1, Direction::Right) == Some(false)
                    && self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(true)
                {
                    return false;
                }
            } else if d == 6 {
                if !self.is_overpass_tile(x + 1, y)
                    && !self.is_overpass_tile(x + 1, y - 1)
                    && self.overpass_blocked(x, y - 1, Direction::Right) == Some(false)
                    && self.overpass_blocked(x, y - 1, Direction::Down) == Some(true)
                {
                    return false;
                }
                if !self.is_overpass_tile(x + 1, y)
                    && !self.is_overpass_tile(x, y - 1)
                    && self.overpass_blocked(x + 1, y - 1, Direction::Left) == Some(false)
                    && self.overpass_blocked(x + 1, y - 1, Direction::Down) == Some(true)
                {
                    return false;
                }
            }
        } else if self.config.tall_character {
            if half == UpperLeft
                && d == 8
                && !self.is_overpass_tile(x, y - 1)
                && !self.is_overpass_tile(x - 1, y - 1)
            {
                if !self.is_overpass_tile(x - 1, y - 2)
                    && self.overpass_blocked(x, y - 2, Direction::Left) == Some(false)
                    && self.overpass_blocked(x, y - 2, Direction::Down) == Some(true)
                {
                    return false;
                }
                if !self.is_overpass_tile(x, y - 2)
                    && self.overpass_blocked(x - 1, y - 2, Direction::Right) == Some(false)
                    && self.overpass_blocked(x - 1, y - 2, Direction::Down) == Some(true)
                {
                    return false;
                }
            }
        } else if half == LowerLeft
            && d == 8
            && !self.is_overpass_tile(x, y)
            && !self.is_overpass_tile(x - 1, y)
        {
            if !self.is_overpass_tile(x - 1, y - 1)
                && self.overpass_blocked(x, y - 1, Direction::Left) == Some(false)
                && self.overpass_blocked(x, y - 1, Direction::Down) == Some(true)
            {
                return false;
            }
            if !self.is_overpass_tile(x, y - 1)
                && self.overpass_blocked(x - 1, y - 1, Direction::Right) == Some(false)
                && self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(true)
            {
                return false;
            }
        }

        // 乗る
        if self.is_up_to_higher(x, y, half) {
            actor.set_higher_level(true);
        }

        default_pass
    }

    /// 高层へ上がるタイミングか
    fn is_up_to_higher(&self, x: i64, y: i64, half: HalfPos) -> bool {
        if matches!(half, HalfPos::UpperLeft | HalfPos::LowerLeft) {
            // 西出入口境界
            if !self.is_overpass_tile(x - 1, y)
                && self.overpass_blocked(x, y, Direction::Left) == Some(false)
            {
                return true;
            }
        }
        // 立体交差タイルの上は帰す
        if self.is_overpass_tile(x, y) {
            return false;
        }

        self.overpass_blocked(x - 1, y, Direction::Right) == Some(false) // 东出入口
            || self.overpass_blocked(x + 1, y, Direction::Left) == Some(false) // 西出入口
            || self.overpass_blocked(x, y + 1, Direction::Up) == Some(false) // 北入口
            || (!self.is_overpass_tile(x - 1, y)
                && self.overpass_blocked(x - 1, y + 1, Direction::Up) == Some(false))
            || self.overpass_blocked(x, y - 2, Direction::Down) == Some(false) // 南入口
            || (!self.is_overpass_tile(x - 1, y)
                && (self.overpass_blocked(x - 1, y - 2, Direction::Down) == Some(false)
                    || self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(false)))
            || (!self.is_overpass_tile(x + 1, y)
                && self.overpass_blocked(x + 1, y - 1, Direction::Down) == Some(false))
    }

    /// 高层から降りるタイミングか
    fn is_down_from_upper(&self, x: i64, y: i64, half: HalfPos) -> bool {
        // 立体交差タイルの上は帰す
        if self.is_overpass_tile(x, y) {
            return false;
        }
        // 南入り口タイルは帰す
        if self.overpass_blocked(x, y - 1, Direction::Down) == Some(false) {
            return false;
        }
        if matches!(half, HalfPos::UpperLeft | HalfPos::LowerLeft)
            && self.overpass_blocked(x - 1, y - 1, Direction::Down) == Some(false)
        {
            return false;
        }

        // 全周に立体交差タイルの入り口がない
        self.overpass_blocked(x + 1, y, Direction::Left) != Some(false) // 东
            && self.overpass_blocked(x - 1, y, Direction::Right) != Some(false) // 西
            && self.overpass_blocked(x, y + 1, Direction::Up) != Some(false) // 南
            && self.overpass_blocked(x - 1, y + 1, Direction::Up) != Some(false) // 南西
            && self.overpass_blocked(x, y - 2, Direction::Down) != Some(false) // ふたつ北
    }

    /// 随行キャラの升降更新
    ///
    /// 追迹移动は通常の通行判定を通らないため、升降だけ别口で行う。
    pub fn chase_level_update(&self, actor: &mut dyn OverpassActor) {
        if !self.config.overpass_enabled() {
            return;
        }
        let x = (actor.real_x() + 0.5).floor() as i64;
        let y = (actor.real_y() + 0.5).floor() as i64;
        let half = half_pos(actor.real_x(), actor.real_y());
        if actor.higher_level() {
            if self.is_down_from_upper(x, y, half) {
                actor.set_higher_level(false);
            }
        } else if self.is_up_to_higher(x, y, half) {
            actor.set_higher_level(true);
        }
    }

    /// 高层 [☆] タイルの通行设定による上书き判定
    ///
    /// [☆] かつ北位が立っていないタイルの通行不可 [・] は、重なった
    /// 他タイルによらず通行不可。どの [☆] タイルにも当たらなければ
    /// `None`（宿主の既定判定に委ねる）。
    pub fn upper_passage(&self, x: i64, y: i64, direction: Direction) -> Option<bool> {
        let bit: u16 = 1 << (direction.to_cardinal().numpad() / 2 - 1);
        for tile in self.map.all_tiles(x, y) {
            let flag = self.flags.get(tile);
            // [☆] タイルのみ判定するので他は无视
            if !flag.is_upper() {
                continue;
            }
            // 上通行不可 [・] は特殊设定用の位なので通行判定としては无视
            if flag.bits() & FLAG_NORTH_DIR != 0 {
                continue;
            }
            if flag.bits() & bit == bit {
                return Some(false);
            }
        }
        None
    }

    /// 描画 z 座标（高架上は 5、通常は 3）
    pub fn screen_z(&self, actor: &dyn OverpassActor) -> u8 {
        if actor.higher_level() { 5 } else { 3 }
    }
}

/// 追迹の移动方位
///
/// `sx`・`sy` は追う侧から见た对象との差分（自分 − 对象）。
/// 横差分优先、横が 0 のとき纵。差分なしは `None`。
pub fn follow_direction(sx: f64, sy: f64) -> Option<Direction> {
    let sign = |v: f64| {
        if v > 0.0 {
            1i64
        } else if v < 0.0 {
            -1
        } else {
            0
        }
    };
    let d = 5 - sign(sx) + if sx == 0.0 { sign(sy) * 3 } else { 0 };
    if d == 5 {
        None
    } else {
        Direction::from_numpad(d as u8)
    }
}
