//! # Direction 模块
//!
//! テンキー（数字小键盘）方位模型。
//!
//! 宿主引擎用小键盘数字 1–9（除 5）编码 8 方位：
//!
//! ```text
//! 7 8 9
//! 4 . 6
//! 1 2 3
//! ```
//!
//! 相对方位成对相加恒为 10（2↔8、4↔6、1↔9、3↔7）。

use serde::{Deserialize, Serialize};

/// 8 方位
///
/// 数值表现固定为テンキー编码，用于与宿主引擎及地图资产互换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// 左下（1）
    DownLeft,
    /// 下（2）
    Down,
    /// 右下（3）
    DownRight,
    /// 左（4）
    Left,
    /// 右（6）
    Right,
    /// 左上（7）
    UpLeft,
    /// 上（8）
    Up,
    /// 右上（9）
    UpRight,
}

impl Direction {
    /// 全方位（テンキー顺）
    pub const ALL: [Direction; 8] = [
        Self::DownLeft,
        Self::Down,
        Self::DownRight,
        Self::Left,
        Self::Right,
        Self::UpLeft,
        Self::Up,
        Self::UpRight,
    ];

    /// 从テンキー数字构造（1–9，5 与范围外返回 None）
    pub fn from_numpad(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::DownLeft),
            2 => Some(Self::Down),
            3 => Some(Self::DownRight),
            4 => Some(Self::Left),
            6 => Some(Self::Right),
            7 => Some(Self::UpLeft),
            8 => Some(Self::Up),
            9 => Some(Self::UpRight),
            _ => None,
        }
    }

    /// テンキー数字
    pub fn numpad(self) -> u8 {
        match self {
            Self::DownLeft => 1,
            Self::Down => 2,
            Self::DownRight => 3,
            Self::Left => 4,
            Self::Right => 6,
            Self::UpLeft => 7,
            Self::Up => 8,
            Self::UpRight => 9,
        }
    }

    /// 反方向（テンキー值之和恒为 10）
    pub fn opposite(self) -> Self {
        match self {
            Self::DownLeft => Self::UpRight,
            Self::Down => Self::Up,
            Self::DownRight => Self::UpLeft,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::UpLeft => Self::DownRight,
            Self::Up => Self::Down,
            Self::UpRight => Self::DownLeft,
        }
    }

    /// 是否四正方位
    pub fn is_cardinal(self) -> bool {
        matches!(self, Self::Down | Self::Left | Self::Right | Self::Up)
    }

    /// 投影到四正方位
    ///
    /// 斜方位按纵向优先折叠：1,3 → 2、7,9 → 8。四正方位原样返回。
    pub fn to_cardinal(self) -> Self {
        match self {
            Self::DownLeft | Self::DownRight => Self::Down,
            Self::UpLeft | Self::UpRight => Self::Up,
            d => d,
        }
    }

    /// 网格位移向量（x 向右为正，y 向下为正）
    pub fn delta(self) -> (i64, i64) {
        match self {
            Self::DownLeft => (-1, 1),
            Self::Down => (0, 1),
            Self::DownRight => (1, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::UpLeft => (-1, -1),
            Self::Up => (0, -1),
            Self::UpRight => (1, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numpad_round_trip() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_numpad(d.numpad()), Some(d));
        }
        assert_eq!(Direction::from_numpad(5), None);
        assert_eq!(Direction::from_numpad(0), None);
        assert_eq!(Direction::from_numpad(10), None);
    }

    #[test]
    fn test_opposite_sums_to_ten() {
        // テンキー相对方位之和恒为 10
        for d in Direction::ALL {
            assert_eq!(d.numpad() + d.opposite().numpad(), 10);
        }
    }

    #[test]
    fn test_cardinal_projection() {
        for d in Direction::ALL {
            let c = d.to_cardinal();
            assert!(matches!(c.numpad(), 2 | 4 | 6 | 8));
            if d.is_cardinal() {
                assert_eq!(c, d);
            }
        }
        // 斜方位纵向优先
        assert_eq!(Direction::DownLeft.to_cardinal(), Direction::Down);
        assert_eq!(Direction::DownRight.to_cardinal(), Direction::Down);
        assert_eq!(Direction::UpLeft.to_cardinal(), Direction::Up);
        assert_eq!(Direction::UpRight.to_cardinal(), Direction::Up);
    }

    #[test]
    fn test_delta() {
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
        assert_eq!(Direction::UpRight.delta(), (1, -1));
    }
}
