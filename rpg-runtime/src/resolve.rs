//! # Resolve 模块
//!
//! 把脚本命令里的字符串参数解析为具体的数值、布尔、方位或引用。
//!
//! ## 设计原则
//!
//! - 外部命名状态（变量、开关、事件、地图）只通过 [`GameStateView`]
//!   这一个窄接口访问，核心不知道宿主的存储方式
//! - 手写字符串扫描，不引入 regex 依赖
//! - 数值解析是**严格**的（失败即 [`ResolveError::ValueFormat`]），
//!   布尔解析是**宽容**的（永不失败）

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::ResolveError;

/// 变量值
///
/// 宿主变量槽可持有的值。替换进参数字符串时按显示形式展开。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    Str(String),
    /// 布尔值
    Bool(bool),
}

impl VarValue {
    /// 替换用的字符串形式
    fn to_token(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// 事件引用
///
/// 扩展事件 ID 的结构化表现：
/// 0 = 本事件、-1 = 玩家、-2〜-4 = 随行成员 0〜2、1〜 = 地图事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRef {
    /// 当前事件自身
    ThisEvent,
    /// 玩家
    Player,
    /// 随行成员（0〜2）
    Follower(u8),
    /// 地图事件（ID ≥ 1）
    MapEvent(u32),
}

impl EventRef {
    /// 从扩展事件 ID 构造
    pub fn from_extended_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::ThisEvent),
            -1 => Some(Self::Player),
            -4..=-2 => Some(Self::Follower((-2 - id) as u8)),
            1.. => Some(Self::MapEvent(id as u32)),
            _ => None,
        }
    }

    /// 扩展事件 ID
    pub fn extended_id(self) -> i32 {
        match self {
            Self::ThisEvent => 0,
            Self::Player => -1,
            Self::Follower(n) => -2 - n as i32,
            Self::MapEvent(id) => id as i32,
        }
    }
}

/// 宿主命名状态的只读视图
///
/// 核心与宿主存档数据之间的**唯一通信方式**（读方向）。
pub trait GameStateView {
    /// 取变量值
    fn variable(&self, id: u32) -> VarValue;
    /// 变量名 → 变量 ID
    fn variable_id_by_name(&self, name: &str) -> Option<u32>;
    /// 取开关值
    fn switch(&self, id: u32) -> bool;
    /// 开关名 → 开关 ID
    fn switch_id_by_name(&self, name: &str) -> Option<u32>;
    /// 事件显示名 → 事件 ID（对当前地图事件表线性扫描）
    fn event_id_by_name(&self, name: &str) -> Option<u32>;
    /// 地图名 → 地图 ID
    fn map_id_by_name(&self, name: &str) -> Option<u32>;
    /// 当前地图 ID
    fn current_map_id(&self) -> u32;
}

/// 参数解析器
///
/// 持有宿主状态视图，提供各类字符串参数的解析入口。
pub struct Resolver<'a> {
    world: &'a dyn GameStateView,
}

impl<'a> Resolver<'a> {
    /// 创建解析器
    pub fn new(world: &'a dyn GameStateView) -> Self {
        Self { world }
    }

    /// 变量替换
    ///
    /// `V[n]` / `V[名前]`（不区分大小写）整体替换为变量当前值；
    /// 空字符串视为 `"0"`；其他输入原样返回。
    pub fn substitute(&self, token: &str) -> Result<String, ResolveError> {
        if token.is_empty() {
            return Ok("0".to_string());
        }

        let inner = match variable_ref_inner(token) {
            Some(inner) => inner,
            None => return Ok(token.to_string()),
        };

        // 先按编号、再按名称查找
        if let Ok(id) = inner.parse::<u32>() {
            return Ok(self.world.variable(id).to_token());
        }
        match self.world.variable_id_by_name(inner) {
            Some(id) => Ok(self.world.variable(id).to_token()),
            None => Err(ResolveError::VariableNotFound {
                name: inner.to_string(),
            }),
        }
    }

    /// 严格整数解析（含变量替换）
    pub fn int_strict(&self, token: &str) -> Result<i64, ResolveError> {
        let value = self.substitute(token)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|_| ResolveError::ValueFormat {
                literal: token.to_string(),
            })
    }

    /// 严格浮点数解析（含变量替换）
    pub fn float_strict(&self, token: &str) -> Result<f64, ResolveError> {
        let value = self.substitute(token)?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| ResolveError::ValueFormat {
                literal: token.to_string(),
            })
    }

    /// 宽容布尔解析
    ///
    /// `true` / `on`（不区分大小写）为真，其余一律为假。不会失败。
    pub fn boolean(&self, token: &str) -> Result<bool, ResolveError> {
        let value = self.substitute(token)?;
        let lower = value.trim().to_lowercase();
        Ok(lower == "true" || lower == "on")
    }

    /// 方位解析
    ///
    /// 接受テンキー数字与各方位的同义词（英语单词、缩写、方角、
    /// 矢印记号、日本語）。无法识别时返回 `Ok(None)`（"无方位"，
    /// 区别于解析错误）。
    pub fn direction(&self, token: &str) -> Result<Option<Direction>, ResolveError> {
        let value = self.substitute(token)?;
        let value = value.trim();

        if let Ok(n) = value.parse::<i64>() {
            return Ok(u8::try_from(n).ok().and_then(Direction::from_numpad));
        }
        Ok(direction_synonym(value))
    }

    /// 事件引用解析
    ///
    /// 预约语（`this`/`self`/`player`/`follower0..2`）→ 显示名扫描 →
    /// 数值，均无匹配时报 [`ResolveError::EventNotFound`]。
    pub fn event(&self, token: &str) -> Result<EventRef, ResolveError> {
        let value = self.substitute(token)?;

        match value.to_lowercase().as_str() {
            "this" | "self" => return Ok(EventRef::ThisEvent),
            "player" => return Ok(EventRef::Player),
            "follower0" => return Ok(EventRef::Follower(0)),
            "follower1" => return Ok(EventRef::Follower(1)),
            "follower2" => return Ok(EventRef::Follower(2)),
            _ => {}
        }

        // 显示名优先于数值解释（与源脚本一致）
        if let Some(id) = self.world.event_id_by_name(&value) {
            return Ok(EventRef::MapEvent(id));
        }
        if let Ok(n) = value.parse::<i32>() {
            if let Some(event) = EventRef::from_extended_id(n) {
                return Ok(event);
            }
        }
        Err(ResolveError::EventNotFound { name: value })
    }

    /// 地图 ID 解析（编号、名称或 `this`/`self`）
    pub fn map_id(&self, token: &str) -> Result<u32, ResolveError> {
        let value = self.substitute(token)?;

        let lower = value.to_lowercase();
        if lower == "this" || lower == "self" {
            return Ok(self.world.current_map_id());
        }
        if let Some(id) = self.world.map_id_by_name(&value) {
            return Ok(id);
        }
        value
            .parse::<u32>()
            .map_err(|_| ResolveError::MapNotFound { name: value })
    }

    /// 变量 ID 解析（名称优先于编号）
    pub fn variable_id(&self, token: &str) -> Result<u32, ResolveError> {
        let value = self.substitute(token)?;
        if let Some(id) = self.world.variable_id_by_name(&value) {
            return Ok(id);
        }
        value
            .parse::<u32>()
            .map_err(|_| ResolveError::VariableNotFound { name: value })
    }

    /// 开关 ID 解析（名称优先于编号）
    pub fn switch_id(&self, token: &str) -> Result<u32, ResolveError> {
        let value = self.substitute(token)?;
        if let Some(id) = self.world.switch_id_by_name(&value) {
            return Ok(id);
        }
        value
            .parse::<u32>()
            .map_err(|_| ResolveError::SwitchNotFound { name: value })
    }
}

/// 取出 `V[...]` 形式的内部文本（不区分大小写），否则 None
fn variable_ref_inner(token: &str) -> Option<&str> {
    let mut chars = token.char_indices();
    let (_, first) = chars.next()?;
    if first != 'v' && first != 'V' {
        return None;
    }
    let (second_pos, second) = chars.next()?;
    if second != '[' {
        return None;
    }
    let rest = &token[second_pos + 1..];
    let inner = rest.strip_suffix(']')?;
    if inner.is_empty() { None } else { Some(inner) }
}

/// 方位同义词表（全字匹配，不区分大小写）
fn direction_synonym(value: &str) -> Option<Direction> {
    const DOWN_LEFT: &[&str] = &["downleft", "dl", "southwest", "sw", "↙", "↙︎", "左下"];
    const DOWN: &[&str] = &["down", "d", "south", "s", "↓", "下"];
    const DOWN_RIGHT: &[&str] = &["downright", "dr", "southeast", "se", "↘", "↘︎", "右下"];
    const LEFT: &[&str] = &["left", "l", "west", "w", "←", "左"];
    const RIGHT: &[&str] = &["right", "r", "east", "e", "→", "右"];
    const UP_LEFT: &[&str] = &["upleft", "ul", "northwest", "nw", "↖", "↖︎", "左上"];
    const UP: &[&str] = &["up", "u", "north", "n", "↑", "上"];
    const UP_RIGHT: &[&str] = &["upright", "ur", "northeast", "ne", "↗", "↗︎", "右上"];

    let lower = value.to_lowercase();
    let table: [(&[&str], Direction); 8] = [
        (DOWN_LEFT, Direction::DownLeft),
        (DOWN, Direction::Down),
        (DOWN_RIGHT, Direction::DownRight),
        (LEFT, Direction::Left),
        (RIGHT, Direction::Right),
        (UP_LEFT, Direction::UpLeft),
        (UP, Direction::Up),
        (UP_RIGHT, Direction::UpRight),
    ];
    for (synonyms, direction) in table {
        if synonyms.contains(&lower.as_str()) {
            return Some(direction);
        }
    }
    None
}
