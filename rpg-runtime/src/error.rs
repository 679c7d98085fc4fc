//! # Error 模块
//!
//! 定义 rpg-runtime 中使用的错误类型。
//!
//! ## 传播策略
//!
//! - 解析类错误（[`ResolveError`]、[`MacroError`]）不在内部重试或吞掉，
//!   一律向上传播到指令分发边界，由宿主作为脚本作者可见的诊断信息呈现。
//! - 逐帧路径（通行判定、渲染层分类）永远不返回错误：
//!   数据异常时退化为"完全不可通行"，不中断帧循环。

use thiserror::Error;

/// 取值解析错误
///
/// 字符串参数在变量替换后仍无法解析为目标类型时产生。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// 数值解析失败（严格解析，替换后仍非数值）
    #[error("指定的值 [{literal}] 不是数值")]
    ValueFormat { literal: String },

    /// 变量名未找到
    #[error("找不到变量 '{name}'")]
    VariableNotFound { name: String },

    /// 开关名未找到
    #[error("找不到开关 '{name}'")]
    SwitchNotFound { name: String },

    /// 事件未找到（编号越界或名称无匹配）
    #[error("指定的事件 [{name}] 不存在")]
    EventNotFound { name: String },

    /// 地图未找到
    #[error("指定的地图 [{name}] 不存在")]
    MapNotFound { name: String },
}

/// 移动宏编译错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MacroError {
    /// 末尾的操作码片段缺少参数
    #[error("第 {position} 个字符起：操作码 '{fragment}' 缺少参数")]
    MissingArgument { position: usize, fragment: String },

    /// 未知操作码（仅在严格模式下报告，兼容模式静默跳过）
    #[error("第 {position} 个字符起：未知操作码 '{fragment}'")]
    UnknownOpcode { position: usize, fragment: String },

    /// 参数无法解析为数值
    #[error("操作码 '{fragment}' 的参数 '{argument}' 无效")]
    BadArgument { fragment: String, argument: String },
}

/// rpg-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// 取值解析错误
    #[error("取值解析错误: {0}")]
    Resolve(#[from] ResolveError),

    /// 移动宏编译错误
    #[error("移动宏编译错误: {0}")]
    Macro(#[from] MacroError),
}

/// Result 类型别名
pub type CoreResult<T> = Result<T, CoreError>;
