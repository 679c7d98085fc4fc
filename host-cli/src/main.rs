//! # host-cli - 命令行宿主
//!
//! `rpg-runtime` 的最小嵌入示例兼开发辅助工具。
//! 编译移动宏、执行タイルセット旗标改写，结果以 JSON 输出。
//!
//! ## 命令
//!
//! - `compile`: 移动宏 → 路线指令列表
//! - `transform`: 生旗标表（JSON 数组）→ 改写済み旗标表

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use rpg_runtime::{CompileConfig, MacroCompiler, MapConfig, TilesetFlags};

#[derive(Parser)]
#[command(name = "host-cli", about = "rpg-runtime 命令行宿主", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 编译移动宏并输出路线指令（JSON）
    Compile {
        /// 宏字符串（例: "↑4→2z30j1,-1"）
        source: String,

        /// 对象キャラの移动速度（1〜6）
        #[arg(long, default_value_t = 4)]
        speed: u8,

        /// 未知操作码を报错にする（规定は静默跳过）
        #[arg(long)]
        strict: bool,

        /// 循环执行旗标
        #[arg(long)]
        repeat: bool,

        /// 受阻时跳过旗标
        #[arg(long)]
        skippable: bool,
    },

    /// 生旗标表を改写して输出（JSON）
    Transform {
        /// 旗标表ファイル（JSON の数値数组）
        input: PathBuf,

        /// 地图配置ファイル（JSON、省略时は规定値）
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            source,
            speed,
            strict,
            repeat,
            skippable,
        } => {
            let compiler = MacroCompiler::with_config(CompileConfig {
                strict_opcodes: strict,
            });
            let route = compiler
                .compile(&source, speed)
                .with_context(|| format!("宏 '{source}' 编译失败"))?
                .with_repeat(repeat)
                .with_skippable(skippable);
            println!("{}", serde_json::to_string_pretty(&route)?);
        }

        Commands::Transform { input, config } => {
            let raw: Vec<u16> = serde_json::from_str(
                &std::fs::read_to_string(&input)
                    .with_context(|| format!("无法读取 {}", input.display()))?,
            )
            .context("旗标表必须是 JSON 数值数组")?;

            let map_config = match config {
                Some(path) => serde_json::from_str(
                    &std::fs::read_to_string(&path)
                        .with_context(|| format!("无法读取 {}", path.display()))?,
                )
                .context("配置文件格式无效")?,
                None => MapConfig::default(),
            };

            let flags = TilesetFlags::from_raw(raw, &map_config);
            println!("{}", serde_json::to_string(&flags)?);
        }
    }

    Ok(())
}
