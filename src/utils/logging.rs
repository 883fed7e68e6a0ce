//! 日志工具模块
//!
//! 提供 tracing 初始化以及日志格式化和输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 初始化 tracing
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 verbose 选择 debug / info。
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}

/// 初始化日志文件
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n职位申请日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(model: &str, headless: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动填写职位申请");
    info!("🤖 模型: {}", model);
    info!("🌐 浏览器模式: {}", if headless { "无头" } else { "连接已有浏览器" });
    info!("{}", "=".repeat(60));
}

/// 记录职位加载信息
pub fn log_jobs_loaded(total: usize) {
    info!("✓ 找到 {} 个待申请的职位", total);
    info!("💡 将逐个处理，每个申请结束后再开始下一个\n");
}

/// 记录单个职位开始
pub fn log_job_start(index: usize, total: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📦 开始处理第 {}/{} 个职位", index, total);
    info!("🔗 {}", url);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(submitted: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交: {}/{}", submitted, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
