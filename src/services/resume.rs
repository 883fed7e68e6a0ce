//! 简历读取
//!
//! 支持 PDF 和纯文本（txt / md）；PDF 用 pdf-extract 抽取文字。

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::FileError;

/// 读取简历全文
pub async fn load_resume_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .context("PDF 解析任务异常退出")?
            .with_context(|| format!("无法解析 PDF 简历: {}", path.display()))?
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取简历: {}", path.display()))?
    };

    let text = normalize_whitespace(&text);
    debug!("简历前 80 字: {}", text.chars().take(80).collect::<String>());
    info!("✓ 简历已加载 ({} 字符)", text.chars().count());
    Ok(text)
}

/// 合并多余空白，保留段落分隔
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
