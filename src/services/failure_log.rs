//! 失败记录服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力：记录失败的职位和没能自动回答的问题。

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 失败记录服务
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 记录一个失败的申请
    pub async fn record_failure(&self, job_index: usize, url: &str, reason: &str) -> Result<()> {
        debug!("写入失败记录: 职位 {} | {}", job_index, reason);
        self.append(&format!("职位 {} | {} | 失败原因: {}", job_index, url, reason))
            .await
    }

    /// 记录需要人工填写的问题
    pub async fn record_unanswered(&self, job_index: usize, url: &str, questions: &[&str]) -> Result<()> {
        if questions.is_empty() {
            return Ok(());
        }
        self.append(&format!(
            "职位 {} | {} | 未自动回答: {}",
            job_index,
            url,
            questions.join(" ; ")
        ))
        .await
    }

    async fn append(&self, message: &str) -> Result<()> {
        let line = format!(
            "[{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        );
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("无法打开失败记录文件: {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_are_appended() {
        let path = std::env::temp_dir().join(format!("wizard_apply_warn_{}.txt", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let log = FailureLog::new(&path);

        log.record_failure(1, "https://jobs.example/1", "no submit button")
            .await
            .unwrap();
        log.record_unanswered(2, "https://jobs.example/2", &["Expected salary", "Start date"])
            .await
            .unwrap();
        log.record_unanswered(3, "https://jobs.example/3", &[]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("职位 1 | https://jobs.example/1 | 失败原因: no submit button"));
        assert!(lines[1].contains("Expected salary ; Start date"));
    }
}
