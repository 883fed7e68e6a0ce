use crate::models::profile::{JobList, Profile};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载候选人资料
///
/// 文件不存在时返回 `None`，由调用方决定是否走首次收集流程。
pub async fn load_profile(path: &Path) -> Result<Option<Profile>> {
    if !path.exists() {
        tracing::debug!("资料文件不存在: {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取资料文件: {}", path.display()))?;

    let profile: Profile = toml::from_str(&content)
        .with_context(|| format!("无法解析资料文件: {}", path.display()))?;

    tracing::info!("成功加载资料: {} 个字段", profile.len());
    Ok(Some(profile))
}

/// 保存候选人资料到 TOML 文件
pub async fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    let content = toml::to_string_pretty(profile).context("无法序列化资料")?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入资料文件: {}", path.display()))?;
    tracing::info!("✓ 资料已保存至: {}", path.display());
    Ok(())
}

/// 从 TOML 文件加载职位列表
pub async fn load_job_list(path: &Path) -> Result<JobList> {
    if !path.exists() {
        anyhow::bail!("职位列表文件不存在: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取职位列表: {}", path.display()))?;

    let mut jobs: JobList = toml::from_str(&content)
        .with_context(|| format!("无法解析职位列表: {}", path.display()))?;

    // 去掉空行与重复链接，保持原有顺序
    let mut seen = std::collections::HashSet::new();
    jobs.urls.retain(|url| {
        let url = url.trim();
        !url.is_empty() && seen.insert(url.to_string())
    });

    tracing::info!("成功加载 {} 个职位链接", jobs.urls.len());
    Ok(jobs)
}
