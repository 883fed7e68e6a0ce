//! 候选人资料收集
//!
//! 首次运行或显式刷新时逐项询问，回车保留原值。

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::models::{Profile, PROFILE_QUESTIONS};

/// 从控制台收集资料
pub async fn collect_profile(existing: Option<&Profile>) -> Result<Profile> {
    collect_from(BufReader::new(tokio::io::stdin()), existing).await
}

/// 从任意输入流收集资料
///
/// 输入流提前结束时，剩余字段保留原值（没有原值则不写入）。
pub async fn collect_from<R>(reader: R, existing: Option<&Profile>) -> Result<Profile>
where
    R: AsyncBufRead + Unpin,
{
    let mut profile = existing.cloned().unwrap_or_default();
    let mut lines = reader.lines();

    info!("📋 请填写求职资料（直接回车保留当前值）");
    for (field, question) in PROFILE_QUESTIONS {
        match profile.get(field) {
            Some(current) => info!("❓ {} [{}]", question, current),
            None => info!("❓ {}", question),
        }

        let Some(line) = lines.next_line().await? else {
            warn!("输入已结束，其余资料项保持不变");
            break;
        };
        let answer = line.trim();
        if !answer.is_empty() {
            profile.insert(*field, answer);
        }
    }

    let missing = profile.missing_fields();
    if !missing.is_empty() {
        warn!("⚠️ 以下资料项仍为空: {}", missing.join(", "));
    }
    Ok(profile)
}
