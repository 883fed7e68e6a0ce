//! 单个职位处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **打开职位**：导航到职位链接
//! 2. **安全验证**：遇到验证页面时暂停等待人工处理
//! 3. **进入向导**：点击入口按钮（默认 "Easy Apply"）
//! 4. **流程调度**：把向导交给 `ApplicationFlow`
//! 5. **失败记录**：写入 warn.txt

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::infrastructure::with_deadline;
use crate::models::{ApplicationOutcome, ClickTarget, DriverAction, OutcomeStatus, PageSnapshot, Profile};
use crate::services::{FailureLog, GateDecision, HumanRequest};
use crate::workflow::{wait_for_abort, ApplicationCtx, ApplicationFlow, Collaborators, FlowSettings};

/// 处理一个职位所需的共享资源
pub struct JobEnv<'a> {
    pub collaborators: &'a Collaborators,
    pub settings: &'a FlowSettings,
    pub entry_button_label: &'a str,
    pub failure_log: &'a FailureLog,
    pub abort: watch::Receiver<bool>,
}

/// 处理单个职位
///
/// 任何失败都只影响当前职位，返回 `ApplicationOutcome::Failed`。
pub async fn process_job(
    env: JobEnv<'_>,
    ctx: &ApplicationCtx,
    profile: &Profile,
    resume_text: &str,
) -> ApplicationOutcome {
    let JobEnv {
        collaborators,
        settings,
        entry_button_label,
        failure_log,
        mut abort,
    } = env;

    let outcome = match open_wizard(collaborators, settings, entry_button_label, &mut abort, ctx).await
    {
        Ok(()) => {
            let mut flow = ApplicationFlow::new(collaborators.clone(), settings.clone(), abort);
            let report = flow.run(ctx, profile, resume_text).await;

            if !report.unanswered.is_empty() {
                let questions: Vec<&str> = report.unanswered.iter().map(String::as_str).collect();
                if let Err(e) = failure_log
                    .record_unanswered(ctx.job_index, &ctx.url, &questions)
                    .await
                {
                    warn!("{} 写入 warn.txt 失败: {}", ctx, e);
                }
            }
            report.outcome
        }
        Err(reason) => {
            error!("{} ❌ {}", ctx, reason);
            ApplicationOutcome::Failed { reason }
        }
    };

    if let ApplicationOutcome::Failed { reason } = &outcome {
        if let Err(e) = failure_log
            .record_failure(ctx.job_index, &ctx.url, reason)
            .await
        {
            warn!("{} 写入 warn.txt 失败: {}", ctx, e);
        }
    }
    outcome
}

/// 打开职位页面并点击入口按钮
async fn open_wizard(
    collaborators: &Collaborators,
    settings: &FlowSettings,
    entry_button_label: &str,
    abort: &mut watch::Receiver<bool>,
    ctx: &ApplicationCtx,
) -> Result<(), String> {
    info!("{} 🌐 打开职位页面...", ctx);
    dispatch(
        collaborators,
        settings,
        DriverAction::Navigate {
            url: ctx.url.clone(),
        },
    )
    .await?;
    sleep(settings.settle).await;

    let mut snapshot = read_snapshot(collaborators, settings).await?;

    if snapshot.is_verification_page() {
        warn!("{} 🛡️ 检测到安全验证页面", ctx);
        let request = HumanRequest::verification(&snapshot.url);
        let decision = tokio::select! {
            decision = collaborators.gate.confirm(&request) => decision,
            _ = wait_for_abort(abort) => GateDecision::Abort,
        };
        if decision == GateDecision::Abort {
            return Err("安全验证未完成，已中止".to_string());
        }
        snapshot = read_snapshot(collaborators, settings).await?;
    }

    let Some(entry) = find_entry_control(&snapshot, entry_button_label) else {
        return Err(format!("未找到入口按钮 '{}'", entry_button_label));
    };
    info!("{} 👆 点击入口: {}", ctx, entry.target_description());
    dispatch(collaborators, settings, entry).await?;
    sleep(settings.settle).await;
    Ok(())
}

/// 入口控件：先找按钮，找不到再找文字匹配的链接
fn find_entry_control(snapshot: &PageSnapshot, entry_label: &str) -> Option<DriverAction> {
    if let Some(label) = find_entry_button(snapshot, entry_label) {
        return Some(DriverAction::click_button(label));
    }
    let wanted = entry_label.trim().to_lowercase();
    snapshot
        .links
        .iter()
        .map(|l| l.text.trim())
        .find(|text| !text.is_empty() && text.to_lowercase().contains(&wanted))
        .map(|text| DriverAction::Click {
            target: ClickTarget::Link,
            identifier: text.to_string(),
        })
}

/// 可见按钮中文字包含入口文字的第一个
fn find_entry_button(snapshot: &PageSnapshot, entry_label: &str) -> Option<String> {
    let wanted = entry_label.trim().to_lowercase();
    snapshot
        .buttons
        .iter()
        .filter(|b| b.visible && b.enabled)
        .find(|b| {
            b.text.to_lowercase().contains(&wanted)
                || b
                    .aria_label
                    .as_deref()
                    .is_some_and(|a| a.to_lowercase().contains(&wanted))
        })
        .map(|b| {
            if b.text.trim().is_empty() {
                b.aria_label.clone().unwrap_or_default()
            } else {
                b.text.trim().to_string()
            }
        })
}

async fn dispatch(
    collaborators: &Collaborators,
    settings: &FlowSettings,
    action: DriverAction,
) -> Result<(), String> {
    let outcome = with_deadline(
        action.tag(),
        settings.call_timeout,
        collaborators.driver.dispatch(&action),
    )
    .await
    .map_err(|e| format!("{} 失败: {}", action.target_description(), e))?;

    match OutcomeStatus::classify(&outcome) {
        OutcomeStatus::Error => Err(outcome),
        _ => Ok(()),
    }
}

async fn read_snapshot(
    collaborators: &Collaborators,
    settings: &FlowSettings,
) -> Result<PageSnapshot, String> {
    with_deadline(
        "snapshot",
        settings.call_timeout,
        collaborators.provider.snapshot(),
    )
    .await
    .map_err(|e| format!("无法读取职位页面: {}", e))
}
