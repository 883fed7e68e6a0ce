//! 提交控制服务 - 业务能力层
//!
//! 每次调用只点一个按钮，优先级 Next > Review > Submit。
//! 点击后的页面状态由驱动返回的结果文字判断，而不是由点的是哪个按钮推断。

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::infrastructure::{with_deadline, Driver, PageStateProvider};
use crate::models::{ButtonInfo, DriverAction, OutcomeStatus, PageSnapshot, SubmitOutcome};

/// 识别出的提交类按钮
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub class: SubmitOutcome,
    /// 用于点击的标识（按钮文字，没有文字时为 aria-label）
    pub label: String,
    pub aria_label: Option<String>,
}

/// 提交控制服务
pub struct SubmissionController {
    call_timeout: Duration,
}

impl SubmissionController {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// 读取当前页面，点击优先级最高的提交类按钮
    pub async fn submit(
        &self,
        provider: &dyn PageStateProvider,
        driver: &dyn Driver,
    ) -> SubmitOutcome {
        let snapshot = match with_deadline("snapshot", self.call_timeout, provider.snapshot()).await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("❌ 读取提交按钮失败: {}", e);
                return SubmitOutcome::Error;
            }
        };

        let Some(control) = choose_control(&snapshot) else {
            warn!(
                "❌ 未找到 Next / Review / Submit 按钮，可见按钮: {:?}",
                snapshot.visible_button_texts()
            );
            return SubmitOutcome::Error;
        };

        info!("👆 点击 {} 按钮: {}", control.class, control.label);
        let action = DriverAction::click_button(&control.label);
        let outcome = match with_deadline("click", self.call_timeout, driver.dispatch(&action)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("❌ 点击 '{}' 失败: {}", control.label, e);
                return SubmitOutcome::Error;
            }
        };

        let result = classify_click_outcome(&outcome, &control);
        debug!("点击结果: {} -> {}", outcome, result);
        result
    }
}

/// 在可见按钮中按优先级选出一个
pub fn choose_control(snapshot: &PageSnapshot) -> Option<SubmitControl> {
    let visible: Vec<&ButtonInfo> = snapshot
        .buttons
        .iter()
        .filter(|b| b.visible && b.enabled)
        .collect();

    [SubmitOutcome::Next, SubmitOutcome::Review, SubmitOutcome::Submit]
        .into_iter()
        .find_map(|class| {
            visible
                .iter()
                .find(|b| button_class(b) == Some(class))
                .and_then(|b| {
                    click_label(b).map(|label| SubmitControl {
                        class,
                        label,
                        aria_label: b.aria_label.clone(),
                    })
                })
        })
}

fn click_label(button: &ButtonInfo) -> Option<String> {
    let text = button.text.trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }
    button
        .aria_label
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

/// 按钮属于哪一类提交控件
fn button_class(button: &ButtonInfo) -> Option<SubmitOutcome> {
    std::iter::once(button.text.as_str())
        .chain(button.aria_label.as_deref())
        .find_map(label_class)
}

fn label_class(label: &str) -> Option<SubmitOutcome> {
    let label = label.trim().to_lowercase();
    let is = |word: &str| label == word || label.starts_with(&format!("{} ", word));

    if is("next") || label.contains("continue to next step") {
        Some(SubmitOutcome::Next)
    } else if is("review") || label.contains("review your application") {
        Some(SubmitOutcome::Review)
    } else if is("submit") || label.contains("submit application") {
        Some(SubmitOutcome::Submit)
    } else {
        None
    }
}

/// 解析驱动返回的点击结果
///
/// error 优先；success 时先从结果文字里找按钮类别关键字，
/// 找不到时若回显的是所点按钮的文字或 aria-label，沿用该按钮的类别。
pub fn classify_click_outcome(outcome: &str, control: &SubmitControl) -> SubmitOutcome {
    match OutcomeStatus::classify(outcome) {
        OutcomeStatus::Error => SubmitOutcome::Error,
        OutcomeStatus::Unclear => SubmitOutcome::Unknown,
        OutcomeStatus::Success => {
            let text = outcome.to_lowercase();
            if text.contains("next") {
                SubmitOutcome::Next
            } else if text.contains("review") {
                SubmitOutcome::Review
            } else if text.contains("submit") {
                SubmitOutcome::Submit
            } else if echoes_control(&text, control) {
                control.class
            } else {
                SubmitOutcome::Unknown
            }
        }
    }
}

fn echoes_control(outcome: &str, control: &SubmitControl) -> bool {
    std::iter::once(control.label.as_str())
        .chain(control.aria_label.as_deref())
        .map(|l| l.trim().to_lowercase())
        .any(|l| !l.is_empty() && outcome.contains(&l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn page(buttons: &[&str]) -> PageSnapshot {
        PageSnapshot {
            buttons: buttons.iter().map(|t| ButtonInfo::new(*t)).collect(),
            ..PageSnapshot::default()
        }
    }

    struct OnePage(PageSnapshot);

    #[async_trait]
    impl PageStateProvider for OnePage {
        async fn snapshot(&self) -> anyhow::Result<PageSnapshot> {
            Ok(self.0.clone())
        }
    }

    /// 记录点击并回显按钮文字
    #[derive(Default)]
    struct EchoDriver {
        clicks: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Driver for EchoDriver {
        async fn dispatch(&self, action: &DriverAction) -> anyhow::Result<String> {
            let DriverAction::Click { identifier, .. } = action else {
                anyhow::bail!("unexpected action {:?}", action);
            };
            self.clicks.lock().unwrap().push(identifier.clone());
            Ok(format!("Successfully clicked button: {}", identifier))
        }
    }

    #[test]
    fn test_priority_is_next_then_review_then_submit() {
        let choose = |buttons: &[&str]| choose_control(&page(buttons)).map(|c| c.class);
        assert_eq!(choose(&["Submit application", "Review", "Next"]), Some(SubmitOutcome::Next));
        assert_eq!(choose(&["Submit application", "Review"]), Some(SubmitOutcome::Review));
        assert_eq!(choose(&["Back", "Submit"]), Some(SubmitOutcome::Submit));
        assert_eq!(choose(&["Back", "Dismiss", "Nextdoor"]), None);
    }

    #[test]
    fn test_hidden_buttons_and_aria_labels() {
        let mut snapshot = page(&["Next"]);
        snapshot.buttons[0].visible = false;
        snapshot.buttons.push(ButtonInfo {
            text: String::new(),
            aria_label: Some("Submit application".into()),
            visible: true,
            enabled: true,
        });

        let control = choose_control(&snapshot).unwrap();
        assert_eq!(control.class, SubmitOutcome::Submit);
        assert_eq!(control.label, "Submit application");
    }

    fn control(class: SubmitOutcome, label: &str) -> SubmitControl {
        SubmitControl {
            class,
            label: label.to_string(),
            aria_label: None,
        }
    }

    #[test]
    fn test_click_outcome_classification() {
        let next = control(SubmitOutcome::Next, "Next");
        assert_eq!(
            classify_click_outcome("Successfully clicked button: Next", &next),
            SubmitOutcome::Next
        );
        assert_eq!(
            classify_click_outcome(
                "Successfully clicked button: Submit application",
                &control(SubmitOutcome::Submit, "Submit application")
            ),
            SubmitOutcome::Submit
        );
        assert_eq!(
            classify_click_outcome("Successfully clicked button: Done", &next),
            SubmitOutcome::Unknown
        );
        assert_eq!(
            classify_click_outcome("Error: Could not find button with identifier 'Next'", &next),
            SubmitOutcome::Error
        );
        assert_eq!(classify_click_outcome("clicked", &next), SubmitOutcome::Unknown);
    }

    #[tokio::test]
    async fn test_button_classified_by_aria_label_keeps_its_class() {
        let provider = OnePage(PageSnapshot {
            buttons: vec![ButtonInfo {
                text: "Continue".into(),
                aria_label: Some("Continue to next step".into()),
                visible: true,
                enabled: true,
            }],
            ..PageSnapshot::default()
        });
        let driver = EchoDriver::default();
        let controller = SubmissionController::new(Duration::from_secs(1));

        assert_eq!(controller.submit(&provider, &driver).await, SubmitOutcome::Next);
        assert_eq!(*driver.clicks.lock().unwrap(), vec!["Continue".to_string()]);
    }

    #[tokio::test]
    async fn test_exactly_one_click_per_call() {
        let provider = OnePage(page(&["Review", "Next", "Submit"]));
        let driver = EchoDriver::default();
        let controller = SubmissionController::new(Duration::from_secs(1));

        assert_eq!(controller.submit(&provider, &driver).await, SubmitOutcome::Next);
        assert_eq!(*driver.clicks.lock().unwrap(), vec!["Next".to_string()]);
    }

    #[tokio::test]
    async fn test_no_candidates_means_error_without_click() {
        let provider = OnePage(page(&["Cancel"]));
        let driver = EchoDriver::default();
        let controller = SubmissionController::new(Duration::from_secs(1));

        assert_eq!(controller.submit(&provider, &driver).await, SubmitOutcome::Error);
        assert!(driver.clicks.lock().unwrap().is_empty());
    }
}
