//! 驱动动作
//!
//! 有限的动作集合，用枚举表达，驱动按变体分发。

use crate::models::question::QuestionKind;

/// 点击目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Button,
    Link,
}

impl ClickTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ClickTarget::Button => "button",
            ClickTarget::Link => "link",
        }
    }
}

/// 驱动可执行的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverAction {
    Click {
        target: ClickTarget,
        identifier: String,
    },
    SetValue {
        identifier: String,
        value: String,
        kind: QuestionKind,
    },
    Navigate {
        url: String,
    },
    PressEnter {
        identifier: String,
    },
    UploadFile {
        identifier: String,
        path: String,
    },
}

impl DriverAction {
    pub fn click_button(text: impl Into<String>) -> Self {
        DriverAction::Click {
            target: ClickTarget::Button,
            identifier: text.into(),
        }
    }

    /// 动作标签
    pub fn tag(&self) -> &'static str {
        match self {
            DriverAction::Click { .. } => "click",
            DriverAction::SetValue { .. } => "set_value",
            DriverAction::Navigate { .. } => "navigate",
            DriverAction::PressEnter { .. } => "press_enter",
            DriverAction::UploadFile { .. } => "upload_file",
        }
    }

    /// 用于日志和历史记录的目标描述
    pub fn target_description(&self) -> String {
        match self {
            DriverAction::Click { target, identifier } => {
                format!("{}: {}", target.as_str(), identifier)
            }
            DriverAction::SetValue {
                identifier, kind, ..
            } => format!("{} ({})", identifier, kind),
            DriverAction::Navigate { url } => url.clone(),
            DriverAction::PressEnter { identifier } => identifier.clone(),
            DriverAction::UploadFile { identifier, path } => format!("{} <- {}", identifier, path),
        }
    }
}

/// 驱动返回的结果字符串的粗分类
///
/// 只按关键字判断，不假设结构。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Error,
    Unclear,
}

impl OutcomeStatus {
    pub fn classify(outcome: &str) -> Self {
        let lower = outcome.to_lowercase();
        if lower.contains("error") || lower.contains("failed") {
            OutcomeStatus::Error
        } else if lower.contains("success") {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Unclear
        }
    }
}
