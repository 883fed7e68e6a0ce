use serde::{Deserialize, Serialize};

use super::question::ChoiceOption;

/// 页面按钮
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonInfo {
    pub text: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ButtonInfo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            aria_label: None,
            visible: true,
            enabled: true,
        }
    }
}

/// 页面链接
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub text: String,
    #[serde(default)]
    pub href: Option<String>,
}

/// 页面上的一个可交互输入控件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputInfo {
    /// 标签名（input / select / textarea / fieldset）
    #[serde(default = "default_input_tag")]
    pub tag: String,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    /// `<label for>`、aria-label 或所在 fieldset 的 legend
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for InputInfo {
    fn default() -> Self {
        Self {
            tag: default_input_tag(),
            input_type: None,
            placeholder: None,
            name: None,
            id: None,
            label: None,
            options: Vec::new(),
            visible: true,
            enabled: true,
        }
    }
}

impl InputInfo {
    /// 控件标识：优先 id，其次 name
    pub fn identifier(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
    }

    /// 控件的问题文字：label 优先，其次 placeholder
    pub fn question_text(&self) -> Option<&str> {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.placeholder
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
    }
}

/// 页面快照
///
/// 每次调用都是新快照，不跨页复用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub buttons: Vec<ButtonInfo>,
    #[serde(default)]
    pub links: Vec<LinkInfo>,
    #[serde(default)]
    pub inputs: Vec<InputInfo>,
    #[serde(default)]
    pub raw_markup: Option<String>,
}

impl PageSnapshot {
    /// 可见且可用的按钮文字
    pub fn visible_button_texts(&self) -> Vec<&str> {
        self.buttons
            .iter()
            .filter(|b| b.visible && b.enabled)
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// 是否为安全验证 / 人机验证页面
    pub fn is_verification_page(&self) -> bool {
        const URL_MARKERS: [&str; 4] = ["checkpoint", "challenge", "verification", "captcha"];
        const TITLE_MARKERS: [&str; 4] = ["security verification", "challenge", "verify", "robot"];

        let url = self.url.to_lowercase();
        let title = self.title.to_lowercase();
        URL_MARKERS.iter().any(|m| url.contains(m)) || TITLE_MARKERS.iter().any(|m| title.contains(m))
    }

    /// 用于判断两次快照是否为同一页面
    ///
    /// 由地址、标题、控件标识和可见按钮组成，不含控件当前的值。
    pub fn fingerprint(&self) -> String {
        let ids: Vec<&str> = self.inputs.iter().filter_map(|i| i.identifier()).collect();
        format!(
            "{}|{}|{}|{}",
            self.url,
            self.title,
            ids.join(","),
            self.visible_button_texts().join(",")
        )
    }
}

fn default_true() -> bool {
    true
}

fn default_input_tag() -> String {
    "input".to_string()
}
