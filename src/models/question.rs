use serde::{Deserialize, Serialize};

/// 控件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Select,
    Radio,
    Checkbox,
    File,
    Unknown,
}

/// 标签 / type 属性 → 控件类型
static KIND_BY_TAG: phf::Map<&'static str, QuestionKind> = phf::phf_map! {
    "input" => QuestionKind::Text,
    "text" => QuestionKind::Text,
    "textarea" => QuestionKind::Text,
    "email" => QuestionKind::Text,
    "tel" => QuestionKind::Text,
    "number" => QuestionKind::Text,
    "url" => QuestionKind::Text,
    "search" => QuestionKind::Text,
    "date" => QuestionKind::Text,
    "select" => QuestionKind::Select,
    "select-one" => QuestionKind::Select,
    "dropdown" => QuestionKind::Select,
    "radio" => QuestionKind::Radio,
    "multiplechoice" => QuestionKind::Radio,
    "fieldset" => QuestionKind::Radio,
    "checkbox" => QuestionKind::Checkbox,
    "file" => QuestionKind::File,
};

impl QuestionKind {
    /// 从 HTML 标签或 type 属性推断控件类型
    pub fn from_tag(tag: &str) -> Self {
        let key = tag.trim().to_ascii_lowercase();
        KIND_BY_TAG
            .get(key.as_str())
            .copied()
            .unwrap_or(QuestionKind::Unknown)
    }

    /// 根据标签和 type 属性共同推断；input 的 type 比标签更具体
    pub fn infer(tag: &str, input_type: Option<&str>) -> Self {
        if let Some(t) = input_type.filter(|t| !t.trim().is_empty()) {
            let by_type = Self::from_tag(t);
            if by_type != QuestionKind::Unknown {
                return by_type;
            }
        }
        Self::from_tag(tag)
    }

    /// 是否为选择类控件（需要附带选项）
    pub fn is_selection(self) -> bool {
        matches!(self, QuestionKind::Select | QuestionKind::Radio)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Select => "select",
            QuestionKind::Radio => "radio",
            QuestionKind::Checkbox => "checkbox",
            QuestionKind::File => "file",
            QuestionKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 选择类控件的一个选项：显示文字 + 机器值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// 文字与值相同的选项
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            label: text.clone(),
            value: text,
        }
    }
}

/// 从页面提取出的一个问题
///
/// `id` 只在同一次快照内唯一，翻页后必须重新提取。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl Question {
    pub fn new(id: impl Into<String>, text: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }
}

/// 对一个问题的回答
///
/// `value == None` 表示"无法回答"，是正常结果而不是错误。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub text: String,
    pub value: Option<String>,
    /// 身份类字段（如邮箱）不作答也不交给人工
    #[serde(default)]
    pub skipped: bool,
}

impl Answer {
    pub fn known(question: &Question, value: impl Into<String>) -> Self {
        Self {
            question_id: question.id.clone(),
            text: question.text.clone(),
            value: Some(value.into()),
            skipped: false,
        }
    }

    pub fn unknown(question: &Question) -> Self {
        Self {
            question_id: question.id.clone(),
            text: question.text.clone(),
            value: None,
            skipped: false,
        }
    }

    pub fn skip(question: &Question) -> Self {
        Self {
            skipped: true,
            ..Self::unknown(question)
        }
    }

    /// 需要人工补填
    pub fn needs_human(&self) -> bool {
        self.value.is_none() && !self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_inference_prefers_input_type() {
        assert_eq!(QuestionKind::infer("input", Some("radio")), QuestionKind::Radio);
        assert_eq!(QuestionKind::infer("input", Some("file")), QuestionKind::File);
        assert_eq!(QuestionKind::infer("SELECT", None), QuestionKind::Select);
        assert_eq!(QuestionKind::infer("textarea", Some("")), QuestionKind::Text);
        assert_eq!(QuestionKind::infer("div", Some("hidden")), QuestionKind::Unknown);
    }

    #[test]
    fn test_answer_routing_flags() {
        let q = Question::new("q1", "Email address", QuestionKind::Text);
        assert!(!Answer::skip(&q).needs_human());
        assert!(Answer::unknown(&q).needs_human());
        assert!(!Answer::known(&q, "x").needs_human());
    }
}
