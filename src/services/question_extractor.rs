//! 问题提取服务 - 业务能力层
//!
//! 把一次页面快照变成有序的 `Question` 列表。
//! 先让 LLM 解析表单，结果不可用时退回本地启发式解析，保证流程总有东西可做。

use std::collections::HashSet;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{ChoiceOption, InputInfo, PageSnapshot, Question, QuestionKind};
use crate::services::json_extract::extract_typed_array;
use crate::services::llm_service::ReasoningOracle;
use crate::utils::logging::truncate_text;

/// 问题文字的最短长度（不含）
const MIN_QUESTION_CHARS: usize = 3;

/// 不是问题的常见控件文字
const FILTER_WORDS: &[&str] = &[
    "required", "optional", "submit", "cancel", "next", "previous", "save", "continue", "back",
    "close", "ok", "yes", "no",
];

const EXTRACT_DIRECTIVE: &str = r#"ROLE: Job application form parser.

TASK: Extract every form question AND the identifier of the control that answers it.

INSTRUCTIONS:
1. Look at <input>, <select>, <textarea> elements and radio groups (fieldsets).
2. For each control return:
   - "question": the question text (from its <label>, legend, aria-label or placeholder)
   - "element_id": the control's id (or its name when there is no id)
   - "element_type": one of text, textarea, select, radio, checkbox, file
   - "options": for select/radio only, a list of {"label": ..., "value": ...}
3. IGNORE phone country code dropdowns, submit buttons and navigation buttons.
4. ONLY extract controls that require user input.

OUTPUT: ONLY a JSON array, for example
[
  {"question": "Mobile phone number", "element_id": "phone-123", "element_type": "text"},
  {"question": "Are you legally authorized to work?", "element_id": "auth-7", "element_type": "radio",
   "options": [{"label": "Yes", "value": "yes"}, {"label": "No", "value": "no"}]}
]"#;

/// LLM 返回的单个问题（字段名宽松）
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(alias = "id", alias = "identifier")]
    element_id: Option<String>,
    #[serde(alias = "text", alias = "label")]
    question: Option<String>,
    #[serde(alias = "kind", alias = "type")]
    element_type: Option<String>,
    #[serde(default)]
    options: Option<Vec<RawOption>>,
}

/// 选项可以是纯字符串，也可以是 {label, value}
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Labeled {
        #[serde(alias = "text")]
        label: String,
        value: Option<String>,
    },
}

impl From<RawOption> for ChoiceOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(text) => ChoiceOption::plain(text),
            RawOption::Labeled { label, value } => match value {
                Some(value) => ChoiceOption::new(label, value),
                None => ChoiceOption::plain(label),
            },
        }
    }
}

/// 问题提取服务
///
/// 不持有 LLM 或页面，每次调用传入。
pub struct QuestionExtractor {
    max_payload_chars: usize,
}

impl QuestionExtractor {
    pub fn new(max_payload_chars: usize) -> Self {
        Self { max_payload_chars }
    }

    /// 提取当前快照中的问题
    ///
    /// 快照里既没有控件也没有表单 HTML 时直接返回空列表。
    pub async fn extract(
        &self,
        oracle: &dyn ReasoningOracle,
        snapshot: &PageSnapshot,
    ) -> Vec<Question> {
        let has_markup = snapshot
            .raw_markup
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        if !has_markup && snapshot.inputs.is_empty() {
            debug!("页面没有表单内容，跳过问题提取");
            return Vec::new();
        }

        match self.extract_with_oracle(oracle, snapshot).await {
            Ok(questions) if !questions.is_empty() => {
                info!("✓ LLM 提取到 {} 个问题", questions.len());
                return questions;
            }
            Ok(_) => warn!("⚠️ LLM 未提取到问题，使用启发式解析"),
            Err(e) => warn!("⚠️ LLM 提取问题失败: {}，使用启发式解析", e),
        }

        let questions = heuristic_questions(snapshot);
        info!("✓ 启发式解析得到 {} 个问题", questions.len());
        questions
    }

    async fn extract_with_oracle(
        &self,
        oracle: &dyn ReasoningOracle,
        snapshot: &PageSnapshot,
    ) -> anyhow::Result<Vec<Question>> {
        let payload = self.build_payload(snapshot);
        let reply = oracle.complete(EXTRACT_DIRECTIVE, &payload).await?;
        debug!("LLM 提取回复: {}", truncate_text(&reply, 300));

        let raw: Vec<RawQuestion> = extract_typed_array(&reply)?;
        Ok(normalize(raw, snapshot))
    }

    /// 优先发送表单 HTML，没有时发送控件列表
    fn build_payload(&self, snapshot: &PageSnapshot) -> String {
        match snapshot.raw_markup.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(markup) => format!(
                "HTML to analyze:\n{}",
                truncate_chars(markup, self.max_payload_chars)
            ),
            None => {
                let controls = serde_json::to_string_pretty(&snapshot.inputs).unwrap_or_default();
                format!(
                    "Form controls to analyze (JSON):\n{}",
                    truncate_chars(&controls, self.max_payload_chars)
                )
            }
        }
    }
}

/// 把 LLM 结果清洗成 `Question`
///
/// - 去掉无 id / 无文字 / 国家区号的条目，按 id 去重
/// - 快照里有控件时，只保留能对应上的 id，并用快照补全类型和选项
fn normalize(raw: Vec<RawQuestion>, snapshot: &PageSnapshot) -> Vec<Question> {
    let mut seen = HashSet::new();
    let mut questions = Vec::new();

    for item in raw {
        let (Some(id), Some(text)) = (item.element_id, item.question) else {
            continue;
        };
        let (id, text) = (id.trim().to_string(), text.trim().to_string());
        if id.is_empty() || text.is_empty() || is_country_code(&text, Some(&id)) {
            continue;
        }

        let control = snapshot
            .inputs
            .iter()
            .find(|input| input.identifier() == Some(id.as_str()));
        if control.is_none() && !snapshot.inputs.is_empty() {
            debug!("忽略页面上不存在的控件: {}", id);
            continue;
        }
        if !seen.insert(id.clone()) {
            continue;
        }

        let mut kind = item
            .element_type
            .as_deref()
            .map(QuestionKind::from_tag)
            .unwrap_or(QuestionKind::Unknown);
        let mut options: Vec<ChoiceOption> = item
            .options
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect();

        if let Some(input) = control {
            let observed = QuestionKind::infer(&input.tag, input.input_type.as_deref());
            if observed != QuestionKind::Unknown {
                kind = observed;
            }
            // 页面上的选项值才是真实可用的机器值
            if !input.options.is_empty() {
                options = input.options.clone();
            }
        }

        questions.push(Question::new(id, text, kind).with_options(options));
    }
    questions
}

/// 本地启发式解析
///
/// 有控件时逐个控件取 label / placeholder；没有控件时扫描表单 HTML。
pub fn heuristic_questions(snapshot: &PageSnapshot) -> Vec<Question> {
    if snapshot.inputs.is_empty() {
        return snapshot
            .raw_markup
            .as_deref()
            .map(markup_questions)
            .unwrap_or_default();
    }

    let mut seen = HashSet::new();
    snapshot
        .inputs
        .iter()
        .enumerate()
        .filter(|(_, input)| input.visible && input.enabled)
        .filter_map(|(index, input)| control_question(index, input))
        .filter(|q| seen.insert(q.id.clone()))
        .collect()
}

fn control_question(index: usize, input: &InputInfo) -> Option<Question> {
    let text = input.question_text()?.trim();
    if !is_candidate_text(text) || is_country_code(text, input.identifier()) {
        return None;
    }
    let id = input
        .identifier()
        .map(str::to_string)
        .unwrap_or_else(|| synthetic_id(index));
    let kind = QuestionKind::infer(&input.tag, input.input_type.as_deref());
    Some(Question::new(id, text, kind).with_options(input.options.clone()))
}

/// 从 HTML 中找 label / placeholder / legend 文字
fn markup_questions(markup: &str) -> Vec<Question> {
    let patterns = [
        (r"(?is)<label[^>]*>([^<]+)</label>", QuestionKind::Text),
        (r#"(?i)placeholder="([^"]+)""#, QuestionKind::Text),
        (r"(?is)<legend[^>]*>([^<]+)</legend>", QuestionKind::Unknown),
    ];

    let mut seen = HashSet::new();
    let mut questions = Vec::new();
    for (pattern, kind) in patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        for cap in re.captures_iter(markup) {
            let text = cap[1].split_whitespace().collect::<Vec<_>>().join(" ");
            if !is_candidate_text(&text) || is_country_code(&text, None) {
                continue;
            }
            if seen.insert(text.to_lowercase()) {
                let id = synthetic_id(questions.len());
                questions.push(Question::new(id, text, kind));
            }
        }
    }
    questions
}

fn is_candidate_text(text: &str) -> bool {
    text.chars().count() > MIN_QUESTION_CHARS
        && !FILTER_WORDS.contains(&text.to_lowercase().as_str())
        && !text.starts_with("<!--")
}

/// 电话国家区号选择框永远不作为问题
fn is_country_code(text: &str, identifier: Option<&str>) -> bool {
    let text = text.to_lowercase();
    if text.contains("country code") || text.contains("country/region code") {
        return true;
    }
    identifier.is_some_and(|id| {
        let id = id.to_lowercase();
        id.contains("country-code") || id.contains("countrycode") || id.contains("country_code")
    })
}

fn synthetic_id(index: usize) -> String {
    format!("heuristic-field-{}", index)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
