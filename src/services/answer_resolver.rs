//! 答案生成服务 - 业务能力层
//!
//! 一次 LLM 请求为整页问题生成答案，再按问题顺序对齐。
//! 选择类问题的答案会被映射成控件真实的选项值。

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::models::{ActionHistory, Answer, ChoiceOption, Profile, Question, QuestionKind};
use crate::services::json_extract::extract_typed_array;
use crate::services::llm_service::ReasoningOracle;
use crate::utils::logging::truncate_text;

/// 给 LLM 的历史摘要条数
const HISTORY_CONTEXT_ENTRIES: usize = 5;

const RESOLVE_DIRECTIVE: &str = r#"ROLE: Job application form answer generator.

OBJECTIVE: Answer each form question using the candidate's resume and profile.

INSTRUCTIONS:
- Match resume and profile details to the form questions.
- Return a JSON array with one object per question: "element_id", "question", "value".
- Set "value" to null when no relevant information is available. Do not guess personal facts.
- DO NOT skip questions asking for phone or mobile numbers.
- For select / radio questions:
  * pick the option whose label best matches or approximates the answer
  * return that option's "value" field, not its label
  * if nothing matches exactly, choose the closest reasonable option
- Numeric questions (years, amounts) take plain numbers.

OUTPUT: ONLY a JSON array, for example
[
  {"element_id": "phone-123", "question": "Mobile phone number", "value": "9876543210"},
  {"element_id": "auth-7", "question": "Are you authorized to work?", "value": "yes"}
]"#;

/// LLM 返回的单个答案
#[derive(Debug, Deserialize)]
struct RawAnswer {
    #[serde(alias = "id", alias = "question_id", alias = "identifier")]
    element_id: Option<String>,
    #[serde(alias = "text")]
    question: Option<String>,
    #[serde(default)]
    value: JsonValue,
}

impl RawAnswer {
    /// 字符串 / 数字 / 布尔都接受，null 和空串视为无答案
    fn value_text(&self) -> Option<String> {
        let text = match &self.value {
            JsonValue::String(s) => s.trim().to_string(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// 答案生成服务
pub struct AnswerResolver {
    resume_char_limit: usize,
    upload_path: Option<String>,
}

impl AnswerResolver {
    pub fn new(resume_char_limit: usize) -> Self {
        Self {
            resume_char_limit,
            upload_path: None,
        }
    }

    /// 文件上传类问题直接用这个路径作答（一般是简历文件）
    pub fn with_upload_path(mut self, path: Option<String>) -> Self {
        self.upload_path = path;
        self
    }

    /// 为问题生成答案
    ///
    /// 返回与 `questions` 等长、同序的答案；LLM 调用或解析彻底失败时返回空列表。
    pub async fn resolve(
        &self,
        oracle: &dyn ReasoningOracle,
        questions: &[Question],
        profile: &Profile,
        resume_text: &str,
    ) -> Vec<Answer> {
        self.resolve_with_history(
            oracle,
            questions,
            profile,
            resume_text,
            &ActionHistory::new(1),
        )
        .await
    }

    /// 同 `resolve`，额外把最近的动作历史作为上下文交给 LLM
    pub async fn resolve_with_history(
        &self,
        oracle: &dyn ReasoningOracle,
        questions: &[Question],
        profile: &Profile,
        resume_text: &str,
        history: &ActionHistory,
    ) -> Vec<Answer> {
        if questions.is_empty() {
            return Vec::new();
        }

        let asked: Vec<&Question> = questions
            .iter()
            .filter(|q| !is_email_question(q) && q.kind != QuestionKind::File)
            .collect();
        let raw = if asked.is_empty() {
            Vec::new()
        } else {
            let payload = self.build_payload(&asked, profile, resume_text, history);
            let reply = match oracle.complete(RESOLVE_DIRECTIVE, &payload).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("❌ LLM 生成答案失败: {}", e);
                    return Vec::new();
                }
            };
            debug!("LLM 答案回复: {}", truncate_text(&reply, 300));

            match extract_typed_array::<RawAnswer>(&reply) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("❌ 无法解析 LLM 答案: {}", e);
                    return Vec::new();
                }
            }
        };

        let answers = align(questions, &raw, profile, self.upload_path.as_deref());
        let known = answers.iter().filter(|a| a.value.is_some()).count();
        info!("✓ 生成答案 {}/{}", known, answers.len());
        answers
    }

    fn build_payload(
        &self,
        questions: &[&Question],
        profile: &Profile,
        resume_text: &str,
        history: &ActionHistory,
    ) -> String {
        let form_questions: Vec<JsonValue> = questions
            .iter()
            .map(|q| {
                let options = q.kind.is_selection().then(|| &q.options);
                json!({
                    "element_id": q.id,
                    "question": q.text,
                    "element_type": q.kind.as_str(),
                    "options": options,
                })
            })
            .collect();

        let resume: String = resume_text.chars().take(self.resume_char_limit).collect();
        let mut payload = json!({
            "resume_text": resume,
            "user_profile": profile.as_map(),
            "form_questions": form_questions,
        });
        if !history.is_empty() {
            payload["recent_actions"] = json!(history.summary(HISTORY_CONTEXT_ENTRIES));
        }

        serde_json::to_string_pretty(&payload).unwrap_or_default()
    }
}

/// 按问题顺序对齐 LLM 答案
///
/// LLM 漏掉的问题按"无答案"处理；先按 id 匹配，再按问题文字匹配。
fn align(
    questions: &[Question],
    raw: &[RawAnswer],
    profile: &Profile,
    upload_path: Option<&str>,
) -> Vec<Answer> {
    questions
        .iter()
        .map(|question| {
            if is_email_question(question) {
                return Answer::skip(question);
            }
            if question.kind == QuestionKind::File {
                return match upload_path {
                    Some(path) => Answer::known(question, path),
                    None => Answer::unknown(question),
                };
            }

            let matched = raw
                .iter()
                .find(|r| r.element_id.as_deref().map(str::trim) == Some(question.id.as_str()))
                .or_else(|| {
                    raw.iter().find(|r| {
                        r.question
                            .as_deref()
                            .is_some_and(|t| t.trim().eq_ignore_ascii_case(&question.text))
                    })
                });

            let value = matched
                .and_then(RawAnswer::value_text)
                .or_else(|| profile_fallback(question, profile));

            match value {
                Some(value) if !question.options.is_empty() => {
                    match map_option_value(&question.options, &value) {
                        Some(mapped) => Answer::known(question, mapped),
                        None => Answer::unknown(question),
                    }
                }
                Some(value) => Answer::known(question, value),
                None => Answer::unknown(question),
            }
        })
        .collect()
}

/// 邮箱等身份字段由站点从账户资料带出，不作答
fn is_email_question(question: &Question) -> bool {
    let text = question.text.to_lowercase();
    text.contains("email") || text.contains("e-mail")
}

/// 电话号码必须作答：LLM 没给时直接用资料里的号码
fn profile_fallback(question: &Question, profile: &Profile) -> Option<String> {
    let text = question.text.to_lowercase();
    if text.contains("phone") || text.contains("mobile") {
        return profile
            .get("phone")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
    }
    None
}

/// 把 LLM 给出的文字映射为选项的机器值
///
/// 依次尝试：值完全相同、显示文字相同（忽略大小写）、值相同（忽略大小写），
/// 都不中时取相似度最高的选项。选项为空时返回 `None`。
pub fn map_option_value(options: &[ChoiceOption], answer: &str) -> Option<String> {
    let answer = answer.trim();
    if let Some(option) = options.iter().find(|o| o.value == answer) {
        return Some(option.value.clone());
    }
    if let Some(option) = options
        .iter()
        .find(|o| o.label.trim().eq_ignore_ascii_case(answer))
    {
        return Some(option.value.clone());
    }
    if let Some(option) = options
        .iter()
        .find(|o| o.value.trim().eq_ignore_ascii_case(answer))
    {
        return Some(option.value.clone());
    }

    let wanted = answer.to_lowercase();
    let mut best: Option<(&ChoiceOption, f64)> = None;
    for option in options {
        let score = similarity(&wanted, &option.label.to_lowercase())
            .max(similarity(&wanted, &option.value.to_lowercase()));
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((option, score));
        }
    }
    best.map(|(option, score)| {
        debug!(
            "选项近似匹配: '{}' -> '{}' (相似度 {:.2})",
            answer, option.label, score
        );
        option.value.clone()
    })
}

/// 字符二元组的 Dice 系数；一方包含另一方时至少 0.5
fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let containment = if a.contains(b) || b.contains(a) { 0.5 } else { 0.0 };

    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let (left, mut right) = (bigrams(a), bigrams(b));
    if left.is_empty() || right.is_empty() {
        return containment;
    }

    let total = left.len() + right.len();
    let mut shared = 0usize;
    for pair in &left {
        if let Some(pos) = right.iter().position(|p| p == pair) {
            right.swap_remove(pos);
            shared += 1;
        }
    }
    let dice = 2.0 * shared as f64 / total as f64;
    dice.max(containment)
}
