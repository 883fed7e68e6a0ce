//! 填写服务 - 业务能力层
//!
//! 逐个字段调用驱动的 set_value（文件控件走 upload_file），单个字段失败不影响其余字段。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::infrastructure::{with_deadline, Driver};
use crate::models::{Answer, DriverAction, OutcomeStatus, Question, QuestionKind};

/// 单个字段的填写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResult {
    pub question_id: String,
    pub kind: QuestionKind,
    pub succeeded: bool,
    /// 驱动返回的结果字符串或错误信息
    pub message: String,
}

/// 一次填写的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub results: Vec<FieldResult>,
}

impl FillReport {
    /// 所有字段都填写成功
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    pub fn filled(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FieldResult> {
        self.results.iter().filter(|r| !r.succeeded)
    }
}

/// 填写服务
pub struct FieldFiller {
    settle: Duration,
    call_timeout: Duration,
}

impl FieldFiller {
    pub fn new(settle: Duration, call_timeout: Duration) -> Self {
        Self {
            settle,
            call_timeout,
        }
    }

    /// 按顺序填写有值的答案
    ///
    /// `questions` 只用来查控件类型；找不到对应问题时按文本框处理。
    pub async fn fill(
        &self,
        driver: &dyn Driver,
        questions: &[Question],
        answers: &[Answer],
    ) -> FillReport {
        let mut report = FillReport::default();

        for answer in answers {
            let Some(value) = answer.value.as_deref() else {
                continue;
            };
            if !report.results.is_empty() {
                sleep(self.settle).await;
            }

            let kind = questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .map(|q| q.kind)
                .unwrap_or(QuestionKind::Text);
            let action = match kind {
                QuestionKind::File => DriverAction::UploadFile {
                    identifier: answer.question_id.clone(),
                    path: value.to_string(),
                },
                _ => DriverAction::SetValue {
                    identifier: answer.question_id.clone(),
                    value: value.to_string(),
                    kind,
                },
            };

            debug!("填写 '{}' = '{}'", answer.text, value);
            let dispatched = with_deadline(action.tag(), self.call_timeout, driver.dispatch(&action));
            let result = match dispatched.await {
                Ok(outcome) => {
                    let succeeded = OutcomeStatus::classify(&outcome) == OutcomeStatus::Success;
                    if succeeded {
                        info!("   ✓ {}", answer.text);
                    } else {
                        warn!("   ⚠️ 填写失败 '{}': {}", answer.text, outcome);
                    }
                    FieldResult {
                        question_id: answer.question_id.clone(),
                        kind,
                        succeeded,
                        message: outcome,
                    }
                }
                Err(e) => {
                    warn!("   ❌ 填写 '{}' 时驱动出错: {}", answer.text, e);
                    FieldResult {
                        question_id: answer.question_id.clone(),
                        kind,
                        succeeded: false,
                        message: e.to_string(),
                    }
                }
            };
            if result.succeeded && kind == QuestionKind::Text && is_typeahead(&answer.text) {
                self.confirm_suggestion(driver, &answer.question_id).await;
            }
            report.results.push(result);
        }

        info!(
            "📝 填写完成: 成功 {}/{}",
            report.filled(),
            report.results.len()
        );
        report
    }

    /// 地点类输入框会弹出候选列表，回车选中第一项
    async fn confirm_suggestion(&self, driver: &dyn Driver, identifier: &str) {
        let action = DriverAction::PressEnter {
            identifier: identifier.to_string(),
        };
        match with_deadline(action.tag(), self.call_timeout, driver.dispatch(&action)).await {
            Ok(outcome) => debug!("回车确认 '{}': {}", identifier, outcome),
            Err(e) => warn!("   ⚠️ 回车确认 '{}' 失败: {}", identifier, e),
        }
    }
}

fn is_typeahead(question_text: &str) -> bool {
    let text = question_text.to_lowercase();
    text.contains("location") || text.contains("city")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 对指定 id 返回错误，其余成功
    struct FlakyDriver {
        broken: &'static str,
        calls: Mutex<Vec<DriverAction>>,
    }

    #[async_trait]
    impl Driver for FlakyDriver {
        async fn dispatch(&self, action: &DriverAction) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(action.clone());
            match action {
                DriverAction::SetValue { identifier, .. } if identifier == self.broken => {
                    anyhow::bail!("node detached")
                }
                DriverAction::SetValue { identifier, .. } if identifier == "missing" => {
                    Ok(format!("Error: element '{}' not found", identifier))
                }
                _ => Ok("Successfully filled field".to_string()),
            }
        }
    }

    fn filler() -> FieldFiller {
        FieldFiller::new(Duration::from_millis(1), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_rest() {
        let questions = vec![
            Question::new("a", "First", QuestionKind::Text),
            Question::new("b", "Second", QuestionKind::Select),
            Question::new("missing", "Third", QuestionKind::Text),
            Question::new("d", "Fourth", QuestionKind::Text),
        ];
        let answers: Vec<Answer> = questions.iter().map(|q| Answer::known(q, "x")).collect();
        let driver = FlakyDriver {
            broken: "b",
            calls: Mutex::new(Vec::new()),
        };

        let report = filler().fill(&driver, &questions, &answers).await;

        assert_eq!(driver.calls.lock().unwrap().len(), 4);
        assert_eq!(report.filled(), 2);
        assert!(!report.success());
        let failed: Vec<&str> = report.failures().map(|r| r.question_id.as_str()).collect();
        assert_eq!(failed, vec!["b", "missing"]);
    }

    #[tokio::test]
    async fn test_kind_comes_from_question_and_unknown_answers_are_ignored() {
        let questions = vec![
            Question::new("r", "Relocate?", QuestionKind::Radio),
            Question::new("u", "Unknown one", QuestionKind::Text),
        ];
        let answers = vec![Answer::known(&questions[0], "yes"), Answer::unknown(&questions[1])];
        let driver = FlakyDriver {
            broken: "none",
            calls: Mutex::new(Vec::new()),
        };

        let report = filler().fill(&driver, &questions, &answers).await;

        assert!(report.success());
        let calls = driver.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![DriverAction::SetValue {
                identifier: "r".into(),
                value: "yes".into(),
                kind: QuestionKind::Radio,
            }]
        );
    }

    #[tokio::test]
    async fn test_location_field_is_confirmed_with_enter() {
        let questions = vec![
            Question::new("loc", "Current location", QuestionKind::Text),
            Question::new("yrs", "Years of experience", QuestionKind::Text),
        ];
        let answers = vec![
            Answer::known(&questions[0], "Berlin"),
            Answer::known(&questions[1], "5"),
        ];
        let driver = FlakyDriver {
            broken: "none",
            calls: Mutex::new(Vec::new()),
        };

        filler().fill(&driver, &questions, &answers).await;

        let calls = driver.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[1],
            DriverAction::PressEnter {
                identifier: "loc".into()
            }
        );
    }

    #[tokio::test]
    async fn test_file_answers_are_uploaded() {
        let questions = vec![Question::new("cv", "Resume", QuestionKind::File)];
        let answers = vec![Answer::known(&questions[0], "/tmp/resume.pdf")];
        let driver = FlakyDriver {
            broken: "none",
            calls: Mutex::new(Vec::new()),
        };

        let report = filler().fill(&driver, &questions, &answers).await;

        assert!(report.success());
        assert_eq!(
            *driver.calls.lock().unwrap(),
            vec![DriverAction::UploadFile {
                identifier: "cv".into(),
                path: "/tmp/resume.pdf".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_settle_only_between_dispatched_fields() {
        let questions = vec![
            Question::new("u1", "Unknown one", QuestionKind::Text),
            Question::new("u2", "Unknown two", QuestionKind::Text),
            Question::new("a", "Known", QuestionKind::Text),
        ];
        let answers = vec![
            Answer::unknown(&questions[0]),
            Answer::unknown(&questions[1]),
            Answer::known(&questions[2], "x"),
        ];
        let driver = FlakyDriver {
            broken: "none",
            calls: Mutex::new(Vec::new()),
        };
        let filler = FieldFiller::new(Duration::from_millis(500), Duration::from_secs(1));

        let started = std::time::Instant::now();
        filler.fill(&driver, &questions, &answers).await;

        // 只有一个字段真正下发，不需要等待
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
