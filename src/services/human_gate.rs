//! 人工介入 - 业务能力层
//!
//! 有答不上的问题或遇到安全验证时，把控制权交给操作者，等待确认后再继续。

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::Answer;

/// 需要人工处理的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingField {
    pub question_id: String,
    pub text: String,
}

impl From<&Answer> for PendingField {
    fn from(answer: &Answer) -> Self {
        Self {
            question_id: answer.question_id.clone(),
            text: answer.text.clone(),
        }
    }
}

/// 一次人工介入请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanRequest {
    pub reason: String,
    pub fields: Vec<PendingField>,
}

impl HumanRequest {
    pub fn unanswered(answers: &[&Answer]) -> Self {
        Self {
            reason: "以下问题无法自动回答，请在浏览器中手动填写".to_string(),
            fields: answers.iter().map(|a| PendingField::from(*a)).collect(),
        }
    }

    pub fn verification(url: &str) -> Self {
        Self {
            reason: format!("检测到安全验证页面，请在浏览器中完成验证: {}", url),
            fields: Vec::new(),
        }
    }
}

/// 操作者的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    Abort,
}

/// 人工确认入口
///
/// `confirm` 会一直挂起直到操作者答复；外部中止由流程层另行监听。
#[async_trait]
pub trait HumanGate: Send + Sync {
    async fn confirm(&self, request: &HumanRequest) -> GateDecision;
}

/// 控制台确认：回车继续，输入 abort 中止
///
/// 整个运行期间共用同一个输入流；确认被外部中止打断时，
/// 操作者随后输入的那一行留给下一次确认。
pub struct ConsoleGate<R = BufReader<Stdin>> {
    lines: Mutex<Lines<R>>,
}

impl ConsoleGate {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> ConsoleGate<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }
}

#[async_trait]
impl<R> HumanGate for ConsoleGate<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, request: &HumanRequest) -> GateDecision {
        info!("⏸️  {}", request.reason);
        for field in &request.fields {
            info!("   • {} [{}]", field.text, field.question_id);
        }
        info!("👉 完成后按回车继续，输入 abort 放弃本次申请");

        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) => parse_reply(&line),
            Ok(None) => {
                warn!("标准输入已关闭，放弃本次申请");
                GateDecision::Abort
            }
            Err(e) => {
                warn!("读取输入失败: {}，放弃本次申请", e);
                GateDecision::Abort
            }
        }
    }
}

fn parse_reply(line: &str) -> GateDecision {
    match line.trim().to_lowercase().as_str() {
        "abort" | "a" | "q" | "quit" | "skip" => GateDecision::Abort,
        _ => GateDecision::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, QuestionKind};

    #[test]
    fn test_reply_parsing() {
        assert_eq!(parse_reply(""), GateDecision::Continue);
        assert_eq!(parse_reply("done\n"), GateDecision::Continue);
        assert_eq!(parse_reply("  ABORT "), GateDecision::Abort);
        assert_eq!(parse_reply("q"), GateDecision::Abort);
    }

    #[test]
    fn test_unanswered_request_lists_fields() {
        let q = Question::new("salary", "Expected salary", QuestionKind::Text);
        let answer = Answer::unknown(&q);
        let request = HumanRequest::unanswered(&[&answer]);
        assert_eq!(
            request.fields,
            vec![PendingField {
                question_id: "salary".into(),
                text: "Expected salary".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_line_typed_after_cancelled_confirm_is_not_lost() {
        let reader = tokio_test::io::Builder::new()
            .wait(std::time::Duration::from_millis(100))
            .read(b"abort\n")
            .read(b"\n")
            .build();
        let gate = ConsoleGate::from_reader(BufReader::new(reader));
        let request = HumanRequest::verification("https://jobs.example/checkpoint");

        // 外部中止打断第一次确认
        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(10), gate.confirm(&request)).await;
        assert!(cancelled.is_err());

        assert_eq!(gate.confirm(&request).await, GateDecision::Abort);
        assert_eq!(gate.confirm(&request).await, GateDecision::Continue);
    }
}
