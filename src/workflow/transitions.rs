//! 申请状态转移表
//!
//! 状态只能通过 `transition` 改变，且只由流程层调用。

use std::fmt;

use crate::error::FlowError;
use crate::models::{ApplicationStatus, SubmitOutcome};

/// 驱动状态机前进的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// 当前页面提取到问题
    QuestionsFound,
    /// 当前页面没有问题（纯导航页）
    NoQuestions,
    /// 所有需要回答的问题都有答案
    AllAnswered,
    /// 有问题需要人工补填
    NeedsHuman,
    /// 答案生成彻底失败
    ResolutionFailed,
    /// 操作者确认已补填
    HumanConfirmed,
    /// 提交类按钮点击结果
    Clicked(SubmitOutcome),
    /// 中止或无法继续（原因只用于日志）
    Fail(String),
}

impl fmt::Display for FlowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowEvent::QuestionsFound => f.write_str("questions_found"),
            FlowEvent::NoQuestions => f.write_str("no_questions"),
            FlowEvent::AllAnswered => f.write_str("all_answered"),
            FlowEvent::NeedsHuman => f.write_str("needs_human"),
            FlowEvent::ResolutionFailed => f.write_str("resolution_failed"),
            FlowEvent::HumanConfirmed => f.write_str("human_confirmed"),
            FlowEvent::Clicked(outcome) => write!(f, "clicked({})", outcome),
            FlowEvent::Fail(reason) => write!(f, "fail({})", reason),
        }
    }
}

/// 状态转移表
///
/// ```text
/// collecting     --questions_found-->   filling
/// collecting     --no_questions----->   submitting
/// filling        --all_answered----->   submitting
/// filling        --needs_human------>   awaiting_human
/// filling        --resolution_failed->  failed
/// awaiting_human --human_confirmed-->   submitting
/// submitting     --clicked(next)---->   collecting
/// submitting     --clicked(review)-->   submitting
/// submitting     --clicked(submit)-->   submitted
/// submitting     --clicked(other)--->   failed
/// (非终态)       --fail------------->   failed
/// ```
pub fn transition(
    from: ApplicationStatus,
    event: &FlowEvent,
) -> Result<ApplicationStatus, FlowError> {
    use ApplicationStatus::*;

    let to = match (from, event) {
        (Submitted | Failed, _) => None,
        (_, FlowEvent::Fail(_)) => Some(Failed),

        (Collecting, FlowEvent::QuestionsFound) => Some(Filling),
        (Collecting, FlowEvent::NoQuestions) => Some(Submitting),

        (Filling, FlowEvent::AllAnswered) => Some(Submitting),
        (Filling, FlowEvent::NeedsHuman) => Some(AwaitingHuman),
        (Filling, FlowEvent::ResolutionFailed) => Some(Failed),

        (AwaitingHuman, FlowEvent::HumanConfirmed) => Some(Submitting),

        (Submitting, FlowEvent::Clicked(outcome)) => Some(match outcome {
            SubmitOutcome::Next => Collecting,
            SubmitOutcome::Review => Submitting,
            SubmitOutcome::Submit => Submitted,
            SubmitOutcome::Unknown | SubmitOutcome::Error => Failed,
        }),

        _ => None,
    };

    to.ok_or_else(|| FlowError::InvalidTransition {
        from,
        event: event.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_happy_path_through_two_pages() {
        let events = [
            FlowEvent::QuestionsFound,
            FlowEvent::AllAnswered,
            FlowEvent::Clicked(SubmitOutcome::Next),
            FlowEvent::QuestionsFound,
            FlowEvent::NeedsHuman,
            FlowEvent::HumanConfirmed,
            FlowEvent::Clicked(SubmitOutcome::Review),
            FlowEvent::Clicked(SubmitOutcome::Submit),
        ];
        let mut status = Collecting;
        let mut trace = vec![status];
        for event in &events {
            status = transition(status, event).unwrap();
            trace.push(status);
        }
        assert_eq!(
            trace,
            vec![
                Collecting,
                Filling,
                Submitting,
                Collecting,
                Filling,
                AwaitingHuman,
                Submitting,
                Submitting,
                Submitted
            ]
        );
    }

    #[test]
    fn test_no_shortcut_from_collecting_to_submitted() {
        for event in [
            FlowEvent::Clicked(SubmitOutcome::Submit),
            FlowEvent::AllAnswered,
            FlowEvent::HumanConfirmed,
        ] {
            assert!(matches!(
                transition(Collecting, &event),
                Err(FlowError::InvalidTransition { from: Collecting, .. })
            ));
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        assert!(transition(Submitted, &FlowEvent::Fail("late".into())).is_err());
        assert!(transition(Failed, &FlowEvent::QuestionsFound).is_err());
    }

    #[test]
    fn test_unclassified_click_fails_and_fail_works_everywhere() {
        assert_eq!(
            transition(Submitting, &FlowEvent::Clicked(SubmitOutcome::Unknown)).unwrap(),
            Failed
        );
        for from in [Collecting, Filling, AwaitingHuman, Submitting] {
            assert_eq!(transition(from, &FlowEvent::Fail("abort".into())).unwrap(), Failed);
        }
    }
}
