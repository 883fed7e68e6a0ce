use std::collections::VecDeque;

/// 一条动作记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step_index: usize,
    pub action_kind: String,
    pub target_description: String,
    pub outcome: String,
}

/// 有界的动作历史
///
/// 只用于给 LLM 提供上下文和诊断，不影响流程判断。
#[derive(Debug, Clone)]
pub struct ActionHistory {
    entries: VecDeque<StepRecord>,
    limit: usize,
    next_index: usize,
}

impl ActionHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit: limit.max(1),
            next_index: 1,
        }
    }

    pub fn push(
        &mut self,
        action_kind: impl Into<String>,
        target_description: impl Into<String>,
        outcome: impl Into<String>,
    ) {
        let record = StepRecord {
            step_index: self.next_index,
            action_kind: action_kind.into(),
            target_description: target_description.into(),
            outcome: outcome.into(),
        };
        self.next_index += 1;
        self.entries.push_back(record);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &StepRecord> {
        self.entries.iter()
    }

    /// 最近 n 条的文字摘要
    pub fn summary(&self, n: usize) -> String {
        let skip = self.entries.len().saturating_sub(n);
        self.entries
            .iter()
            .skip(skip)
            .map(|r| {
                format!(
                    "Step {}: {} - {} -> {}",
                    r.step_index, r.action_kind, r.target_description, r.outcome
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
