/// 单个申请的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    /// 提取当前页面的问题
    Collecting,
    /// 生成答案并填写
    Filling,
    /// 等待人工补填
    AwaitingHuman,
    /// 点击提交类按钮
    Submitting,
    /// 已提交（终态）
    Submitted,
    /// 失败（终态）
    Failed,
}

impl ApplicationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Submitted | ApplicationStatus::Failed)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApplicationStatus::Collecting => "collecting",
            ApplicationStatus::Filling => "filling",
            ApplicationStatus::AwaitingHuman => "awaiting_human",
            ApplicationStatus::Submitting => "submitting",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 状态机自身的状态，只由流程层修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationState {
    pub status: ApplicationStatus,
    /// 当前向导页序号（从 1 开始）
    pub current_page_step: usize,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            status: ApplicationStatus::Collecting,
            current_page_step: 1,
        }
    }
}

/// 一次提交按钮点击的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Next,
    Review,
    Submit,
    Unknown,
    Error,
}

impl std::fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SubmitOutcome::Next => "next",
            SubmitOutcome::Review => "review",
            SubmitOutcome::Submit => "submit",
            SubmitOutcome::Unknown => "unknown",
            SubmitOutcome::Error => "error",
        };
        f.write_str(name)
    }
}

/// 单个申请对调用方的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationOutcome {
    Submitted { pages: usize },
    Failed { reason: String },
}

impl ApplicationOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, ApplicationOutcome::Submitted { .. })
    }
}
