pub mod answer_resolver;
pub mod failure_log;
pub mod field_filler;
pub mod human_gate;
pub mod json_extract;
pub mod llm_service;
pub mod profile_collector;
pub mod question_extractor;
pub mod resume;
pub mod submission_controller;

pub use answer_resolver::AnswerResolver;
pub use failure_log::FailureLog;
pub use field_filler::{FieldFiller, FieldResult, FillReport};
pub use human_gate::{ConsoleGate, GateDecision, HumanGate, HumanRequest, PendingField};
pub use llm_service::{LlmService, ReasoningOracle};
pub use question_extractor::QuestionExtractor;
pub use submission_controller::SubmissionController;
