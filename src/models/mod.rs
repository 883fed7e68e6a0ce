pub mod action;
pub mod application;
pub mod history;
pub mod loaders;
pub mod page;
pub mod profile;
pub mod question;

pub use action::{ClickTarget, DriverAction, OutcomeStatus};
pub use application::{ApplicationOutcome, ApplicationState, ApplicationStatus, SubmitOutcome};
pub use history::{ActionHistory, StepRecord};
pub use loaders::{load_job_list, load_profile, save_profile};
pub use page::{ButtonInfo, InputInfo, LinkInfo, PageSnapshot};
pub use profile::{JobList, Profile, PROFILE_QUESTIONS};
pub use question::{Answer, ChoiceOption, Question, QuestionKind};
