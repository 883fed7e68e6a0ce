pub mod application_ctx;
pub mod application_flow;
pub mod transitions;

pub use application_ctx::ApplicationCtx;
pub use application_flow::{
    wait_for_abort, ApplicationFlow, ApplicationReport, Collaborators, FlowSettings,
};
pub use transitions::{transition, FlowEvent};
