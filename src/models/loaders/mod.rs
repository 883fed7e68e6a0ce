pub mod toml_loader;

pub use toml_loader::{load_job_list, load_profile, save_profile};
