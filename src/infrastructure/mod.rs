pub mod chrome_driver;
pub mod driver;
pub mod js_executor;

pub use chrome_driver::ChromeDriver;
pub use driver::{with_deadline, Driver, PageStateProvider};
pub use js_executor::JsExecutor;
