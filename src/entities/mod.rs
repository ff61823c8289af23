pub mod device;
pub mod dispute;
pub mod order;
pub mod order_statistic;
pub mod platform;
pub mod session;
pub mod setting;
pub mod social_account;
pub mod task;
pub mod transaction;
pub mod user;

pub use platform::Platform;
