pub mod detector;
pub mod hardware;
pub mod policy;
pub mod report;
pub mod tier;
