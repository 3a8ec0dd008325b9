pub mod config;
pub mod logging;
pub mod publish;
pub mod recommend;
pub mod source;
