pub mod instance;
pub mod serve;
