pub mod feeds;
pub mod fetch;
pub mod run;
pub mod settings;
