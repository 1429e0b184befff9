mod args;
mod command;

pub use args::Cli;
pub use command::run;
