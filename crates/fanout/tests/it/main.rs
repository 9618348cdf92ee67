pub(crate) mod common;

mod cli;
mod configuration;
mod dry_run;
mod run;
