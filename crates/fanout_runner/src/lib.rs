mod launcher;
mod orchestration;
mod partition;
mod process;
mod server;
mod shutdown;

pub use launcher::{
    CommandLauncher, InstanceEvent, InstancePlan, Launcher, RunnerChild, RunnerMode,
    RunnerProcess, TargetUrls, plan_instances, runner_args,
};
pub use orchestration::{
    ParallelRunConfig, RunOutcome, Supervisor, execute, plan_run, run_parallel,
};
pub use partition::partition;
pub use process::FAILURE_EXIT_CODE;
pub use server::{AuxiliaryServer, DevServer, DevServerStarter, ServerStarter};
pub use shutdown::{interrupted_exit_code, shutdown_receiver};
