use fanout::{ExitStatus, fanout_main};

fn main() -> ExitStatus {
    fanout_main(|args| args)
}
