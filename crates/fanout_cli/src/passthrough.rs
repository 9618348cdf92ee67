/// Flags that only fanout understands. They are never forwarded to the test runner.
pub const RESERVED_FLAGS: &[&str] = &["mode", "url", "config", "threads", "spec"];

/// Remove every reserved flag from arguments destined for the test runner.
///
/// `--flag value` drops both arguments; `--flag=value` drops one. Everything else is kept in
/// order.
pub fn strip_reserved_args(args: Vec<String>) -> Vec<String> {
    let mut kept = Vec::with_capacity(args.len());
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match reserved_flag(&arg) {
            Some(Form::Separate) => {
                let value = args.next();
                tracing::warn!(
                    "Ignoring `{arg}{}` in the runner arguments, pass it to fanout directly",
                    value.map(|value| format!(" {value}")).unwrap_or_default()
                );
            }
            Some(Form::Joined) => {
                tracing::warn!("Ignoring `{arg}` in the runner arguments, pass it to fanout directly");
            }
            None => kept.push(arg),
        }
    }

    kept
}

enum Form {
    /// `--flag value`
    Separate,
    /// `--flag=value`
    Joined,
}

fn reserved_flag(arg: &str) -> Option<Form> {
    let name = arg.strip_prefix("--")?;

    RESERVED_FLAGS.iter().find_map(|flag| {
        let rest = name.strip_prefix(flag)?;
        if rest.is_empty() {
            Some(Form::Separate)
        } else if rest.starts_with('=') {
            Some(Form::Joined)
        } else {
            None
        }
    })
}
