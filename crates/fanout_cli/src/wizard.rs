use std::io;

use console::{Style, Term};
use fanout_metadata::{Mode, ThreadCount};

/// How many times an invalid answer is asked again before giving up.
const MAX_ATTEMPTS: usize = 3;

const MODES: [Mode; 3] = [Mode::Development, Mode::Production, Mode::Test];

/// Asks the user a question and returns the raw answer.
pub trait Prompter {
    fn ask(&mut self, question: &str, default: Option<&str>) -> io::Result<String>;
}

/// Prompts on the terminal's stderr and reads answers from its stdin.
pub struct TermPrompter {
    term: Term,
}

impl TermPrompter {
    pub fn stderr() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Prompter for TermPrompter {
    fn ask(&mut self, question: &str, default: Option<&str>) -> io::Result<String> {
        let question = Style::new().bold().apply_to(question);
        match default {
            Some(default) if !default.is_empty() => {
                let default = Style::new().dim().apply_to(format!("({default})"));
                self.term.write_str(&format!("? {question} {default} "))?;
            }
            _ => self.term.write_str(&format!("? {question} "))?,
        }
        self.term.read_line()
    }
}

/// Options collected by `fanout wizard`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardAnswers {
    pub headless: bool,
    pub mode: Mode,
    pub url: String,
    pub spec: String,
    pub threads: ThreadCount,
}

impl WizardAnswers {
    /// The `fanout run` flags equivalent to these answers.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push("--mode".to_string());
        args.push(self.mode.to_string());
        if !self.url.is_empty() {
            args.push(format!("--url={}", self.url));
        }
        args.push(format!("--spec={}", self.spec));
        args.push(format!("--threads={}", self.threads));
        args
    }
}

/// Ask for every run option, re-asking when an answer is invalid.
pub fn gather_answers(prompter: &mut dyn Prompter) -> io::Result<WizardAnswers> {
    let mode = ask_valid(
        prompter,
        "Specify the mode the dev server should run in (development, production, test)",
        Some(Mode::Development.as_str()),
        |answer| {
            MODES
                .into_iter()
                .find(|mode| mode.as_str().eq_ignore_ascii_case(answer))
        },
    )?;

    let url = ask_valid(
        prompter,
        "Run e2e tests against given url instead of auto-starting dev server",
        None,
        |answer| Some(answer.to_string()),
    )?;

    let spec = ask_valid(
        prompter,
        "Spec pattern, one file or a glob pattern",
        None,
        |answer| (!answer.is_empty()).then(|| answer.to_string()),
    )?;

    let threads = ask_valid(
        prompter,
        "Number of test-runner processes to start",
        Some("2"),
        |answer| answer.parse::<ThreadCount>().ok(),
    )?;

    let headless = ask_valid(
        prompter,
        "Run in headless mode without GUI? (y/N)",
        Some("n"),
        |answer| match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(true),
            "n" | "no" => Some(false),
            _ => None,
        },
    )?;

    Ok(WizardAnswers {
        headless,
        mode,
        url,
        spec,
        threads,
    })
}

fn ask_valid<T>(
    prompter: &mut dyn Prompter,
    question: &str,
    default: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> io::Result<T> {
    for _ in 0..MAX_ATTEMPTS {
        let answer = prompter.ask(question, default)?;
        let answer = answer.trim();
        let answer = if answer.is_empty() {
            default.unwrap_or_default()
        } else {
            answer
        };

        if let Some(value) = parse(answer) {
            return Ok(value);
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("No valid answer to `{question}`"),
    ))
}
