use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// One or more `-x` / `--word` tokens and nothing else.
static FLAGS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-{1,2}\w+\s*)+$").expect("static regex"));

const COMMAND_PREFIX: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing but whitespace.
    Empty,
    /// A slash command without arguments, e.g. `/help`.
    CommandOnly,
    /// A slash command whose arguments are all flags, e.g. `/model --verbose -v`.
    FlagsOnly,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty prompt"),
            SkipReason::CommandOnly => write!(f, "command without arguments"),
            SkipReason::FlagsOnly => write!(f, "command with flags only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Skip(SkipReason),
    Proceed,
}

/// Decide whether a prompt carries enough substance to be worth refining.
///
/// Rules are checked in order and the first match wins:
///
/// 1. blank after trimming → skip
/// 2. not a slash command → proceed
/// 3. slash command with no remainder → skip
/// 4. remainder made only of flag tokens → skip
/// 5. anything else → proceed
pub fn classify(prompt: &str) -> Classification {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Classification::Skip(SkipReason::Empty);
    }
    if !prompt.starts_with(COMMAND_PREFIX) {
        return Classification::Proceed;
    }

    let args = match prompt.split_once(char::is_whitespace) {
        Some((_command, rest)) => rest.trim(),
        None => return Classification::Skip(SkipReason::CommandOnly),
    };

    if FLAGS_ONLY.is_match(args) {
        Classification::Skip(SkipReason::FlagsOnly)
    } else {
        Classification::Proceed
    }
}
