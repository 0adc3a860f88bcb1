use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_DIR: &str = ".claude";
const FILENAME: &str = "prompt-refiner.toml";

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// Template for the user message sent to the refiner model: either an inline
/// Jinja2 string or a path to a template file (relative to `.claude/`).
///
/// ```toml
/// [user_template]
/// inline = "{{ context }}\n\n{{ prompt }}"
///
/// # — or —
///
/// [user_template]
/// file = "refiner-message.tmpl"
/// ```
///
/// Both forms see the variables `context` and `prompt`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum UserTemplate {
    Inline(String),
    File(String),
}

/// Settings read from `.claude/prompt-refiner.toml` in the project directory.
///
/// Every key is optional. Unlike a preferences file this one is never
/// written back: a hook that runs on every prompt must not touch the project.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    /// Model identifier sent to the completion provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// Output token budget for the refinement note.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Base URL of the Messages API. `ANTHROPIC_BASE_URL` wins over this.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,

    /// Version-control binary used for the branch and diff queries.
    #[serde(default = "default_git_program")]
    pub git_program: String,

    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,

    /// Revision the recent-changes diff is taken against.
    #[serde(default = "default_diff_base")]
    pub diff_base: String,

    #[serde(default = "default_max_recent_files")]
    pub max_recent_files: usize,

    /// Trace pipeline decisions to stderr.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub user_template: Option<UserTemplate>,

    /// Directory relative template files are resolved against. Not part of
    /// the file format.
    #[serde(skip)]
    pub template_dir: PathBuf,
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.into()
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_git_program() -> String {
    "git".into()
}

fn default_git_timeout_secs() -> u64 {
    5
}

fn default_diff_base() -> String {
    "HEAD~3".into()
}

fn default_max_recent_files() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_base_url: default_api_base_url(),
            api_timeout_secs: default_api_timeout_secs(),
            git_program: default_git_program(),
            git_timeout_secs: default_git_timeout_secs(),
            diff_base: default_diff_base(),
            max_recent_files: default_max_recent_files(),
            debug: false,
            user_template: None,
            template_dir: PathBuf::from(SETTINGS_DIR),
        }
    }
}

impl Settings {
    /// Defaults, with template files resolved under `project_dir/.claude`.
    pub fn defaults_for(project_dir: &Path) -> Self {
        Self {
            template_dir: project_dir.join(SETTINGS_DIR),
            ..Self::default()
        }
    }

    /// Load settings for `project_dir` from `.claude/prompt-refiner.toml`.
    ///
    /// A missing file yields the defaults. Missing keys in an existing file
    /// are filled in with defaults via serde.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let dir = project_dir.join(SETTINGS_DIR);
        let path = dir.join(FILENAME);
        let mut settings = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Settings>(&contents)
                .with_context(|| format!("parsing {}", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::defaults_for(project_dir)),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        settings.template_dir = dir;
        Ok(settings)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    /// Resolve the user-message template override, if one is configured.
    pub fn load_user_template(&self) -> Result<Option<String>> {
        match &self.user_template {
            None => Ok(None),
            Some(UserTemplate::Inline(s)) => Ok(Some(s.clone())),
            Some(UserTemplate::File(filename)) => {
                let path = self.template_dir.join(filename);
                fs::read_to_string(&path)
                    .map(Some)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }
}
