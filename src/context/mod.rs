use crate::command;
use crate::settings::Settings;
use std::fmt;
use std::path::Path;

/// Marker file → project type label. Checked in order; the first marker
/// present in the project root decides the label.
pub const PROJECT_MARKERS: &[(&str, &str)] = &[
    ("package.json", "Node.js/JavaScript"),
    ("pyproject.toml", "Python"),
    ("Cargo.toml", "Rust"),
    ("go.mod", "Go"),
    ("pom.xml", "Java/Maven"),
    ("build.gradle", "Java/Gradle"),
    ("composer.json", "PHP"),
    ("Gemfile", "Ruby"),
];

pub const NO_CONTEXT: &str = "Kein spezifischer Projekt-Kontext verfügbar";

/// Human-readable facts about the project, one per line.
///
/// Never empty once built by [`collect`]: if nothing could be gathered it
/// holds the [`NO_CONTEXT`] placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    facts: Vec<String>,
}

impl ProjectContext {
    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    fn from_facts(facts: Vec<String>) -> Self {
        if facts.is_empty() {
            Self {
                facts: vec![NO_CONTEXT.to_string()],
            }
        } else {
            Self { facts }
        }
    }
}

impl fmt::Display for ProjectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.facts.join("\n"))
    }
}

/// Gather branch, recent changes and project type for `project_dir`.
///
/// Each fact is independent and silently omitted when it can't be
/// determined. Only reads: runs `git` queries and checks for marker files.
pub fn collect(project_dir: &Path, settings: &Settings) -> ProjectContext {
    let facts = [
        current_branch(project_dir, settings).map(|b| format!("Git-Branch: {b}")),
        recent_changes(project_dir, settings)
            .map(|files| format!("Kürzlich geändert: {}", files.join(", "))),
        project_type(project_dir).map(|t| format!("Projekt-Typ: {t}")),
    ];
    ProjectContext::from_facts(facts.into_iter().flatten().collect())
}

// ---------------------------------------------------------------
// Individual facts
// ---------------------------------------------------------------

fn git(project_dir: &Path, settings: &Settings, args: &[&str]) -> Option<String> {
    command::capture(&settings.git_program, args, project_dir, settings.git_timeout())
}

/// Name of the checked-out branch. `None` on a detached HEAD, outside a
/// repository, or when git is unavailable.
pub fn current_branch(project_dir: &Path, settings: &Settings) -> Option<String> {
    git(project_dir, settings, &["branch", "--show-current"])
}

/// Paths that differ between the working tree and `settings.diff_base`,
/// limited to the first `settings.max_recent_files` in git's order.
pub fn recent_changes(project_dir: &Path, settings: &Settings) -> Option<Vec<String>> {
    let out = git(
        project_dir,
        settings,
        &["diff", "--name-only", &settings.diff_base, "--", "."],
    )?;
    let files: Vec<String> = out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(settings.max_recent_files)
        .map(String::from)
        .collect();
    if files.is_empty() { None } else { Some(files) }
}

/// Label of the first marker file found in [`PROJECT_MARKERS`] order.
pub fn project_type(project_dir: &Path) -> Option<&'static str> {
    PROJECT_MARKERS
        .iter()
        .find(|(marker, _)| project_dir.join(marker).exists())
        .map(|(_, label)| *label)
}
