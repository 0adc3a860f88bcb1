use crate::classify::{Classification, classify};
use crate::context;
use crate::refine::{CompletionProvider, ProviderError, RefinementResult, Refiner};
use crate::settings::Settings;
use crate::types::{HookInput, augmentation_block};
use std::io::{Read, Write};
use std::path::Path;

/// The hook never reports failure to the host.
pub const EXIT_OK: i32 = 0;

/// One `UserPromptSubmit` invocation against a project directory.
pub struct Hook<'a> {
    pub project_dir: &'a Path,
    pub settings: &'a Settings,
}

impl<'a> Hook<'a> {
    pub fn new(project_dir: &'a Path, settings: &'a Settings) -> Self {
        Self {
            project_dir,
            settings,
        }
    }

    /// Read the envelope from `stdin`, and if the prompt is worth it, write
    /// an augmentation block to `stdout`.
    ///
    /// `connect` builds the completion provider and is only called once a
    /// prompt has passed the classifier. Every failure ends in silence on
    /// `stdout`; provider failures leave one line on `stderr`.
    pub fn run<P, F>(
        &self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        connect: F,
    ) -> i32
    where
        P: CompletionProvider,
        F: FnOnce(&Settings) -> Result<P, ProviderError>,
    {
        let mut raw = String::new();
        if stdin.read_to_string(&mut raw).is_err() {
            return EXIT_OK;
        }
        let input = match HookInput::parse(&raw) {
            Ok(input) => input,
            Err(err) => {
                self.trace(stderr, format_args!("ignoring unparseable input: {err}"));
                return EXIT_OK;
            }
        };

        if let Some(note) = self.augment(&input.prompt, stderr, connect) {
            let _ = writeln!(stdout, "{}", augmentation_block(&note));
            let _ = stdout.flush();
        }
        EXIT_OK
    }

    fn augment<P, F>(&self, prompt: &str, stderr: &mut dyn Write, connect: F) -> Option<String>
    where
        P: CompletionProvider,
        F: FnOnce(&Settings) -> Result<P, ProviderError>,
    {
        if let Classification::Skip(reason) = classify(prompt) {
            self.trace(stderr, format_args!("skipped: {reason}"));
            return None;
        }

        let ctx = context::collect(self.project_dir, self.settings);
        for fact in ctx.facts() {
            self.trace(stderr, format_args!("context: {fact}"));
        }

        let provider = match connect(self.settings) {
            Ok(provider) => provider,
            Err(err) => {
                let _ = writeln!(stderr, "prompt-refiner: refinement failed: {err}");
                return None;
            }
        };

        match Refiner::new(provider, self.settings).refine(prompt, &ctx, stderr) {
            RefinementResult::Text(note) => Some(note),
            RefinementResult::Empty => {
                self.trace(stderr, format_args!("no augmentation"));
                None
            }
        }
    }

    fn trace(&self, stderr: &mut dyn Write, message: std::fmt::Arguments<'_>) {
        if self.settings.debug {
            let _ = writeln!(stderr, "prompt-refiner: {message}");
        }
    }
}
