use crate::context::ProjectContext;
use crate::settings::Settings;
use anyhow::{Context, Result};
use minijinja::{Environment, context};
use std::fmt;
use std::io::Write;

/// Operating rules for the refiner model.
pub const SYSTEM_PROMPT: &str = "\
Du bist ein Prompt-Refiner für einen Coding-Agenten (Claude Code).

Analysiere den User-Prompt und liefere zusätzlichen Kontext, der dem \
Haupt-Agenten hilft, die Aufgabe richtig zu verstehen.

Regeln:
1. Mache implizite Annahmen explizit
2. Nenne relevante technische Details aus dem Projekt-Kontext
3. Schlage vor, welche Dateien oder Bereiche relevant sein könnten
4. Fasse dich kurz und präzise (höchstens 5-8 Zeilen)
5. Antworte in der Sprache des Users
6. Erfinde KEINE neuen Aufgaben, kläre nur die bestehende
7. Ist der Prompt bereits klar und vollständig, antworte nur mit \"SKIP\"

Antworte NUR mit dem zusätzlichen Kontext, ohne Erklärungen oder Meta-Kommentare.";

/// Default user message. Sees `context` and `prompt`.
pub const DEFAULT_USER_TEMPLATE: &str = "\
PROJEKT-KONTEXT:
{{ context }}

USER-PROMPT:
{{ prompt }}

Gib zusätzlichen Kontext für den Coding-Agenten.";

/// Reply meaning "the prompt needs no augmentation".
pub const SKIP_SENTINEL: &str = "SKIP";

/// Replies shorter than this (in characters, after trimming) are treated as
/// noise.
pub const MIN_NOTE_CHARS: usize = 10;

// ===================================================================
// Provider capability
// ===================================================================

/// One completion round trip: a system instruction plus a single user
/// message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: String,
    pub user: String,
}

#[derive(Debug)]
pub enum ProviderError {
    /// No API key in the environment.
    MissingApiKey,
    /// Transport failure: DNS, connect, TLS, timeout.
    Unreachable(String),
    /// Non-success HTTP status or an error object in the body.
    Api { status: Option<u16>, message: String },
    /// Body that doesn't look like a completion.
    MalformedResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingApiKey => write!(f, "ANTHROPIC_API_KEY is not set"),
            ProviderError::Unreachable(msg) => write!(f, "provider unreachable: {msg}"),
            ProviderError::Api {
                status: Some(status),
                message,
            } => write!(f, "provider error (HTTP {status}): {message}"),
            ProviderError::Api {
                status: None,
                message,
            } => write!(f, "provider error: {message}"),
            ProviderError::MalformedResponse(msg) => write!(f, "malformed provider response: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Something that can turn a [`CompletionRequest`] into text.
pub trait CompletionProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

impl<P: CompletionProvider + ?Sized> CompletionProvider for &P {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        (**self).complete(request)
    }
}

impl<P: CompletionProvider + ?Sized> CompletionProvider for Box<P> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        (**self).complete(request)
    }
}

// ===================================================================
// Refinement
// ===================================================================

/// The prompt as typed plus the serialized project context, exactly as
/// they are handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementRequest {
    prompt: String,
    context: String,
}

impl RefinementRequest {
    pub fn new(prompt: &str, context: &ProjectContext) -> Self {
        Self {
            prompt: prompt.to_string(),
            context: context.to_string(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefinementResult {
    /// Nothing to add, or nothing could be obtained.
    Empty,
    Text(String),
}

/// Map a raw provider reply to a result: trimmed text, unless it is the
/// sentinel (any case) or too short to be a note.
pub fn normalize(reply: &str) -> RefinementResult {
    let note = reply.trim();
    if note.eq_ignore_ascii_case(SKIP_SENTINEL) || note.chars().count() < MIN_NOTE_CHARS {
        RefinementResult::Empty
    } else {
        RefinementResult::Text(note.to_string())
    }
}

pub struct Refiner<'a, P> {
    provider: P,
    settings: &'a Settings,
}

impl<'a, P: CompletionProvider> Refiner<'a, P> {
    pub fn new(provider: P, settings: &'a Settings) -> Self {
        Self { provider, settings }
    }

    /// Ask the provider for a note on `prompt`. Never fails: any error is
    /// written as one line to `diagnostics` and becomes
    /// [`RefinementResult::Empty`].
    pub fn refine(
        &self,
        prompt: &str,
        context: &ProjectContext,
        diagnostics: &mut dyn Write,
    ) -> RefinementResult {
        let request = RefinementRequest::new(prompt, context);
        match self.try_refine(&request) {
            Ok(result) => result,
            Err(err) => {
                let _ = writeln!(diagnostics, "prompt-refiner: refinement failed: {err:#}");
                RefinementResult::Empty
            }
        }
    }

    fn try_refine(&self, request: &RefinementRequest) -> Result<RefinementResult> {
        let completion = self.completion_request(request)?;
        let reply = self
            .provider
            .complete(&completion)
            .with_context(|| format!("calling {}", completion.model))?;
        Ok(normalize(&reply))
    }

    /// Build the provider request: fixed system prompt, rendered user message.
    pub fn completion_request(&self, request: &RefinementRequest) -> Result<CompletionRequest> {
        let template = self.settings.load_user_template()?;
        let user = render_user_message(
            template.as_deref().unwrap_or(DEFAULT_USER_TEMPLATE),
            request,
        )?;
        Ok(CompletionRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            user,
        })
    }
}

fn render_user_message(template: &str, request: &RefinementRequest) -> Result<String> {
    let env = Environment::new();
    let tmpl = env
        .template_from_str(template)
        .context("parsing user message template")?;
    tmpl.render(context! {
        context => request.context(),
        prompt => request.prompt(),
    })
    .context("rendering user message template")
}
