use serde::de::DeserializeOwned;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::core::ToolGroup;
use crate::core::action::descriptor::ActionDescriptor;
use crate::core::options::{RunOptions, Verbosity};
use crate::core::parallel;
use crate::core::session::Session;
use crate::error::{ActionError, ModelError, SelectionError};
use crate::model::binding::ProviderBinding;
use crate::model::criteria::ModelSelectionCriteria;
use crate::model::selector::ModelSelector;
use crate::model::{LlmOptions, ModelRequest};

/// What an action body can see and do while it runs.
///
/// The session is read-only here; the executor binds the action's result once
/// the body returns.
pub struct ActionContext<'a> {
    session: &'a Session,
    selector: &'a ModelSelector,
    options: &'a RunOptions,
    action: &'a ActionDescriptor,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        session: &'a Session,
        selector: &'a ModelSelector,
        options: &'a RunOptions,
        action: &'a ActionDescriptor,
    ) -> Self {
        ActionContext {
            session,
            selector,
            options,
            action,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn action(&self) -> &ActionDescriptor {
        self.action
    }

    /// Tool groups this action declared; the executor has already checked them.
    pub fn tool_groups(&self) -> &[ToolGroup] {
        &self.action.tool_groups
    }

    pub fn verbosity(&self) -> &Verbosity {
        &self.options.verbosity
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.options.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.options.cancellation.is_cancelled()
    }

    pub fn select_model(
        &self,
        criteria: &ModelSelectionCriteria,
    ) -> Result<ProviderBinding, SelectionError> {
        self.selector.select(criteria)
    }

    /// Resolves a model and sends it a single prompt, returning the text reply.
    pub async fn prompt(&self, options: &LlmOptions, prompt: impl Into<String>) -> Result<String, ActionError> {
        if self.is_cancelled() {
            return Err(ActionError::Cancelled);
        }
        let binding = self.select_model(&options.criteria)?;
        let prompt = prompt.into();

        if self.options.verbosity.show_prompts {
            log::info!("[{}] Prompt to '{}':\n{}", self.action.name, binding.name(), prompt);
        }

        let request = ModelRequest {
            model: binding.name().to_string(),
            prompt,
            system: options.system.clone(),
            temperature: options.temperature,
            tool_groups: self.action.tool_groups.clone(),
        };
        let response = binding.complete(request).await?;

        if self.options.verbosity.show_llm_responses {
            log::info!("[{}] Response from '{}':\n{}", self.action.name, binding.name(), response.content);
        }
        if let Some(usage) = response.usage {
            log::debug!(
                "[{}] '{}' used {} input / {} output tokens (${:.6})",
                self.action.name,
                binding.name(),
                usage.input_tokens,
                usage.output_tokens,
                binding.pricing().cost_of(usage)
            );
        }

        Ok(response.content)
    }

    /// Like [`prompt`](Self::prompt), but parses the reply as JSON into `T`.
    pub async fn prompt_for<T: DeserializeOwned>(
        &self,
        options: &LlmOptions,
        prompt: impl Into<String>,
    ) -> Result<T, ActionError> {
        let raw = self.prompt(options, prompt).await?;
        serde_json::from_str(strip_code_fence(&raw)).map_err(|e| {
            ActionError::Model(ModelError::InvalidResponse(format!(
                "expected JSON: {} (reply was: {})",
                e, raw
            )))
        })
    }

    /// Applies `f` to every item with at most the run's concurrency limit in flight.
    ///
    /// Results come back in input order. The first failure aborts the rest.
    pub async fn parallel_map<T, R, F, Fut>(&self, items: Vec<T>, f: F) -> Result<Vec<R>, ActionError>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R, ActionError>>,
    {
        parallel::parallel_map(items, self.options.concurrency_limit, &self.options.cancellation, f).await
    }
}

// Models often wrap JSON replies in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TypeTag;
    use crate::model::binding::PricingModel;
    use crate::model::registry::ProviderRegistry;
    use crate::model::{ModelHandle, ModelResponse};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Replies with a fixed text and remembers the last request.
    struct Recording {
        reply: String,
        last: Mutex<Option<ModelRequest>>,
    }

    #[async_trait]
    impl ModelHandle for Recording {
        async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            *self.last.lock().unwrap() = Some(request);
            Ok(ModelResponse::text(self.reply.clone()))
        }
    }

    fn selector_with(reply: &str) -> (ModelSelector, Arc<Recording>) {
        let handle = Arc::new(Recording {
            reply: reply.to_string(),
            last: Mutex::new(None),
        });
        let registry = ProviderRegistry::new();
        registry
            .register_provider(ProviderBinding::new(
                "x-small",
                "Test",
                PricingModel::Free,
                handle.clone(),
            ))
            .unwrap();
        (ModelSelector::new(Arc::new(registry)), handle)
    }

    #[tokio::test]
    async fn test_prompt_passes_tool_groups_and_options() {
        let (selector, handle) = selector_with("Louvre, Orsay");
        let session = Session::new();
        let options = RunOptions::default();
        let action = ActionDescriptor::new("find", "Ideas").tool_group("web");
        let ctx = ActionContext::new(&session, &selector, &options, &action);

        let reply = ctx
            .prompt(&LlmOptions::by_name("x-small").with_temperature(0.2), "Ideas for Paris?")
            .await
            .unwrap();

        assert_eq!(reply, "Louvre, Orsay");
        let request = handle.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "x-small");
        assert_eq!(request.prompt, "Ideas for Paris?");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.tool_groups, vec![ToolGroup::new("web")]);
    }

    #[tokio::test]
    async fn test_prompt_with_unknown_model_is_selection_error() {
        let (selector, _) = selector_with("");
        let session = Session::new();
        let options = RunOptions::default();
        let action = ActionDescriptor::new("find", "Ideas");
        let ctx = ActionContext::new(&session, &selector, &options, &action);

        let result = ctx.prompt(&LlmOptions::by_name("x-medium"), "hi").await;
        assert!(matches!(result, Err(ActionError::Selection(_))));
    }

    #[tokio::test]
    async fn test_prompt_for_parses_fenced_json() {
        #[derive(Debug, Deserialize)]
        struct Ideas {
            points: Vec<String>,
        }

        let (selector, _) = selector_with("```json\n{\"points\": [\"Louvre\"]}\n```");
        let session = Session::new();
        let options = RunOptions::default();
        let action = ActionDescriptor::new("find", "Ideas");
        let ctx = ActionContext::new(&session, &selector, &options, &action);

        let ideas: Ideas = ctx.prompt_for(&LlmOptions::default(), "json please").await.unwrap();
        assert_eq!(ideas.points, vec!["Louvre"]);
    }

    #[tokio::test]
    async fn test_cancelled_context_refuses_prompt() {
        let (selector, handle) = selector_with("unused");
        let session = Session::new();
        let options = RunOptions::default();
        options.cancellation.cancel();
        let action = ActionDescriptor::new("find", "Ideas");
        let ctx = ActionContext::new(&session, &selector, &options, &action);

        assert!(matches!(
            ctx.prompt(&LlmOptions::default(), "hi").await,
            Err(ActionError::Cancelled)
        ));
        assert!(handle.last.lock().unwrap().is_none());
    }

    #[test]
    fn test_context_exposes_session() {
        let (selector, _) = selector_with("");
        let session = Session::seeded(&crate::core::TypedValue::new("Brief", json!("Paris")));
        let options = RunOptions::default();
        let action = ActionDescriptor::new("find", "Ideas");
        let ctx = ActionContext::new(&session, &selector, &options, &action);

        assert_eq!(ctx.session().get(&TypeTag::new("Brief")), Some(&json!("Paris")));
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    fn _assert_sync() {
        fn is_sync<T: Sync>() {}
        is_sync::<ActionContext<'static>>();
    }
}
