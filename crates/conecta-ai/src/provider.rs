use async_trait::async_trait;

use crate::{CallOverrides, ChatReply, Message};

// ---------------------------------------------------------------------------
// AiProvider
// ---------------------------------------------------------------------------

/// Capability contract implemented once per vendor.
///
/// Transport, authentication, and rate-limit failures surface as typed
/// errors from [`chat`](AiProvider::chat). Model-level refusals are ordinary
/// successful completions and must not be turned into errors.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Registry key for this provider ("groq", "gemini", "openai", "claude").
    fn name(&self) -> &str;

    /// Send the conversation and return the normalized completion.
    async fn chat(
        &self,
        messages: &[Message],
        overrides: Option<&CallOverrides>,
    ) -> conecta_types::Result<ChatReply>;

    /// Issue a minimal probe request. Returns `false` on any error without
    /// propagating it.
    async fn health_check(&self) -> bool;

    /// Best-effort, non-authoritative cost estimate in USD. Observability
    /// only; routing never reads this.
    fn estimate_cost(&self, messages: &[Message]) -> f64;
}

// ---------------------------------------------------------------------------
// Cost estimation helpers
// ---------------------------------------------------------------------------

/// Output tokens assumed for an average support reply.
const ESTIMATED_OUTPUT_TOKENS: u64 = 500;

/// Rough token count for a conversation: total characters / 4.
pub(crate) fn estimate_input_tokens(messages: &[Message]) -> u64 {
    let chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    chars.div_ceil(4) as u64
}

/// Price a conversation against a per-million-token input/output rate pair.
pub(crate) fn estimate_cost_usd(
    messages: &[Message],
    input_per_million: f64,
    output_per_million: f64,
) -> f64 {
    let input_tokens = estimate_input_tokens(messages) as f64;
    let input_cost = input_tokens / 1_000_000.0 * input_per_million;
    let output_cost = ESTIMATED_OUTPUT_TOKENS as f64 / 1_000_000.0 * output_per_million;
    input_cost + output_cost
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
