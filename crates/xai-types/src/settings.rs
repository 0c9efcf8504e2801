//! Per-request settings.

use serde::{Deserialize, Serialize};

/// Optional per-request tuning knobs.
///
/// Every field is optional; `None` means the provider default applies. The
/// struct is the closed set of options the adapter supports, so there is no
/// "unsupported setting" case to reject at request time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSettings {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
    pub seed: Option<u64>,
    pub parallel_tool_calls: Option<bool>,
}
