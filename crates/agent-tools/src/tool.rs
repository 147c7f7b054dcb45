//! Tool trait definition

use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A named data capability an analyzer may call during its stage
///
/// Every capability is a function of the stock symbol alone. Implementations
/// must be safe to call concurrently and must not mutate shared state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Fetch the capability's data for `symbol`
    ///
    /// Fails with [`agent_core::Error::DataUnavailable`] when no data can be
    /// produced for the symbol.
    async fn invoke(&self, symbol: &str) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Short human-readable description, shown to the model next to the data
    fn description(&self) -> &str;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}
