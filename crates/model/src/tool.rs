use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Stable wire name of the tool, e.g. `get_us_debt`.
    pub name: String,
    /// Description of the tool.
    ///
    /// This is the only usage contract the model sees, so it should spell
    /// out operators, syntax and defaults rather than just naming the tool.
    pub description: String,
    /// Parameters definition of the tool, as a
    /// [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The arguments object to pass to the tool.
    pub arguments: Value,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The identifier of the request this result answers.
    pub id: String,
    /// The textual output of the tool.
    pub content: String,
}
