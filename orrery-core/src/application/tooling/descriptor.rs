use super::error::ToolError;
use super::schema::{InputSchema, ToolArgs};
use crate::types::ToolSpec;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Invocation half of a [`ToolDescriptor`].
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// A compiled-in tool. Receives validated arguments only; it has no access to
/// the session or the registry.
#[async_trait]
pub trait LocalTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn input_schema(&self) -> InputSchema;

    async fn call(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// Name, description, schema and invocation of one registered tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: InputSchema,
    invoker: Arc<dyn ToolInvoker>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            invoker,
        }
    }

    pub fn from_local(tool: Arc<dyn LocalTool>) -> Self {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        let input_schema = tool.input_schema();
        Self::new(name, description, input_schema, Arc::new(LocalInvoker(tool)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.raw().clone(),
        }
    }

    pub async fn invoke(&self, args: ToolArgs) -> Result<String, ToolError> {
        self.invoker.invoke(args).await
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", self.input_schema.raw())
            .finish_non_exhaustive()
    }
}

struct LocalInvoker(Arc<dyn LocalTool>);

#[async_trait]
impl ToolInvoker for LocalInvoker {
    async fn invoke(&self, args: ToolArgs) -> Result<String, ToolError> {
        self.0.call(args).await
    }
}
