use crate::error::ToolError;
use crate::protocol::{ToolDescriptor, ToolResponse};
use crate::schema::{InputSchema, ToolInput};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Boxed future returned by a tool handler
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ToolResponse, ToolError>> + Send>>;

/// Validates raw arguments and starts the typed handler
type BoxedHandler = Box<dyn Fn(&Value) -> Result<ToolFuture, ToolError> + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
}

struct RegisteredTool {
    name: String,
    description: String,
    schema: InputSchema,
    handler: BoxedHandler,
}

/// Named operations with declared input schemas
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool whose arguments are the record `I`.
    ///
    /// The handler only ever sees arguments that passed `I::schema()`.
    pub fn register<I, F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        I: ToolInput + Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResponse, ToolError>> + Send + 'static,
    {
        if self.tools.iter().any(|t| t.name == name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let schema = I::schema();
        let validator = schema.clone();
        let boxed: BoxedHandler = Box::new(move |args: &Value| {
            let validated = validator.validate(args).map_err(ToolError::Validation)?;
            let input = I::from_validated(&validated)
                .map_err(|e| ToolError::Validation(vec![e]))?;
            Ok(Box::pin(handler(input)) as ToolFuture)
        });

        debug!("Registered tool {}", name);
        self.tools.push(RegisteredTool {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler: boxed,
        });
        Ok(())
    }

    /// Tools in registration order
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.schema.to_json_schema(),
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Validate `args` against the tool's schema, then run its handler.
    ///
    /// Validation failures are returned before the handler is touched, so no
    /// external call happens for a bad request.
    pub async fn call(&self, name: &str, args: &Value) -> Result<ToolResponse, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let future = match (tool.handler)(args) {
            Ok(future) => future,
            Err(e) => {
                warn!("Rejected call to {}: {}", name, e);
                return Err(e);
            }
        };

        info!("Running tool {}", name);
        let result = future.await;
        match &result {
            Ok(_) => info!("Tool {} completed", name),
            Err(e) => warn!("Tool {} failed at {} stage: {}", name, e.stage(), e),
        }
        result
    }
}
