mod descriptor;
mod error;
mod process;
mod registry;
mod schema;

pub use descriptor::{LocalTool, ToolDescriptor, ToolInvoker};
pub use error::{RegistryError, ToolError, ValidationError};
pub use process::{ConnectionState, ProviderClient, RemoteToolInfo};
pub use registry::{ProviderGuidance, ToolRegistry, ToolSource};
pub use schema::{InputSchema, PropertyKind, Strictness, ToolArgs, json_type_name, validate};
