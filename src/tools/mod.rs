// tool registry and the appointment tools it serves

mod agenda;
mod handler;
mod registry;

pub use agenda::default_registry;
pub use handler::{ToolContext, ToolDef, ToolHandler, ToolOutput};
pub use registry::ToolRegistry;
