pub mod deadline;
pub mod engine;
pub mod resolver;

pub use deadline::Deadline;
pub use engine::UsageQueryEngine;
pub use resolver::ResolvedTarget;
