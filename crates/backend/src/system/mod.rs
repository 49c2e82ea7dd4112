pub mod oauth;
pub mod tasks;
pub mod tenant_locks;
pub mod tracing;
