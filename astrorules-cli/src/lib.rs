// All extraction functionality is in astrorules-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod paths;

// Re-export core types for convenience
pub use astrorules_core::*;
