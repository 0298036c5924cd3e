//! State that outlives a single generation pass.

pub mod dependencies;
pub mod expansion;

pub use dependencies::DependencyCache;
pub use expansion::ExpansionStore;
