pub mod walk;

pub use walk::{recent_days_cutoff, DiscoveryFilter, FileDiscoverer, SourceFile};
