//! Specialized resolvers, one per fact kind.
//!
//! Each resolver owns a pending buffer and a flush that runs the same
//! create-then-fetch sequence: bulk insert-or-ignore everything pending,
//! then fetch constrained to exactly the pending keys. Flushes leave the
//! buffers intact; the session clears them once a whole cycle has landed.

pub mod machines;
pub mod names;
pub mod options;
pub mod pending;
pub mod platforms;

pub use machines::MachineResolver;
pub use names::NameResolver;
pub use options::OptionSetResolver;
pub use pending::PendingSet;
pub use platforms::PlatformResolver;
