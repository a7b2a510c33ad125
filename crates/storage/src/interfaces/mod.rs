mod args;
mod metadata;
mod rpc;
mod slot;

// re-export the public interface
pub use args::*;
pub use metadata::*;
pub use rpc::*;
pub use slot::*;
