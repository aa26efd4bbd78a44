mod registry;

pub use registry::SessionRegistry;
