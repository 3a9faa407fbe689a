mod token_registry;

pub use token_registry::TokenRegistryRecord;
