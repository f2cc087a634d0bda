pub mod query;
pub mod selection;
pub mod settings;
pub mod tree;
