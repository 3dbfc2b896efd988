pub mod kv;
pub mod manager;
