/// Scriptable cache model.
pub mod cache;
