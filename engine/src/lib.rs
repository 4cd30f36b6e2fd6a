pub mod policy;
pub mod reminder;
pub mod service;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;
