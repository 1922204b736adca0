//! Real service implementations for production use

pub mod credentials;
pub mod platform;
pub mod retry;

#[cfg(test)]
mod tests;

pub use credentials::EnvCredentialSource;
pub use platform::RestPlatformClient;
pub use retry::{with_retry, RetryPolicy};
