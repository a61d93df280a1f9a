use async_trait::async_trait;

use crate::error::WorkqError;

/// The callback a work item runs once a worker claims it.
///
/// The argument is opaque to the queue; it is handed back unchanged.
#[async_trait]
pub trait WorkHandler: Send + Sync {
    async fn run(&self, arg: &serde_json::Value) -> Result<(), WorkqError>;
}

/// Adapts a plain closure into a `WorkHandler`.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&serde_json::Value) -> Result<(), WorkqError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> WorkHandler for FnHandler<F>
where
    F: Fn(&serde_json::Value) -> Result<(), WorkqError> + Send + Sync,
{
    async fn run(&self, arg: &serde_json::Value) -> Result<(), WorkqError> {
        (self.f)(arg)
    }
}
