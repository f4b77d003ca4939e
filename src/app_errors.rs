use anyhow::Context;
use std::panic::Location;

/// Wraps any error into `anyhow::Error` tagged with the caller's location.
pub trait DefaultContext<T> {
    fn dc(self) -> Result<T, anyhow::Error>;
}

impl<T, E> DefaultContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[track_caller]
    fn dc(self) -> Result<T, anyhow::Error> {
        let caller = Location::caller();
        self.with_context(|| format!("at {caller}"))
    }
}
