//! Browser session creation.
//!
//! The hooks own exactly one live session at a time and ask a
//! [`SessionFactory`] for a new one at run start and whenever the current
//! session stops answering.

use crate::driver::Driver;
use crate::result::HarnessResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Creates browser sessions
#[async_trait]
pub trait SessionFactory: Send + Sync + fmt::Debug {
    /// Start a fresh session
    async fn create(&self) -> HarnessResult<Arc<dyn Driver>>;
}

/// Launches Chromium over CDP with the harness configuration
#[cfg(feature = "browser")]
#[derive(Debug, Clone)]
pub struct ChromiumSessionFactory {
    config: Arc<crate::config::HarnessConfig>,
}

#[cfg(feature = "browser")]
impl ChromiumSessionFactory {
    /// Factory for `config`
    #[must_use]
    pub const fn new(config: Arc<crate::config::HarnessConfig>) -> Self {
        Self { config }
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn create(&self) -> HarnessResult<Arc<dyn Driver>> {
        let driver = crate::browser::ChromiumDriver::launch(&self.config).await?;
        Ok(Arc::new(driver))
    }
}

/// Factory backed by a closure
///
/// Used with [`crate::mock::MockDriver`] to run scenarios in memory.
pub struct FnSessionFactory<F> {
    make: F,
}

impl<F> FnSessionFactory<F>
where
    F: Fn() -> HarnessResult<Arc<dyn Driver>> + Send + Sync,
{
    /// Wrap `make`
    #[must_use]
    pub const fn new(make: F) -> Self {
        Self { make }
    }
}

impl<F> fmt::Debug for FnSessionFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSessionFactory").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> SessionFactory for FnSessionFactory<F>
where
    F: Fn() -> HarnessResult<Arc<dyn Driver>> + Send + Sync,
{
    async fn create(&self) -> HarnessResult<Arc<dyn Driver>> {
        (self.make)()
    }
}
