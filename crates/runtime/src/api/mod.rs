//! Public SDK API surface.
//!
//! This module gathers the types exposed to host applications so other
//! layers can stay focused on the session, workers, or transport.

pub mod errors;
pub mod handle;
pub mod presenter;

pub use errors::{Result, SdkError};
pub use handle::BehaveHandle;
pub use presenter::RewardPresenter;
