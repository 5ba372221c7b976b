use crate::events::MediaRequest;
use std::error::Error;
use std::fmt::Debug;

/// Executes the media requests of a call
///
/// Completions are reported back asynchronously using the
/// [`CallHandle`](crate::async_wrapper::CallHandle), e.g. with `complete_sending_state_change`.
#[async_trait::async_trait]
pub trait MediaLayer: Send + 'static {
    type Error: Debug + Error + Send;

    async fn request(&mut self, request: MediaRequest) -> Result<(), Self::Error>;
}
