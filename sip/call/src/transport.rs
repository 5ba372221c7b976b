use crate::sip::{OutgoingRequest, Response};
use std::error::Error;
use std::fmt::Debug;

/// Sends the SIP messages of a call
///
/// Implementations own the dialog. They map CSeq numbers to transactions, fill in the dialog
/// headers and render the SDP as `application/sdp` body.
#[async_trait::async_trait]
pub trait SipTransport: Send + 'static {
    type Error: Debug + Error + Send;

    async fn send_request(&mut self, request: OutgoingRequest) -> Result<(), Self::Error>;

    async fn send_response(&mut self, response: Response) -> Result<(), Self::Error>;
}
