//! Delivery of round messages to peers.

use async_trait::async_trait;

use crate::{DkgError, Round1Message, Round2Message};

/// Sends round messages to a peer located at `url`.
///
/// An error means the peer did not accept the message; the ceremony
/// redelivers with backoff until the round deadline.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Deliver a round-1 message.
    async fn send_round1(&self, url: &str, msg: &Round1Message) -> Result<(), DkgError>;

    /// Deliver a round-2 message.
    async fn send_round2(&self, url: &str, msg: &Round2Message) -> Result<(), DkgError>;
}
