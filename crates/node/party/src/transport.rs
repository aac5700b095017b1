//! Round message delivery over JSON-RPC.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use sigag_client::PartyClient;
use sigag_dkg::{DkgError, PeerTransport, Round1Message, Round2Message};

/// [`PeerTransport`] calling `dkg_round1`/`dkg_round2` on peers.
///
/// One client per peer URL is created lazily and reused.
#[derive(Debug)]
pub struct HttpTransport {
    timeout: Duration,
    clients: Mutex<HashMap<String, Arc<PartyClient>>>,
}

impl HttpTransport {
    /// Transport whose calls give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, clients: Mutex::new(HashMap::new()) }
    }

    fn client(&self, url: &str) -> Result<Arc<PartyClient>, DkgError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(url) {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(
            PartyClient::new(url, url, self.timeout)
                .map_err(|e| DkgError::Network(e.to_string()))?,
        );
        clients.insert(url.to_string(), Arc::clone(&client));
        Ok(client)
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn send_round1(&self, url: &str, msg: &Round1Message) -> Result<(), DkgError> {
        self.client(url)?
            .dkg_round1(msg)
            .await
            .map(|_| ())
            .map_err(|e| DkgError::Network(e.to_string()))
    }

    async fn send_round2(&self, url: &str, msg: &Round2Message) -> Result<(), DkgError> {
        self.client(url)?
            .dkg_round2(msg)
            .await
            .map(|_| ())
            .map_err(|e| DkgError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_reused() {
        let transport = HttpTransport::new(Duration::from_secs(1));
        let a = transport.client("http://127.0.0.1:8801/").unwrap();
        let b = transport.client("http://127.0.0.1:8801/").unwrap();
        let c = transport.client("http://127.0.0.1:8802/").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_network_error() {
        use rand_core::OsRng;
        use sigag_dkg::DkgParticipant;

        let ids = vec!["8801".to_string(), "8802".to_string()];
        let participant = DkgParticipant::new("8801", 1, &ids, 2, &mut OsRng).unwrap();
        let transport = HttpTransport::new(Duration::from_millis(200));
        let err = transport
            .send_round1("http://127.0.0.1:1/", &participant.round1_message())
            .await
            .unwrap_err();
        assert!(matches!(err, DkgError::Network(_)));
    }
}
