//! Parameter and result types of the aggregator and party methods.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sigag_dkg::{Round1Message, Round2Message};
use sigag_rpc::{RequiredFields, required_fields};

/// Party set of an epoch, id to URL.
pub type Parties = BTreeMap<String, String>;

/// Result of `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    /// Always `"pong"`.
    pub message: String,
}

impl PingResult {
    /// The canonical reply.
    pub fn pong() -> Self {
        Self { message: "pong".to_string() }
    }
}

/// Result of `health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResult {
    /// Always `"ok"`.
    pub status: String,
}

impl HealthResult {
    /// The canonical reply.
    pub fn ok() -> Self {
        Self { status: "ok".to_string() }
    }
}

/// Parameters of the aggregator's `register` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParams {
    /// Party id.
    #[serde(default)]
    pub address: String,
    /// Location the party serves RPC on.
    #[serde(default)]
    pub url: String,
    /// Serve over plain HTTP.
    #[serde(default, rename = "noTLS")]
    pub no_tls: bool,
}

required_fields!(RegisterParams { address => "address", url => "url" });

/// Parameters of the party's `new_epoch` method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEpochParams {
    /// Epoch being announced.
    #[serde(default)]
    pub epoch: u64,
}

required_fields!(NewEpochParams { epoch => "epoch" });

/// Detail attached to a stale `new_epoch` rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleEpochData {
    /// Epoch the party last accepted.
    pub current: u64,
}

/// Parameters of the party's `dkg_init` method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkgInitParams {
    /// Frozen party set of the epoch.
    #[serde(default)]
    pub parties: Parties,
    /// Signing threshold.
    #[serde(default)]
    pub threshold: u32,
}

required_fields!(DkgInitParams { parties => "parties", threshold => "threshold" });

/// Parameters of the party's `dkg_round1` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DkgRound1Params(pub Round1Message);

impl RequiredFields for DkgRound1Params {
    fn missing_field(&self) -> Option<&'static str> {
        if self.0.sender.is_empty() {
            Some("sender")
        } else if self.0.epoch == 0 {
            Some("epoch")
        } else {
            None
        }
    }
}

/// Parameters of the party's `dkg_round2` method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DkgRound2Params(pub Round2Message);

impl RequiredFields for DkgRound2Params {
    fn missing_field(&self) -> Option<&'static str> {
        if self.0.sender.is_empty() {
            Some("sender")
        } else if self.0.epoch == 0 {
            Some("epoch")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_register_params_wire_names() {
        let params: RegisterParams =
            serde_json::from_value(json!({"address": "8801", "url": "127.0.0.1:8801/", "noTLS": true}))
                .unwrap();
        assert_eq!(params.address, "8801");
        assert!(params.no_tls);
        assert!(params.validate().is_ok());

        let encoded = serde_json::to_value(&params).unwrap();
        assert_eq!(encoded["noTLS"], json!(true));
    }

    #[test]
    fn test_register_params_required() {
        let params: RegisterParams = serde_json::from_value(json!({"url": "x"})).unwrap();
        assert_eq!(
            params.validate().unwrap_err().to_string(),
            "field 'address' is required but missing or null in JSON"
        );
        let params: RegisterParams = serde_json::from_value(json!({"address": "p1"})).unwrap();
        assert_eq!(params.missing_field(), Some("url"));
    }

    #[test]
    fn test_zero_epoch_is_missing() {
        let params: NewEpochParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.missing_field(), Some("epoch"));
        assert!(NewEpochParams { epoch: 1 }.validate().is_ok());
    }

    #[test]
    fn test_dkg_init_required() {
        let params = DkgInitParams::default();
        assert_eq!(params.missing_field(), Some("parties"));

        let parties: Parties = [("p1".to_string(), "http://a/".to_string())].into();
        let params = DkgInitParams { parties, threshold: 0 };
        assert_eq!(params.missing_field(), Some("threshold"));
    }

    #[test]
    fn test_canonical_results() {
        assert_eq!(serde_json::to_value(PingResult::pong()).unwrap(), json!({"message": "pong"}));
        assert_eq!(serde_json::to_value(HealthResult::ok()).unwrap(), json!({"status": "ok"}));
    }
}
