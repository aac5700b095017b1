//! Hex encodings for secp256k1 scalars and points.

use k256::{
    FieldBytes, ProjectivePoint, Scalar,
    elliptic_curve::{PrimeField, group::GroupEncoding},
};

use crate::DkgError;

/// Compressed SEC1 length of a point.
pub const POINT_LEN: usize = 33;

/// Big-endian length of a scalar.
pub const SCALAR_LEN: usize = 32;

/// Hex of the compressed point.
pub fn point_to_hex(point: &ProjectivePoint) -> String {
    hex::encode(point.to_bytes())
}

/// Parse a compressed point from hex.
pub fn point_from_hex(s: &str) -> Result<ProjectivePoint, DkgError> {
    let bytes = hex::decode(s).map_err(|e| DkgError::Serialization(e.to_string()))?;
    if bytes.len() != POINT_LEN {
        return Err(DkgError::Serialization(format!(
            "invalid point length: expected {POINT_LEN}, got {}",
            bytes.len()
        )));
    }
    let mut repr = <ProjectivePoint as GroupEncoding>::Repr::default();
    repr.copy_from_slice(&bytes);
    Option::from(ProjectivePoint::from_bytes(&repr))
        .ok_or_else(|| DkgError::Serialization("point is not on the curve".into()))
}

/// Hex of the big-endian scalar.
pub fn scalar_to_hex(scalar: &Scalar) -> String {
    hex::encode(scalar.to_bytes())
}

/// Parse a canonical big-endian scalar from hex.
pub fn scalar_from_hex(s: &str) -> Result<Scalar, DkgError> {
    let bytes = hex::decode(s).map_err(|e| DkgError::Serialization(e.to_string()))?;
    if bytes.len() != SCALAR_LEN {
        return Err(DkgError::Serialization(format!(
            "invalid scalar length: expected {SCALAR_LEN}, got {}",
            bytes.len()
        )));
    }
    let repr = FieldBytes::clone_from_slice(&bytes);
    Option::from(Scalar::from_repr(repr))
        .ok_or_else(|| DkgError::Serialization("scalar is not canonical".into()))
}

/// `serde(with)` adapter for a single point.
pub mod point_hex {
    use k256::ProjectivePoint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serialize as compressed hex.
    pub fn serialize<S: Serializer>(point: &ProjectivePoint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::point_to_hex(point))
    }

    /// Deserialize from compressed hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ProjectivePoint, D::Error> {
        let s = String::deserialize(d)?;
        super::point_from_hex(&s).map_err(D::Error::custom)
    }
}

/// `serde(with)` adapter for a vector of points.
pub mod points_hex {
    use k256::ProjectivePoint;
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    /// Serialize as a list of compressed hex strings.
    pub fn serialize<S: Serializer>(points: &[ProjectivePoint], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(points.len()))?;
        for point in points {
            seq.serialize_element(&super::point_to_hex(point))?;
        }
        seq.end()
    }

    /// Deserialize from a list of compressed hex strings.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ProjectivePoint>, D::Error> {
        let raw = Vec::<String>::deserialize(d)?;
        raw.iter().map(|s| super::point_from_hex(s).map_err(D::Error::custom)).collect()
    }
}

/// `serde(with)` adapter for a scalar.
pub mod scalar_hex {
    use k256::Scalar;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Serialize as big-endian hex.
    pub fn serialize<S: Serializer>(scalar: &Scalar, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::scalar_to_hex(scalar))
    }

    /// Deserialize from big-endian hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Scalar, D::Error> {
        let s = String::deserialize(d)?;
        super::scalar_from_hex(&s).map_err(D::Error::custom)
    }
}
