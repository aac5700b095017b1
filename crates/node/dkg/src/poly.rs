//! Shamir polynomials over the secp256k1 scalar field.

use std::collections::BTreeSet;

use k256::{ProjectivePoint, Scalar, elliptic_curve::Field};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{DkgError, encoding::points_hex};

/// Maps a 1-based participant index into the field.
pub fn index_scalar(index: u32) -> Scalar {
    Scalar::from(u64::from(index))
}

/// A secret polynomial `f(x) = a_0 + a_1 x + ... + a_{t-1} x^{t-1}`.
///
/// `a_0` is the dealer's secret; the polynomial has exactly `threshold`
/// coefficients.
#[derive(Clone)]
pub struct SecretPolynomial {
    coefficients: Vec<Scalar>,
}

impl std::fmt::Debug for SecretPolynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretPolynomial").field("threshold", &self.coefficients.len()).finish()
    }
}

impl SecretPolynomial {
    /// Random polynomial with `threshold` coefficients and a random secret.
    pub fn random<R: RngCore + CryptoRng>(threshold: u32, rng: &mut R) -> Result<Self, DkgError> {
        let secret = Scalar::random(&mut *rng);
        Self::with_secret(secret, threshold, rng)
    }

    /// Random polynomial with the given secret as `a_0`.
    pub fn with_secret<R: RngCore + CryptoRng>(
        secret: Scalar,
        threshold: u32,
        rng: &mut R,
    ) -> Result<Self, DkgError> {
        if threshold == 0 {
            return Err(DkgError::InvalidThreshold { threshold, participants: 0 });
        }
        let mut coefficients = Vec::with_capacity(threshold as usize);
        coefficients.push(secret);
        coefficients.extend((1..threshold).map(|_| Scalar::random(&mut *rng)));
        Ok(Self { coefficients })
    }

    /// Number of coefficients, equal to the threshold.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always `false`; a polynomial has at least one coefficient.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The secret `a_0`.
    pub fn secret(&self) -> &Scalar {
        &self.coefficients[0]
    }

    /// Evaluate at `x` with Horner's rule.
    pub fn evaluate(&self, x: &Scalar) -> Scalar {
        self.coefficients.iter().rev().fold(Scalar::ZERO, |acc, a| acc * x + a)
    }

    /// Evaluate at a participant index.
    pub fn share_for(&self, index: u32) -> Scalar {
        self.evaluate(&index_scalar(index))
    }

    /// Public commitments `C_k = a_k * G`.
    pub fn commit(&self) -> Commitments {
        Commitments::new(self.coefficients.iter().map(|a| ProjectivePoint::GENERATOR * a).collect())
    }
}

/// Feldman commitments to a dealer's coefficients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitments(#[serde(with = "points_hex")] Vec<ProjectivePoint>);

impl Commitments {
    /// Wrap commitment points, lowest degree first.
    pub const fn new(points: Vec<ProjectivePoint>) -> Self {
        Self(points)
    }

    /// Number of commitments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no commitments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Commitment to the secret, `a_0 * G`.
    pub fn secret_commitment(&self) -> Option<&ProjectivePoint> {
        self.0.first()
    }

    /// Commitment points, lowest degree first.
    pub fn points(&self) -> &[ProjectivePoint] {
        &self.0
    }

    /// `f(index) * G` computed from the commitments alone.
    pub fn evaluate(&self, index: u32) -> ProjectivePoint {
        let x = index_scalar(index);
        self.0.iter().rev().fold(ProjectivePoint::IDENTITY, |acc, c| acc * x + c)
    }

    /// Feldman check that `share = f(index)` for the committed polynomial.
    pub fn verify_share(&self, index: u32, share: &Scalar) -> bool {
        !self.0.is_empty() && ProjectivePoint::GENERATOR * share == self.evaluate(index)
    }
}

/// Interpolates `f(0)` from `(index, f(index))` points.
///
/// Exactly the given points are used; supplying fewer than the polynomial's
/// threshold yields an unrelated value.
pub fn interpolate_at_zero(points: &[(u32, Scalar)]) -> Result<Scalar, DkgError> {
    if points.is_empty() {
        return Err(DkgError::InsufficientShares { needed: 1, actual: 0 });
    }
    let mut seen = BTreeSet::new();
    for (index, _) in points {
        if *index == 0 || !seen.insert(*index) {
            return Err(DkgError::DuplicateIndex(*index));
        }
    }

    let mut secret = Scalar::ZERO;
    for (i, (xi, yi)) in points.iter().enumerate() {
        let xi = index_scalar(*xi);
        let mut num = Scalar::ONE;
        let mut den = Scalar::ONE;
        for (j, (xj, _)) in points.iter().enumerate() {
            if i == j {
                continue;
            }
            let xj = index_scalar(*xj);
            num *= xj;
            den *= xj - xi;
        }
        let den_inv = Option::<Scalar>::from(den.invert())
            .ok_or_else(|| DkgError::Serialization("non-invertible denominator".into()))?;
        secret += *yi * num * den_inv;
    }
    Ok(secret)
}
