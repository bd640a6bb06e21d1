//! Key material accepted for verification.

use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use x509_cert::der::{Decode, DecodePem, Encode};
use x509_cert::Certificate;

use crate::error::Error;
use crate::jwk::JWK;

/// Public key used to check a proof: a JWK, a raw RSA key, or an X.509 certificate carrying
/// the key.
#[derive(Debug, Clone)]
pub enum VerificationKey {
    Jwk(JWK),
    Rsa(RsaPublicKey),
    Certificate(Box<Certificate>),
}

impl VerificationKey {
    /// Parse a DER encoded X.509 certificate.
    pub fn from_certificate_der(der: &[u8]) -> Result<Self, Error> {
        Ok(Self::Certificate(Box::new(Certificate::from_der(der)?)))
    }

    /// Parse a PEM encoded X.509 certificate.
    pub fn from_certificate_pem(pem: &str) -> Result<Self, Error> {
        Ok(Self::Certificate(Box::new(Certificate::from_pem(pem)?)))
    }

    /// The RSA public key, extracted from whichever form this key was supplied in.
    pub fn to_rsa_public_key(&self) -> Result<RsaPublicKey, Error> {
        match self {
            Self::Jwk(jwk) => RsaPublicKey::try_from(jwk.rsa_params()),
            Self::Rsa(key) => Ok(key.clone()),
            Self::Certificate(certificate) => {
                let spki = certificate.tbs_certificate.subject_public_key_info.to_der()?;
                RsaPublicKey::from_public_key_der(&spki).map_err(|e| {
                    Error::Key(format!("Certificate does not carry an RSA public key: {e}"))
                })
            }
        }
    }

    /// Key ID, if the key is a JWK carrying one.
    pub fn key_id(&self) -> Option<&str> {
        match self {
            Self::Jwk(jwk) => jwk.key_id.as_deref(),
            _ => None,
        }
    }
}

impl From<JWK> for VerificationKey {
    fn from(jwk: JWK) -> Self {
        Self::Jwk(jwk)
    }
}

impl From<&JWK> for VerificationKey {
    fn from(jwk: &JWK) -> Self {
        Self::Jwk(jwk.to_public())
    }
}

impl From<RsaPublicKey> for VerificationKey {
    fn from(key: RsaPublicKey) -> Self {
        Self::Rsa(key)
    }
}

impl From<Certificate> for VerificationKey {
    fn from(certificate: Certificate) -> Self {
        Self::Certificate(Box::new(certificate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPrivateKey;

    #[test]
    fn jwk_and_raw_key_agree() {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public_key = private_key.to_public_key();
        let from_jwk = VerificationKey::from(&JWK::from(&private_key))
            .to_rsa_public_key()
            .unwrap();
        let from_raw = VerificationKey::from(public_key.clone())
            .to_rsa_public_key()
            .unwrap();
        assert_eq!(from_jwk, public_key);
        assert_eq!(from_raw, public_key);
    }

    #[test]
    fn garbage_certificate() {
        assert!(matches!(
            VerificationKey::from_certificate_der(b"not a certificate"),
            Err(Error::Certificate(_))
        ));
        assert!(VerificationKey::from_certificate_pem("-----BEGIN CERTIFICATE-----\n").is_err());
    }
}
