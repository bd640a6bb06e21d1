use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// JSON Web Key
///
/// Only RSA keys are modelled; they are the only keys accepted by the PS256 suite.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq)]
pub struct JWK {
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_use: Option<String>,
    #[serde(rename = "alg")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    #[serde(rename = "kid")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(rename = "x5c")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x509_certificate_chain: Option<Vec<String>>,
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq)]
#[serde(tag = "kty")]
pub enum Params {
    RSA(RSAParams),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default, Hash, Eq)]
pub struct RSAParams {
    // Parameters for RSA Public Keys
    #[serde(rename = "n")]
    pub modulus: Option<Base64urlUInt>,
    #[serde(rename = "e")]
    pub exponent: Option<Base64urlUInt>,

    // Parameters for RSA Private Keys
    #[serde(rename = "d")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_exponent: Option<Base64urlUInt>,
    #[serde(rename = "p")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "q")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor: Option<Base64urlUInt>,
    #[serde(rename = "dp")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "dq")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_prime_factor_crt_exponent: Option<Base64urlUInt>,
    #[serde(rename = "qi")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_crt_coefficient: Option<Base64urlUInt>,
}

/// Unsigned big-endian integer, base64url encoded without padding.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Hash, Eq)]
#[serde(try_from = "String")]
#[serde(into = "Base64urlUIntString")]
pub struct Base64urlUInt(pub Vec<u8>);
type Base64urlUIntString = String;

/// <https://www.rfc-editor.org/rfc/rfc7518#section-3.1>
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Hash, Eq)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES384,
    ES512,
    EdDSA,
    #[serde(rename = "none")]
    None,
}

impl JWK {
    /// Strip private key material
    pub fn to_public(&self) -> Self {
        let mut key = self.clone();
        key.params = key.params.to_public();
        key
    }

    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    pub fn is_private(&self) -> bool {
        match &self.params {
            Params::RSA(params) => params.private_exponent.is_some(),
        }
    }

    pub fn rsa_params(&self) -> &RSAParams {
        match &self.params {
            Params::RSA(params) => params,
        }
    }
}

impl From<Params> for JWK {
    fn from(params: Params) -> Self {
        Self {
            public_key_use: None,
            algorithm: None,
            key_id: None,
            x509_certificate_chain: None,
            params,
        }
    }
}

impl From<&rsa::RsaPublicKey> for JWK {
    fn from(key: &rsa::RsaPublicKey) -> Self {
        Self::from(Params::RSA(RSAParams::from(key)))
    }
}

impl From<&rsa::RsaPrivateKey> for JWK {
    fn from(key: &rsa::RsaPrivateKey) -> Self {
        Self::from(Params::RSA(RSAParams::from(key)))
    }
}

impl FromStr for JWK {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl Params {
    /// Strip private key material
    pub fn to_public(&self) -> Self {
        match self {
            Self::RSA(params) => Self::RSA(params.to_public()),
        }
    }
}

impl RSAParams {
    /// Strip private key material
    pub fn to_public(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            exponent: self.exponent.clone(),
            ..Default::default()
        }
    }
}

impl From<&rsa::RsaPublicKey> for RSAParams {
    fn from(key: &rsa::RsaPublicKey) -> Self {
        Self {
            modulus: Some(Base64urlUInt(key.n().to_bytes_be())),
            exponent: Some(Base64urlUInt(key.e().to_bytes_be())),
            ..Default::default()
        }
    }
}

impl From<&rsa::RsaPrivateKey> for RSAParams {
    #[allow(clippy::many_single_char_names)]
    fn from(key: &rsa::RsaPrivateKey) -> Self {
        let mut params = Self::from(&key.to_public_key());
        params.private_exponent = Some(Base64urlUInt(key.d().to_bytes_be()));
        if let [p, q] = key.primes() {
            let one = BigUint::from(1u8);
            let two = BigUint::from(2u8);
            let d = key.d();
            // p is prime, so q^(p-2) mod p is the inverse of q
            let qi = q.modpow(&(p - &two), p);
            params.first_prime_factor_crt_exponent =
                Some(Base64urlUInt((d % &(p - &one)).to_bytes_be()));
            params.second_prime_factor_crt_exponent =
                Some(Base64urlUInt((d % &(q - &one)).to_bytes_be()));
            params.first_crt_coefficient = Some(Base64urlUInt(qi.to_bytes_be()));
            params.first_prime_factor = Some(Base64urlUInt(p.to_bytes_be()));
            params.second_prime_factor = Some(Base64urlUInt(q.to_bytes_be()));
        }
        params
    }
}

impl From<&Base64urlUInt> for BigUint {
    fn from(uint: &Base64urlUInt) -> Self {
        Self::from_bytes_be(&uint.0)
    }
}

impl TryFrom<&RSAParams> for rsa::RsaPublicKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        let n = params
            .modulus
            .as_ref()
            .ok_or_else(|| Error::Key("Missing modulus".to_string()))?;
        let e = params
            .exponent
            .as_ref()
            .ok_or_else(|| Error::Key("Missing exponent".to_string()))?;
        Ok(Self::new(n.into(), e.into())?)
    }
}

impl TryFrom<&RSAParams> for rsa::RsaPrivateKey {
    type Error = Error;
    #[allow(clippy::many_single_char_names)]
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        let public_key = rsa::RsaPublicKey::try_from(params)?;
        let d = params
            .private_exponent
            .as_ref()
            .ok_or(Error::MissingPrivateKey)?;
        let primes = match (&params.first_prime_factor, &params.second_prime_factor) {
            (Some(p), Some(q)) => vec![p.into(), q.into()],
            _ => Vec::new(),
        };
        Ok(Self::from_components(
            public_key.n().clone(),
            public_key.e().clone(),
            d.into(),
            primes,
        )?)
    }
}

impl TryFrom<String> for Base64urlUInt {
    type Error = Error;
    fn try_from(data: String) -> Result<Self, Self::Error> {
        Ok(Base64urlUInt(URL_SAFE_NO_PAD.decode(data)?))
    }
}

impl From<&Base64urlUInt> for String {
    fn from(data: &Base64urlUInt) -> String {
        URL_SAFE_NO_PAD.encode(&data.0)
    }
}

impl From<Base64urlUInt> for Base64urlUIntString {
    fn from(data: Base64urlUInt) -> Base64urlUIntString {
        String::from(&data)
    }
}

/// JSON Web Key Set, as served at a verification method URI.
///
/// <https://www.rfc-editor.org/rfc/rfc7517#section-5>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct JwkSet {
    pub keys: Vec<JWK>,
}

impl JwkSet {
    pub fn new(keys: Vec<JWK>) -> Self {
        Self { keys }
    }

    /// Parse a key set, skipping keys of types this crate cannot use.
    pub fn parse(json: &str) -> Result<Self, Error> {
        #[derive(Deserialize)]
        struct RawSet {
            keys: Vec<serde_json::Value>,
        }
        let raw: RawSet = serde_json::from_str(json)?;
        let mut keys = Vec::with_capacity(raw.keys.len());
        for key in raw.keys {
            match serde_json::from_value::<JWK>(key) {
                Ok(jwk) => keys.push(jwk),
                Err(err) => log::warn!("Skipping unsupported key in key set: {}", err),
            }
        }
        Ok(Self { keys })
    }

    /// Key with the given `kid`.
    pub fn find(&self, key_id: &str) -> Option<&JWK> {
        self.keys
            .iter()
            .find(|key| key.key_id.as_deref() == Some(key_id))
    }

    /// Public view of the set, suitable for publishing.
    pub fn to_public(&self) -> Self {
        Self {
            keys: self.keys.iter().map(JWK::to_public).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://www.rfc-editor.org/rfc/rfc7517#appendix-A.1
    const RSA_PUBLIC_JWK: &str = r#"{"kty":"RSA",
        "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        "e":"AQAB",
        "alg":"RS256",
        "kid":"2011-04-29"}"#;

    #[test]
    fn parse_public_jwk() {
        let jwk: JWK = RSA_PUBLIC_JWK.parse().unwrap();
        assert_eq!(jwk.key_id.as_deref(), Some("2011-04-29"));
        assert_eq!(jwk.algorithm, Some(Algorithm::RS256));
        assert!(!jwk.is_private());
        assert_eq!(jwk.rsa_params().exponent, Some(Base64urlUInt(vec![1, 0, 1])));
        let public_key = rsa::RsaPublicKey::try_from(jwk.rsa_params()).unwrap();
        assert_eq!(public_key.size(), 256);
    }

    #[test]
    fn serialize_omits_private_fields() {
        let jwk: JWK = RSA_PUBLIC_JWK.parse().unwrap();
        let value = serde_json::to_value(&jwk).unwrap();
        assert_eq!(value["kty"], "RSA");
        assert_eq!(value["e"], "AQAB");
        assert!(value.get("d").is_none());
    }

    #[test]
    fn private_key_round_trip() {
        let mut rng = rand::rngs::OsRng;
        let private_key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let jwk = JWK::from(&private_key).with_key_id("signing");
        assert!(jwk.is_private());
        let params = jwk.rsa_params();
        assert!(params.first_crt_coefficient.is_some());
        let restored = rsa::RsaPrivateKey::try_from(params).unwrap();
        assert_eq!(restored, private_key);

        let public = jwk.to_public();
        assert!(!public.is_private());
        assert_eq!(public.key_id.as_deref(), Some("signing"));
        assert!(matches!(
            rsa::RsaPrivateKey::try_from(public.rsa_params()),
            Err(Error::MissingPrivateKey)
        ));
    }

    #[test]
    fn key_set_lookup() {
        let json = format!(
            r#"{{"keys": [{}, {{"kty":"EC","crv":"P-256","x":"AA","y":"AA"}}]}}"#,
            RSA_PUBLIC_JWK
        );
        let set = JwkSet::parse(&json).unwrap();
        assert_eq!(set.keys.len(), 1);
        assert!(set.find("2011-04-29").is_some());
        assert!(set.find("missing").is_none());
    }
}
