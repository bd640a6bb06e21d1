use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine as _};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::Error;
use crate::jwk::{Algorithm, JWK};
use crate::key::VerificationKey;

// RFC 7515 - JSON Web Signature (JWS)
// RFC 7797 - JSON Web Signature (JWS) Unencoded Payload Option

/// base64url decoder for received segments: unpadded, ignoring non-zero trailing bits.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "b64")]
    pub base64urlencode_payload: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "crit")]
    pub critical: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "kid")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "typ")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(flatten)]
    pub additional_parameters: BTreeMap<String, serde_json::Value>,
}

impl Header {
    /// PS256 header for a detached, unencoded payload.
    pub fn detached_unencoded(key_id: Option<String>) -> Self {
        Self {
            algorithm: Algorithm::PS256,
            base64urlencode_payload: Some(false),
            critical: Some(vec!["b64".to_string()]),
            key_id,
            type_: None,
            additional_parameters: BTreeMap::new(),
        }
    }
}

fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(&object)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn check_key_algorithm(key_algorithm: Option<Algorithm>, algorithm: Algorithm) -> Result<(), Error> {
    match key_algorithm {
        Some(key_algorithm) if key_algorithm != algorithm => Err(Error::Key(format!(
            "Key is restricted to {key_algorithm:?}, not {algorithm:?}"
        ))),
        _ => Ok(()),
    }
}

pub fn sign_bytes(algorithm: Algorithm, data: &[u8], key: &JWK) -> Result<Vec<u8>, Error> {
    if algorithm != Algorithm::PS256 {
        return Err(Error::Signing(format!("Unsupported algorithm {algorithm:?}")));
    }
    check_key_algorithm(key.algorithm, algorithm)?;
    if !key.is_private() {
        return Err(Error::MissingPrivateKey);
    }
    let private_key = RsaPrivateKey::try_from(key.rsa_params())?;
    let signing_key = BlindedSigningKey::<Sha256>::new(private_key);
    let mut rng = rand::rngs::OsRng;
    let signature = signing_key
        .try_sign_with_rng(&mut rng, data)
        .map_err(|e| Error::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

pub fn sign_bytes_b64(algorithm: Algorithm, data: &[u8], key: &JWK) -> Result<String, Error> {
    let signature = sign_bytes(algorithm, data, key)?;
    Ok(URL_SAFE_NO_PAD.encode(signature))
}

/// Check a signature over `data`.
///
/// A signature that does not match is `Ok(false)`; errors are reserved for unusable keys and
/// unsupported algorithms.
pub fn verify_bytes(
    algorithm: Algorithm,
    data: &[u8],
    key: &VerificationKey,
    signature: &[u8],
) -> Result<bool, Error> {
    if algorithm != Algorithm::PS256 {
        return Err(Error::malformed(format!("Unsupported algorithm {algorithm:?}")));
    }
    if let VerificationKey::Jwk(jwk) = key {
        check_key_algorithm(jwk.algorithm, algorithm)?;
    }
    let public_key: RsaPublicKey = key.to_rsa_public_key()?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let signature = match Signature::try_from(signature) {
        Ok(signature) => signature,
        Err(_) => return Ok(false),
    };
    match verifying_key.verify(data, &signature) {
        Ok(()) => Ok(true),
        Err(e) => {
            log::debug!("PS256 signature rejected: {}", e);
            Ok(false)
        }
    }
}

/// Sign `payload` without encoding it, producing `header..signature`.
pub fn detached_sign_unencoded_payload(payload: &[u8], key: &JWK) -> Result<String, Error> {
    let header = Header::detached_unencoded(key.key_id.clone());
    let header_b64 = base64_encode_json(&header)?;
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    let sig_b64 = sign_bytes_b64(header.algorithm, &signing_input, key)?;
    let jws = header_b64 + ".." + &sig_b64;
    Ok(jws)
}

pub fn split_jws(jws: &str) -> Result<(&str, &str, &str), Error> {
    let mut parts = jws.splitn(3, '.');
    Ok(match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), Some(c)) if !c.contains('.') => (a, b, c),
        _ => return Err(Error::malformed("Expected three dot-separated segments")),
    })
}

pub fn split_detached_jws(jws: &str) -> Result<(&str, &str), Error> {
    let (header_b64, omitted_payload, signature_b64) = split_jws(jws)?;
    if !omitted_payload.is_empty() {
        return Err(Error::malformed("Payload segment is not empty"));
    }
    if header_b64.is_empty() || signature_b64.is_empty() {
        return Err(Error::malformed("Empty header or signature segment"));
    }
    Ok((header_b64, signature_b64))
}

pub struct DecodedJWS {
    pub header: Header,
    pub signing_input: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Decode the header and signature of a detached JWS and rebuild its signing input over the
/// unencoded `payload`.
///
/// Only `b64: false` with `b64` listed as critical is accepted, and only for PS256.
pub fn decode_jws_parts(
    header_b64: &str,
    payload: &[u8],
    signature_b64: &str,
) -> Result<DecodedJWS, Error> {
    let header_json = LENIENT_URL_SAFE
        .decode(header_b64)
        .map_err(|e| Error::malformed(format!("Header is not base64url: {e}")))?;
    let signature = LENIENT_URL_SAFE
        .decode(signature_b64)
        .map_err(|e| Error::malformed(format!("Signature is not base64url: {e}")))?;
    let header: Header = serde_json::from_slice(&header_json)
        .map_err(|e| Error::malformed(format!("Header is not a JOSE header: {e}")))?;
    if header.algorithm != Algorithm::PS256 {
        return Err(Error::malformed(format!(
            "Unsupported algorithm {:?}",
            header.algorithm
        )));
    }
    if header.base64urlencode_payload != Some(false) {
        return Err(Error::malformed("Payload must be unencoded (b64: false)"));
    }
    let mut b64_critical = false;
    for name in header.critical.iter().flatten() {
        match name.as_str() {
            "b64" => b64_critical = true,
            other => {
                return Err(Error::malformed(format!(
                    "Unsupported critical header parameter {other}"
                )))
            }
        }
    }
    if !b64_critical {
        return Err(Error::malformed("b64 must be listed as critical"));
    }
    let signing_input = [header_b64.as_bytes(), b".", payload].concat();
    Ok(DecodedJWS {
        header,
        signing_input,
        signature,
    })
}

/// Verify a JWS with detached, unencoded payload.
pub fn detached_verify(jws: &str, payload: &[u8], key: &VerificationKey) -> Result<bool, Error> {
    let (header_b64, signature_b64) = split_detached_jws(jws)?;
    let DecodedJWS {
        header,
        signing_input,
        signature,
    } = decode_jws_parts(header_b64, payload, signature_b64)?;
    if let (Some(expected), Some(actual)) = (key.key_id(), header.key_id.as_deref()) {
        if expected != actual {
            log::debug!("JWS key ID {} does not match key {}", actual, expected);
            return Ok(false);
        }
    }
    verify_bytes(header.algorithm, &signing_input, key, &signature)
}

/// Sign a document digest (lowercase hex), which is used as the unencoded payload.
pub fn sign(hash: &str, key: &JWK) -> Result<String, Error> {
    detached_sign_unencoded_payload(hash.as_bytes(), key)
}

/// Check a compact signature produced by [`sign`] against a document digest.
pub fn verify(jws: &str, hash: &str, key: &VerificationKey) -> Result<bool, Error> {
    detached_verify(jws, hash.as_bytes(), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::sha256_hex as sha256;
    use serde_json::json;

    fn private_jwk() -> JWK {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        JWK::from(&private_key).with_key_id("https://dawex.com/api/jwks")
    }

    #[test]
    fn detached_sign_verify() {
        let key = private_jwk();
        let hash = sha256(b"<urn:a> <urn:b> <urn:c> .");
        let jws = sign(&hash, &key).unwrap();
        let (header_b64, signature_b64) = split_detached_jws(&jws).unwrap();
        assert!(jws.contains(".."));
        assert!(!signature_b64.is_empty());

        let header_json = URL_SAFE_NO_PAD.decode(header_b64).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header_json).unwrap();
        assert_eq!(
            header,
            json!({
                "alg": "PS256",
                "b64": false,
                "crit": ["b64"],
                "kid": "https://dawex.com/api/jwks"
            })
        );

        let public = VerificationKey::from(&key);
        assert!(verify(&jws, &hash, &public).unwrap());

        // PSS is randomized
        let other = sign(&hash, &key).unwrap();
        assert_ne!(jws, other);
        assert!(verify(&other, &hash, &public).unwrap());
    }

    #[test]
    fn tampered_payload_or_key() {
        let key = private_jwk();
        let hash = sha256(b"payload");
        let jws = sign(&hash, &key).unwrap();
        let public = VerificationKey::from(&key);
        assert!(!verify(&jws, &sha256(b"other payload"), &public).unwrap());

        let stranger = VerificationKey::from(private_jwk().to_public());
        assert!(!verify(&jws, &hash, &stranger).unwrap());

        let mut flipped = jws.into_bytes();
        let i = flipped.len() - 10;
        flipped[i] = if flipped[i] == b'A' { b'B' } else { b'A' };
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(!verify(&flipped, &hash, &public).unwrap());
    }

    #[test]
    fn last_signature_character_flipped() {
        let key = private_jwk();
        let hash = sha256(b"payload");
        let jws = sign(&hash, &key).unwrap();
        let public = VerificationKey::from(&key);

        // 256 signature bytes leave 4 unused bits in the last character: the replacement
        // changes the 2 used bits and sets an unused one.
        let mut flipped = jws.into_bytes();
        let last = flipped.len() - 1;
        flipped[last] = if matches!(flipped[last], b'A'..=b'P') { b'x' } else { b'B' };
        let flipped = String::from_utf8(flipped).unwrap();

        let (_, signature_b64) = split_detached_jws(&flipped).unwrap();
        assert!(URL_SAFE_NO_PAD.decode(signature_b64).is_err());
        assert_eq!(LENIENT_URL_SAFE.decode(signature_b64).unwrap().len(), 256);
        assert!(!verify(&flipped, &hash, &public).unwrap());
    }

    #[test]
    fn malformed_signatures() {
        let key = VerificationKey::from(&private_jwk());
        let hash = sha256(b"payload");
        for jws in ["", "abc", "a.b", "a.b.c", "..", "a..", "..c", "a..b.c"] {
            let err = verify(jws, &hash, &key).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::MalformedSignature, "{jws}");
        }

        let encoded_payload = base64_encode_json(&json!({"alg": "PS256"})).unwrap();
        let err = verify(&format!("{encoded_payload}..AAAA"), &hash, &key).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));

        let not_critical =
            base64_encode_json(&json!({"alg": "PS256", "b64": false})).unwrap();
        let err = verify(&format!("{not_critical}..AAAA"), &hash, &key).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));

        let rs256 =
            base64_encode_json(&json!({"alg": "RS256", "b64": false, "crit": ["b64"]})).unwrap();
        let err = verify(&format!("{rs256}..AAAA"), &hash, &key).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));

        let unknown_crit = base64_encode_json(
            &json!({"alg": "PS256", "b64": false, "crit": ["b64", "exp"]}),
        )
        .unwrap();
        let err = verify(&format!("{unknown_crit}..AAAA"), &hash, &key).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
    }

    #[test]
    fn public_key_cannot_sign() {
        let key = private_jwk().to_public();
        assert!(matches!(
            sign(&sha256(b""), &key),
            Err(Error::MissingPrivateKey)
        ));
    }

    #[test]
    fn restricted_key_algorithm() {
        let mut key = private_jwk();
        key.algorithm = Some(Algorithm::RS256);
        assert!(matches!(sign(&sha256(b""), &key), Err(Error::Key(_))));
    }
}
