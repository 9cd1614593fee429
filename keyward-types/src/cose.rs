//! Conversion of COSE_Key maps into a JSON Web Key shaped [`NormalizedKey`].
//!
//! Only the EC2 and RSA key types are understood. Labels are resolved against constant tables;
//! anything outside of them is an error rather than silently dropped.

use std::collections::{BTreeMap, BTreeSet};

use ciborium::value::Value;
use serde::{Deserialize, Serialize};

use crate::{auth_data::Cursor, encoding, KeyConversionError};


repr_enum! {
    /// COSE key types, label `1` of a COSE_Key.
    ///
    /// <https://www.iana.org/assignments/cose/cose.xhtml#key-type>
    KeyType: i64 {
        /// Elliptic curve keys with x and y coordinates
        Ec: 2 => "EC",
        /// RSA keys
        Rsa: 3 => "RSA",
    }
}

repr_enum! {
    /// COSE algorithms, label `3` of a COSE_Key.
    ///
    /// <https://www.iana.org/assignments/cose/cose.xhtml#algorithms>
    CoseAlgorithm: i64 {
        /// ECDSA w/ SHA-256
        Es256: -7 => "ES256",
        /// EdDSA
        EdDsa: -8 => "EdDSA",
        /// ECDSA w/ SHA-384
        Es384: -35 => "ES384",
        /// ECDSA w/ SHA-512
        Es512: -36 => "ES512",
        /// RSASSA-PSS w/ SHA-256
        Ps256: -37 => "PS256",
        /// RSASSA-PSS w/ SHA-384
        Ps384: -38 => "PS384",
        /// RSASSA-PSS w/ SHA-512
        Ps512: -39 => "PS512",
        /// ECDSA using secp256k1 curve and SHA-256
        Es256K: -47 => "ES256K",
        /// RSASSA-PKCS1-v1_5 using SHA-256
        Rs256: -257 => "RS256",
        /// RSASSA-PKCS1-v1_5 using SHA-384
        Rs384: -258 => "RS384",
        /// RSASSA-PKCS1-v1_5 using SHA-512
        Rs512: -259 => "RS512",
        /// RSASSA-PKCS1-v1_5 using SHA-1
        Rs1: -65535 => "RS1",
    }
}

repr_enum! {
    /// COSE elliptic curves, label `-1` of an EC2 COSE_Key.
    ///
    /// <https://www.iana.org/assignments/cose/cose.xhtml#elliptic-curves>
    EllipticCurve: i64 {
        /// NIST P-256 also known as secp256r1
        P256: 1 => "P-256",
        /// NIST P-384 also known as secp384r1
        P384: 2 => "P-384",
        /// NIST P-521 also known as secp521r1
        P521: 3 => "P-521",
        /// X25519 for use w/ ECDH only
        X25519: 4 => "X25519",
        /// X448 for use w/ ECDH only
        X448: 5 => "X448",
        /// Ed25519 for use w/ EdDSA only
        Ed25519: 6 => "Ed25519",
        /// Ed448 for use w/ EdDSA only
        Ed448: 7 => "Ed448",
    }
}

/// Labels shared by every key type, other than `kty` and `alg`.
const COMMON_LABELS: &[(i64, &str)] = &[(2, "kid"), (4, "key_ops"), (5, "base_iv")];

const EC_LABELS: &[(i64, &str)] = &[(-1, "crv"), (-2, "x"), (-3, "y"), (-4, "d")];

const RSA_LABELS: &[(i64, &str)] = &[
    (-1, "n"),
    (-2, "e"),
    (-3, "d"),
    (-4, "p"),
    (-5, "q"),
    (-6, "dp"),
    (-7, "dq"),
    (-8, "qi"),
    (-9, "other"),
    (-10, "r_i"),
    (-11, "d_i"),
    (-12, "t_i"),
];

const KTY_LABEL: i64 = 1;
const ALG_LABEL: i64 = 3;

impl KeyType {
    fn labels(self) -> &'static [(i64, &'static str)] {
        match self {
            KeyType::Ec => EC_LABELS,
            KeyType::Rsa => RSA_LABELS,
        }
    }
}

impl CoseAlgorithm {
    /// Whether the algorithm signs with an elliptic curve key.
    pub fn is_elliptic_curve(self) -> bool {
        matches!(
            self,
            Self::Es256 | Self::Es384 | Self::Es512 | Self::Es256K | Self::EdDsa
        )
    }
}

/// A public key in the shape of a JSON Web Key, produced from the COSE_Key the authenticator
/// attested.
///
/// Byte valued members are base64url without padding. This is what gets persisted in
/// [`Authenticator::public_key`](crate::Authenticator::public_key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedKey {
    /// The key type
    pub kty: KeyType,

    /// The algorithm the key is to be used with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<CoseAlgorithm>,

    /// The curve of an EC key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<EllipticCurve>,

    /// Every other key parameter by its JWK name
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_json::Value>,

    /// Whether signatures made by this key are DER encoded. EC keys from authenticators carry
    /// `false`, and raw `r || s` signatures are then accepted as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn1: Option<bool>,
}

impl NormalizedKey {
    /// Convert a decoded COSE_Key map.
    pub fn from_cose(key: &Value) -> Result<Self, KeyConversionError> {
        let entries = key
            .as_map()
            .ok_or_else(|| KeyConversionError::InvalidValue("COSE key is not a map".into()))?;

        let kty_code = entries
            .iter()
            .find(|(label, _)| label_code(label) == Some(KTY_LABEL))
            .map(|(_, value)| int_value(value, "kty"))
            .transpose()?
            .ok_or(KeyConversionError::MissingKeyType)?;
        let kty = KeyType::try_from(kty_code)
            .map_err(|_| KeyConversionError::UnsupportedKeyType(kty_code))?;

        let mut normalized = NormalizedKey {
            kty,
            alg: None,
            crv: None,
            params: BTreeMap::new(),
            asn1: (kty == KeyType::Ec).then_some(false),
        };

        let mut seen = BTreeSet::new();
        for (label, value) in entries {
            let Some(code) = label_code(label) else {
                return Err(KeyConversionError::UnknownCoseLabel {
                    kty: kty.name(),
                    label: render_label(label),
                });
            };
            if !seen.insert(code) {
                return Err(KeyConversionError::InvalidValue(format!(
                    "duplicate COSE label {code}"
                )));
            }

            match code {
                KTY_LABEL => {}
                ALG_LABEL => {
                    let alg = int_value(value, "alg")?;
                    normalized.alg = Some(
                        CoseAlgorithm::try_from(alg)
                            .map_err(|_| KeyConversionError::UnsupportedAlgorithm(alg))?,
                    );
                }
                -1 if kty == KeyType::Ec => {
                    let crv = int_value(value, "crv")?;
                    normalized.crv = Some(
                        EllipticCurve::try_from(crv)
                            .map_err(|_| KeyConversionError::UnsupportedCurve(crv))?,
                    );
                }
                _ => {
                    let name = lookup(COMMON_LABELS, code)
                        .or_else(|| lookup(kty.labels(), code))
                        .ok_or_else(|| KeyConversionError::UnknownCoseLabel {
                            kty: kty.name(),
                            label: code.to_string(),
                        })?;
                    normalized.params.insert(name.to_owned(), to_json(value, name)?);
                }
            }
        }

        Ok(normalized)
    }

    /// Decode a single encoded COSE_Key and convert it. Bytes after the key are an error.
    pub fn from_cose_bytes(bytes: &[u8]) -> Result<Self, KeyConversionError> {
        let mut cursor = Cursor::new(bytes);
        let (key, _) = cursor
            .read_cbor()
            .map_err(|e| KeyConversionError::InvalidValue(e.to_string()))?;
        cursor
            .finish()
            .map_err(|e| KeyConversionError::InvalidValue(e.to_string()))?;
        Self::from_cose(&key)
    }

    /// The compact JSON form that is stored at rest.
    pub fn to_json(&self) -> String {
        // SAFETY: every member is a string, bool or JSON value keyed by strings.
        serde_json::to_string(self).unwrap()
    }

    /// Parse the compact JSON form.
    pub fn from_json(json: &str) -> Result<Self, KeyConversionError> {
        serde_json::from_str(json).map_err(|e| KeyConversionError::InvalidValue(e.to_string()))
    }

    /// Decode a base64url byte parameter such as `x` or `n`.
    pub fn param_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.params
            .get(name)
            .and_then(serde_json::Value::as_str)
            .and_then(encoding::try_from_base64url)
    }
}

fn lookup(table: &[(i64, &'static str)], code: i64) -> Option<&'static str> {
    table
        .iter()
        .find(|(label, _)| *label == code)
        .map(|(_, name)| *name)
}

fn label_code(label: &Value) -> Option<i64> {
    label
        .as_integer()
        .and_then(|int| i64::try_from(i128::from(int)).ok())
}

fn render_label(label: &Value) -> String {
    match label {
        Value::Text(text) => text.clone(),
        Value::Integer(int) => i128::from(*int).to_string(),
        other => format!("{other:?}"),
    }
}

fn int_value(value: &Value, name: &str) -> Result<i64, KeyConversionError> {
    label_code(value).ok_or_else(|| KeyConversionError::InvalidValue(name.to_owned()))
}

fn to_json(value: &Value, name: &str) -> Result<serde_json::Value, KeyConversionError> {
    Ok(match value {
        Value::Bytes(bytes) => serde_json::Value::String(encoding::base64url(bytes)),
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(int) => i64::try_from(i128::from(*int))
            .map(serde_json::Value::from)
            .map_err(|_| KeyConversionError::InvalidValue(name.to_owned()))?,
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| to_json(item, name))
                .collect::<Result<_, _>>()?,
        ),
        _ => return Err(KeyConversionError::InvalidValue(name.to_owned())),
    })
}
