//! Identity generation and password hashing
//!
//! Accounts are anonymous: the public identity is a random 12-digit
//! number, recovery is a 6-word phrase, and both secrets are stored as
//! Argon2id records in a self-describing encoded string. Uniqueness of
//! generated identities is the storage layer's concern, not ours.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{CredentialError, ValidationError};

/// Argon2id parameters for all stored credentials
pub const ARGON_MEMORY_KIB: u32 = 64 * 1024;
pub const ARGON_TIME_COST: u32 = 1;
pub const ARGON_LANES: u32 = 4;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

const ACCOUNT_ID_LEN: usize = 12;
const ACCOUNT_ID_MIN: u64 = 100_000_000_000;
const ACCOUNT_ID_SPAN: u64 = 900_000_000_000;

const RECOVERY_WORDS: usize = 6;

/// Fixed recovery-phrase dictionary. The word list and phrase shape are
/// part of the external contract; changing them would orphan existing
/// phrases.
const WORDLIST: [&str; 56] = [
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta",
    "iota", "kappa", "lambda", "mu", "nu", "xi", "omicron", "pi",
    "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi", "omega",
    "storm", "ocean", "mountain", "forest", "river", "stone", "flame", "wind",
    "shadow", "light", "moon", "star", "sun", "cloud", "rain", "snow",
    "eagle", "wolf", "bear", "fox", "hawk", "owl", "deer", "lion",
    "tiger", "dragon", "phoenix", "crow", "dove", "swan", "robin", "falcon",
];

/// Fill a buffer from the system entropy source, surfacing failure
/// instead of panicking.
fn secure_bytes<const N: usize>() -> Result<[u8; N], CredentialError> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    Ok(buf)
}

/// Uniform draw in `[0, bound)` by rejection sampling, avoiding modulo
/// bias.
fn secure_below(bound: u64) -> Result<u64, CredentialError> {
    let zone = u64::MAX - u64::MAX % bound;
    loop {
        let v = u64::from_le_bytes(secure_bytes::<8>()?);
        if v < zone {
            return Ok(v % bound);
        }
    }
}

/// Generate a random 12-digit public account id.
///
/// Drawn uniformly from [100000000000, 999999999999], so the result is
/// always exactly 12 digits without padding.
pub fn generate_account_id() -> Result<String, CredentialError> {
    Ok((ACCOUNT_ID_MIN + secure_below(ACCOUNT_ID_SPAN)?).to_string())
}

/// Generate a 6-word recovery phrase.
///
/// Words are drawn with replacement from a 56-word dictionary, giving
/// roughly 34 bits of entropy. That is far weaker than the password
/// policy; callers must not treat the phrase as a sole factor for
/// high-value actions.
pub fn generate_recovery_phrase() -> Result<String, CredentialError> {
    let mut words = Vec::with_capacity(RECOVERY_WORDS);
    for _ in 0..RECOVERY_WORDS {
        words.push(WORDLIST[secure_below(WORDLIST.len() as u64)? as usize]);
    }
    Ok(words.join(" "))
}

/// A parsed Argon2id hash record.
///
/// Serialized form: `$argon2id$v=19$m=65536,t=1,p=4$<hex salt>$<hex key>`.
/// Parsing and display round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHash {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub lanes: u32,
    pub salt: [u8; SALT_LEN],
    pub key: [u8; KEY_LEN],
}

impl EncodedHash {
    /// Parse an encoded record. Any malformed field is an error; callers
    /// on verification paths fail closed instead of propagating it.
    pub fn parse(encoded: &str) -> Result<Self, CredentialError> {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != 6 || !parts[0].is_empty() || parts[1] != "argon2id" || parts[2] != "v=19"
        {
            return Err(CredentialError::MalformedHashRecord);
        }

        let (memory_kib, time_cost, lanes) = parse_params(parts[3])?;

        let salt_bytes = hex::decode(parts[4]).map_err(|_| CredentialError::MalformedHashRecord)?;
        let key_bytes = hex::decode(parts[5]).map_err(|_| CredentialError::MalformedHashRecord)?;

        let salt: [u8; SALT_LEN] = salt_bytes
            .try_into()
            .map_err(|_| CredentialError::MalformedHashRecord)?;
        let key: [u8; KEY_LEN] = key_bytes
            .try_into()
            .map_err(|_| CredentialError::MalformedHashRecord)?;

        Ok(Self {
            memory_kib,
            time_cost,
            lanes,
            salt,
            key,
        })
    }
}

impl std::fmt::Display for EncodedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "$argon2id$v=19$m={},t={},p={}${}${}",
            self.memory_kib,
            self.time_cost,
            self.lanes,
            hex::encode(self.salt),
            hex::encode(self.key)
        )
    }
}

/// Parse the `m=..,t=..,p=..` parameter field.
fn parse_params(field: &str) -> Result<(u32, u32, u32), CredentialError> {
    let mut m = None;
    let mut t = None;
    let mut p = None;
    for part in field.split(',') {
        let (name, value) = part
            .split_once('=')
            .ok_or(CredentialError::MalformedHashRecord)?;
        let value: u32 = value
            .parse()
            .map_err(|_| CredentialError::MalformedHashRecord)?;
        match name {
            "m" => m = Some(value),
            "t" => t = Some(value),
            "p" => p = Some(value),
            _ => return Err(CredentialError::MalformedHashRecord),
        }
    }
    match (m, t, p) {
        (Some(m), Some(t), Some(p)) => Ok((m, t, p)),
        _ => Err(CredentialError::MalformedHashRecord),
    }
}

/// Run Argon2id with explicit parameters.
fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    memory_kib: u32,
    time_cost: u32,
    lanes: u32,
) -> Result<[u8; KEY_LEN], CredentialError> {
    let params = Params::new(memory_kib, time_cost, lanes, Some(KEY_LEN))
        .map_err(|e| CredentialError::Params(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CredentialError::Params(e.to_string()))?;
    Ok(key)
}

/// Hash a password (or recovery phrase) into a fresh-salted record.
pub fn hash_password(password: &str) -> Result<EncodedHash, CredentialError> {
    let salt = secure_bytes::<SALT_LEN>()?;
    let key = derive_key(password, &salt, ARGON_MEMORY_KIB, ARGON_TIME_COST, ARGON_LANES)?;
    Ok(EncodedHash {
        memory_kib: ARGON_MEMORY_KIB,
        time_cost: ARGON_TIME_COST,
        lanes: ARGON_LANES,
        salt,
        key,
    })
}

/// Verify a password against an encoded record.
///
/// Fails closed: a malformed record or a derivation error is a failed
/// match, never a crash. The key comparison is constant-time.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Ok(record) = EncodedHash::parse(encoded) else {
        return false;
    };
    let Ok(derived) = derive_key(
        password,
        &record.salt,
        record.memory_kib,
        record.time_cost,
        record.lanes,
    ) else {
        return false;
    };
    derived.as_slice().ct_eq(record.key.as_slice()).into()
}

/// Password policy: 8 to 128 bytes.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        return Err(ValidationError::TooShort { min: 8 });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong { max: 128 });
    }
    Ok(())
}

/// Display names: 1 to 50 bytes.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.len() > 50 {
        return Err(ValidationError::TooLong { max: 50 });
    }
    Ok(())
}

/// True iff `id` is exactly 12 ASCII digits.
pub fn validate_account_id(id: &str) -> bool {
    id.len() == ACCOUNT_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

/// A stored account credential: public identity plus the hash records
/// for its two secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub public_id: String,
    pub password_hash: String,
    pub recovery_hash: String,
}

impl Credential {
    /// Mint a new credential for a validated password.
    ///
    /// Returns the credential and the plaintext recovery phrase, which
    /// is shown to the user once and never stored.
    pub fn create(password: &str) -> Result<(Self, String), CredentialError> {
        let public_id = generate_account_id()?;
        let phrase = generate_recovery_phrase()?;
        let credential = Self {
            public_id,
            password_hash: hash_password(password)?.to_string(),
            recovery_hash: hash_password(&phrase)?.to_string(),
        };
        Ok((credential, phrase))
    }
}
