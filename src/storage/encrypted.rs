//! SQLite-backed session records. The feature payload is stored AES-GCM
//! encrypted; decision columns stay queryable in clear.
//! Key derived from a deployment secret (in production: from a secret manager).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::StoreError;
use crate::features::FeatureVector;
use crate::risk::{Decision, RiskDecision};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String, StoreError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|_| StoreError::Crypto)?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>, StoreError> {
    let raw = BASE64.decode(encoded)?;
    if raw.len() < NONCE_LEN {
        return Err(StoreError::Encoding("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| StoreError::Crypto)?;
    cipher.decrypt(nonce.into(), ct).map_err(|_| StoreError::Crypto)
}

/// One analysed submission as persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub features: FeatureVector,
    pub final_risk_score: Option<f64>,
    pub attack_intensity: Option<f64>,
    pub user_trust: Option<f64>,
    pub decision: Option<String>,
    pub reason: Option<String>,
    pub verified_via_challenge: bool,
}

pub struct SessionStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SessionStore {
    /// Open or create DB at path.
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, secret)
    }

    pub fn open_in_memory(secret: &[u8]) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, secret)
    }

    fn init(conn: Connection, secret: &[u8]) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                features_enc TEXT NOT NULL,
                final_risk_score REAL,
                attack_intensity REAL,
                user_trust REAL,
                decision TEXT,
                reason TEXT,
                verified_via_challenge INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, created_at);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// First half of create-then-update: raw features only.
    pub fn create_record(&self, features: &FeatureVector) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_vec(features)?;
        let enc = encrypt(&self.key, &payload)?;
        self.conn()?.execute(
            "INSERT INTO sessions (id, user_id, created_at, features_enc) VALUES (?1, ?2, ?3, ?4)",
            params![id, features.user_id, Utc::now().timestamp_millis(), enc],
        )?;
        Ok(id)
    }

    pub fn record_decision(&self, id: &str, decision: &RiskDecision) -> Result<(), StoreError> {
        let n = self.conn()?.execute(
            "UPDATE sessions SET final_risk_score = ?2, attack_intensity = ?3, user_trust = ?4, \
             decision = ?5, reason = ?6, updated_at = ?7 WHERE id = ?1",
            params![
                id,
                decision.final_risk_score,
                decision.attack_intensity,
                decision.user_trust,
                decision.decision.as_str(),
                decision.reason,
                Utc::now().timestamp_millis()
            ],
        )?;
        if n == 0 {
            return Err(StoreError::UnknownRecord(id.to_string()));
        }
        Ok(())
    }

    /// Admission granted after a solved challenge.
    pub fn mark_verified(&self, id: &str) -> Result<(), StoreError> {
        let n = self.conn()?.execute(
            "UPDATE sessions SET decision = ?2, verified_via_challenge = 1, updated_at = ?3 WHERE id = ?1",
            params![id, Decision::Allow.as_str(), Utc::now().timestamp_millis()],
        )?;
        if n == 0 {
            return Err(StoreError::UnknownRecord(id.to_string()));
        }
        Ok(())
    }

    pub fn get_record(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT user_id, created_at, updated_at, features_enc, final_risk_score, \
                 attack_intensity, user_trust, decision, reason, verified_via_challenge \
                 FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, Option<f64>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, bool>(9)?,
                    ))
                },
            )
            .optional()?;
        let Some((user_id, created_at, updated_at, enc, score, intensity, trust, decision, reason, verified)) = row
        else {
            return Ok(None);
        };
        let features: FeatureVector = serde_json::from_slice(&decrypt(&self.key, &enc)?)?;
        Ok(Some(SessionRecord {
            id: id.to_string(),
            user_id,
            created_at,
            updated_at,
            features,
            final_risk_score: score,
            attack_intensity: intensity,
            user_trust: trust,
            decision,
            reason,
            verified_via_challenge: verified,
        }))
    }

    /// Retention: delete records created before `ts` (epoch ms)
    pub fn prune_before(&self, ts: i64) -> Result<u64, StoreError> {
        let n = self
            .conn()?
            .execute("DELETE FROM sessions WHERE created_at < ?1", params![ts])?;
        Ok(n as u64)
    }
}
