//! Token entities for paired access/refresh credentials.

use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::subject::SubjectId;

/// Longest revocation reason accepted for storage
pub const MAX_REVOKE_REASON_LENGTH: usize = 300;

/// Token scheme reported to clients alongside a pair
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Opaque issuance metadata carried on both records of a pair
pub type TokenMetadata = BTreeMap<String, serde_json::Value>;

/// Declared purpose of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential presented on every request
    Access,
    /// Long-lived credential exchanged for a new pair
    Refresh,
}

impl TokenKind {
    /// The kind a token of this kind is paired with
    pub fn paired_kind(self) -> Self {
        match self {
            TokenKind::Access => TokenKind::Refresh,
            TokenKind::Refresh => TokenKind::Access,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(TokenKind::Access),
            "refresh" => Ok(TokenKind::Refresh),
            _ => Err(format!("Invalid token kind: {}", s)),
        }
    }
}

/// Claims structure for the signed envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, `null` for anonymous principals
    pub sub: Option<SubjectId>,

    /// JWT ID, matches `TokenRecord::id`
    pub jti: Uuid,

    /// Token kind
    pub typ: TokenKind,

    /// Issued at timestamp (seconds)
    pub iat: i64,

    /// Expiration timestamp (seconds)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a token issued at `issued_at` and valid until `expires_at`
    pub fn new(
        subject: Option<SubjectId>,
        jti: Uuid,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject,
            jti,
            typ: kind,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Expired once `now` reaches `exp`; the boundary itself is expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Subject the token represents, if any
    pub fn subject(&self) -> Option<&SubjectId> {
        self.sub.as_ref()
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Revocation applied to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub revoked_at: DateTime<Utc>,
    pub reason: String,
}

impl Revocation {
    /// Revocation stamped with the current time
    pub fn now(reason: impl Into<String>) -> Self {
        Self {
            revoked_at: Utc::now(),
            reason: reason.into(),
        }
    }
}

/// Persisted half of a credential
///
/// Records are created in pairs and only their revocation fields ever
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Token identifier (jti)
    pub id: Uuid,

    /// Access or refresh
    pub kind: TokenKind,

    /// Identifier of the sibling issued in the same transaction
    pub paired_id: Uuid,

    /// Subject the token represents
    pub subject_id: Option<SubjectId>,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Terminal once set
    pub revoked: bool,

    pub revoked_at: Option<DateTime<Utc>>,

    pub revoke_reason: Option<String>,

    /// Issuance metadata, never interpreted here
    #[serde(default)]
    pub metadata: TokenMetadata,
}

fn expiry(issued_at: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, String> {
    issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| format!("token lifetime of {}s is out of range", ttl.num_seconds()))
}

impl TokenRecord {
    /// Builds a linked access/refresh pair issued at `issued_at`
    ///
    /// Timestamps are truncated to whole seconds so the records agree
    /// exactly with the `iat`/`exp` claims of their envelopes.
    ///
    /// # Returns
    ///
    /// * `Ok((access, refresh))` - `paired_id` cross-references each other
    /// * `Err(String)` - An expiry falls outside the representable range
    pub fn new_pair(
        subject_id: Option<SubjectId>,
        metadata: TokenMetadata,
        issued_at: DateTime<Utc>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<(TokenRecord, TokenRecord), String> {
        let issued_at = issued_at.trunc_subsecs(0);
        let access_expires_at = expiry(issued_at, access_ttl)?;
        let refresh_expires_at = expiry(issued_at, refresh_ttl)?;
        let access_id = Uuid::new_v4();
        let refresh_id = Uuid::new_v4();

        let access = TokenRecord {
            id: access_id,
            kind: TokenKind::Access,
            paired_id: refresh_id,
            subject_id: subject_id.clone(),
            issued_at,
            expires_at: access_expires_at,
            revoked: false,
            revoked_at: None,
            revoke_reason: None,
            metadata: metadata.clone(),
        };

        let refresh = TokenRecord {
            id: refresh_id,
            kind: TokenKind::Refresh,
            paired_id: access_id,
            subject_id,
            issued_at,
            expires_at: refresh_expires_at,
            revoked: false,
            revoked_at: None,
            revoke_reason: None,
            metadata,
        };

        Ok((access, refresh))
    }

    /// Claims the signed envelope for this record carries
    pub fn claims(&self) -> Claims {
        Claims::new(
            self.subject_id.clone(),
            self.id,
            self.kind,
            self.issued_at,
            self.expires_at,
        )
    }

    /// Whether `other` is this record's sibling
    pub fn is_paired_with(&self, other: &TokenRecord) -> bool {
        self.paired_id == other.id && other.paired_id == self.id && self.kind != other.kind
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the retention window after expiry has fully elapsed
    pub fn is_reapable_at(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        now > self.expires_at + retention
    }

    /// Applies `revocation` unless the record is already revoked
    ///
    /// # Returns
    ///
    /// `true` if the record transitioned, `false` if it was already revoked
    pub fn apply_revocation(&mut self, revocation: &Revocation) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(revocation.revoked_at);
        self.revoke_reason = Some(revocation.reason.clone());
        true
    }
}

/// Token pair returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,

    /// Signed refresh token
    pub refresh_token: String,

    /// jti of the access token
    pub access_id: Uuid,

    /// jti of the refresh token
    pub refresh_id: Uuid,

    /// Always "bearer"
    pub token_type: String,

    /// Access token lifetime in seconds
    pub access_expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// Creates a token pair from the signed strings and their records
    pub fn new(
        access_token: String,
        refresh_token: String,
        access: &TokenRecord,
        refresh: &TokenRecord,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            access_id: access.id,
            refresh_id: refresh.id,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            access_expires_in: (access.expires_at - access.issued_at).num_seconds(),
            refresh_expires_in: (refresh.expires_at - refresh.issued_at).num_seconds(),
        }
    }
}
