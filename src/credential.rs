//! Credential extraction.
//!
//! Pure function of the request signals: decides which resolution path a
//! request takes without performing any lookup.

use crate::request::CredentialSignals;
use crate::{Secret, Tainted};

/// Which credential a request presented, after precedence is applied.
#[derive(Debug)]
pub enum Credential {
    /// None of the three signals was set.
    Absent,
    /// Only half of a browser credential was sent and no Telegram id.
    Incomplete,
    /// A Telegram subject id asserted by the Mini App runtime.
    Telegram(TelegramCredential),
    /// A browser bearer token plus the admin id it claims.
    Browser(BrowserCredential),
}

/// Raw Telegram subject id.
#[derive(Debug)]
pub struct TelegramCredential {
    /// Unparsed subject id.
    pub subject: Tainted<String>,
}

/// Raw browser credential pair.
#[derive(Debug)]
pub struct BrowserCredential {
    /// Opaque bearer token.
    pub token: Secret<String>,
    /// Claimed admin id, unparsed.
    pub admin_id: Tainted<String>,
}

impl Credential {
    /// Chooses the credential a request will be resolved with.
    ///
    /// A complete browser pair always wins over a Telegram id. A Telegram id
    /// next to a half browser pair still resolves on the Telegram path.
    ///
    /// # Examples
    ///
    /// ```
    /// use tutordesk_auth::{Credential, RequestMeta};
    ///
    /// let meta = RequestMeta::new("r")
    ///     .with_telegram_id("42")
    ///     .with_admin_token("admin_7_abc")
    ///     .with_admin_id("7");
    ///
    /// assert!(matches!(Credential::extract(meta.signals), Credential::Browser(_)));
    /// ```
    pub fn extract(signals: CredentialSignals) -> Self {
        let CredentialSignals {
            telegram_id,
            admin_token,
            admin_id,
        } = signals;

        match (admin_token, admin_id, telegram_id) {
            (Some(token), Some(admin_id), _) => {
                Credential::Browser(BrowserCredential { token, admin_id })
            }
            (_, _, Some(subject)) => Credential::Telegram(TelegramCredential { subject }),
            (None, None, None) => Credential::Absent,
            _ => Credential::Incomplete,
        }
    }

    /// Path label used in logs and audit events.
    pub fn path(&self) -> &'static str {
        match self {
            Credential::Absent | Credential::Incomplete => "none",
            Credential::Telegram(_) => "telegram",
            Credential::Browser(_) => "browser",
        }
    }
}
