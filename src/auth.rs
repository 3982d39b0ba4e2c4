//! Authentication configuration.
//!
//! An [`Auth`] carries the credential set for one target and knows how to
//! apply itself onto a [`SessionConfig`]: the community string for v1/v2c,
//! USM user and protocols for v3. The SNMP version itself comes from the
//! module's walk parameters; `Auth` only supplies credentials.

use crate::session::{AuthProtocol, PrivProtocol, SessionConfig, UsmSecurity};
use bytes::Bytes;

/// Credential set for a target.
#[derive(Debug, Clone)]
pub enum Auth {
    /// Community-based authentication (SNMPv1/v2c).
    Community {
        /// The community string.
        community: Bytes,
    },
    /// User-based Security Model (SNMPv3).
    Usm(UsmAuth),
}

impl Auth {
    /// Community credentials.
    ///
    /// # Example
    ///
    /// ```
    /// use snmp_collector::auth::Auth;
    ///
    /// let auth = Auth::community("public");
    /// ```
    pub fn community(community: impl AsRef<[u8]>) -> Self {
        Auth::Community {
            community: Bytes::copy_from_slice(community.as_ref()),
        }
    }

    /// USM credentials for the given security name.
    ///
    /// Returns a builder-style [`UsmAuth`]; chain
    /// [`auth()`](UsmAuth::auth) and [`privacy()`](UsmAuth::privacy) to
    /// raise the security level.
    pub fn usm(username: impl Into<String>) -> UsmAuth {
        UsmAuth {
            username: username.into(),
            auth: None,
            privacy: None,
            context_name: None,
        }
    }

    /// Apply these credentials to a session configuration.
    pub fn apply(&self, config: &mut SessionConfig) {
        match self {
            Auth::Community { community } => {
                config.community = community.clone();
                config.security = None;
            }
            Auth::Usm(usm) => {
                config.security = Some(UsmSecurity {
                    username: usm.username.clone(),
                    auth: usm.auth.clone(),
                    privacy: usm.privacy.clone(),
                    context_name: usm.context_name.clone(),
                });
            }
        }
    }
}

impl Default for Auth {
    /// Community "public".
    fn default() -> Self {
        Auth::community("public")
    }
}

/// USM (SNMPv3) credential builder.
#[derive(Debug, Clone)]
pub struct UsmAuth {
    username: String,
    auth: Option<(AuthProtocol, String)>,
    privacy: Option<(PrivProtocol, String)>,
    context_name: Option<String>,
}

impl UsmAuth {
    /// Enable authentication with the given protocol and passphrase.
    pub fn auth(mut self, protocol: AuthProtocol, passphrase: impl Into<String>) -> Self {
        self.auth = Some((protocol, passphrase.into()));
        self
    }

    /// Enable privacy with the given protocol and passphrase.
    pub fn privacy(mut self, protocol: PrivProtocol, passphrase: impl Into<String>) -> Self {
        self.privacy = Some((protocol, passphrase.into()));
        self
    }

    /// Set the context name.
    pub fn context(mut self, context_name: impl Into<String>) -> Self {
        self.context_name = Some(context_name.into());
        self
    }
}

impl From<UsmAuth> for Auth {
    fn from(usm: UsmAuth) -> Self {
        Auth::Usm(usm)
    }
}
