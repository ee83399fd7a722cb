use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel indicators that mark a package as coming from the Anaconda
/// default channels.
pub const DEFAULT_DENIED_CHANNELS: &[&str] = &[
    "repo.anaconda.com",
    "pkgs/main",
    "pkgs/r",
    "pkgs/msys2",
    "defaults",
];

pub const DEFAULT_ALLOWED_CHANNELS: &[&str] = &["conda-forge"];

/// Channels accepted only on exact match.
pub const DEFAULT_PASS_CHANNELS: &[&str] = &["pypi"];

/// Compliance classification of one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelVerdict {
    Pass,
    EmptyChannel,
    AnacondaDefault,
    UnknownChannel(String),
}

impl ChannelVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, ChannelVerdict::Pass)
    }

    /// Only the Anaconda default channels count as a strict violation;
    /// the other failures are risks.
    pub fn is_violation(&self) -> bool {
        matches!(self, ChannelVerdict::AnacondaDefault)
    }
}

impl fmt::Display for ChannelVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelVerdict::Pass => write!(f, "PASS"),
            ChannelVerdict::EmptyChannel => write!(f, "RISK_EMPTY_CHANNEL"),
            ChannelVerdict::AnacondaDefault => write!(f, "VIOLATION_ANACONDA_DEFAULT"),
            ChannelVerdict::UnknownChannel(channel) => {
                write!(f, "RISK_UNKNOWN_CHANNEL_({channel})")
            }
        }
    }
}

/// Substring-based channel allow/deny policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub allowed: Vec<String>,
    pub denied: Vec<String>,
    pub pass: Vec<String>,
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self {
            allowed: to_owned(DEFAULT_ALLOWED_CHANNELS),
            denied: to_owned(DEFAULT_DENIED_CHANNELS),
            pass: to_owned(DEFAULT_PASS_CHANNELS),
        }
    }
}

impl ChannelPolicy {
    pub fn new(allowed: Vec<String>, denied: Vec<String>, pass: Vec<String>) -> Self {
        Self {
            allowed,
            denied,
            pass,
        }
    }

    /// Denied indicators win over allowed ones, so a mirror URL that embeds
    /// `pkgs/main` is still a violation.
    pub fn classify(&self, channel: Option<&str>) -> ChannelVerdict {
        let channel = match channel.map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => return ChannelVerdict::EmptyChannel,
        };

        if self.denied.iter().any(|bad| channel.contains(bad.as_str())) {
            return ChannelVerdict::AnacondaDefault;
        }

        if self.allowed.iter().any(|ok| channel.contains(ok.as_str())) {
            return ChannelVerdict::Pass;
        }

        if self.pass.iter().any(|p| p == channel) {
            return ChannelVerdict::Pass;
        }

        ChannelVerdict::UnknownChannel(channel.to_string())
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
