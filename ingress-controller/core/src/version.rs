//! Parses the engine's self-reported version and answers edition-release
//! ordering queries, so that directives only present in newer commercial
//! builds are emitted only when the installed engine understands them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::{cmp::Ordering, fmt};
use thiserror::Error;

/// The first commercial release that accepts the `mgmt { }` usage-reporting
/// block in the main configuration.
pub const MGMT_BLOCK_RELEASE: &str = "nginx-plus-r33";

static VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<engine>[a-z][a-z0-9-]*) version: (?P<binary>[a-z][a-z0-9-]*)/(?P<base>\d+\.\d+\.\d+)(?: \((?P<edition>[^()]+)\))?$",
    )
    .expect("version regex must compile")
});

static EDITION_RELEASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<edition>[a-z][a-z0-9]*(?:-[a-z][a-z0-9]*)*)-)?r(?P<release>\d+)(?:-p(?P<patch>\d+))?$",
    )
    .expect("edition release regex must compile")
});

/// A parsed engine version.
///
/// Parsing never fails: a string that does not match the expected grammar
/// yields an open-source version, so that edition-gated directives are
/// conservatively omitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEngineVersion {
    pub raw: String,
    pub base_version: String,
    pub is_commercial_edition: bool,
    pub edition_release: Option<EditionRelease>,
}

/// A commercial build identifier such as `nginx-plus-r30-p1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionRelease {
    pub edition: Option<String>,
    pub major_release: u32,
    pub patch: Option<u32>,
}

/// Selects the template family a configuration is rendered with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edition {
    Oss,
    Plus,
}

/// Directives the installed engine is known to accept beyond what its
/// edition implies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub mgmt_block: bool,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid edition release {0:?}: expected [<edition>-]r<release>[-p<patch>]")]
pub struct ParseEditionReleaseError(String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("version {0:?} is not a commercial edition")]
    NotCommercial(String),

    #[error(transparent)]
    Target(#[from] ParseEditionReleaseError),

    #[error("cannot compare edition {have:?} with {want:?}")]
    EditionMismatch { have: String, want: String },
}

// === impl ProxyEngineVersion ===

impl ProxyEngineVersion {
    /// Parses output of the form
    /// `nginx version: nginx/1.25.1 (nginx-plus-r30-p1)`.
    pub fn parse(raw: &str) -> Self {
        let mut version = Self {
            raw: raw.to_string(),
            base_version: String::new(),
            is_commercial_edition: false,
            edition_release: None,
        };

        let Some(caps) = VERSION.captures(raw.trim()) else {
            tracing::debug!(%raw, "Unrecognized engine version; assuming open-source edition");
            return version;
        };
        version.base_version = caps["base"].to_string();

        if let Some(edition) = caps.name("edition") {
            match edition.as_str().parse::<EditionRelease>() {
                Ok(release) if release.edition.is_some() => {
                    version.is_commercial_edition = true;
                    version.edition_release = Some(release);
                }
                Ok(_) | Err(_) => {
                    tracing::debug!(
                        %raw,
                        edition = %edition.as_str(),
                        "Unrecognized edition; assuming open-source edition"
                    );
                }
            }
        }

        version
    }

    /// Returns true iff this version's edition release is at least `target`.
    ///
    /// Fails if this is not a commercial build or if `target` is malformed.
    pub fn compare_edition_release(&self, target: &str) -> Result<bool, CompareError> {
        let have = match (&self.edition_release, self.is_commercial_edition) {
            (Some(release), true) => release,
            _ => return Err(CompareError::NotCommercial(self.raw.clone())),
        };

        let want = target.parse::<EditionRelease>()?;
        if let (Some(h), Some(w)) = (&have.edition, &want.edition) {
            if h != w {
                return Err(CompareError::EditionMismatch {
                    have: h.clone(),
                    want: w.clone(),
                });
            }
        }

        Ok(have.cmp_release(&want) != Ordering::Less)
    }

    /// The guard consulted before emitting a release-gated directive. Any
    /// comparison error means the directive is not supported.
    pub fn supports(&self, target: &str) -> bool {
        match self.compare_edition_release(target) {
            Ok(supported) => supported,
            Err(error) => {
                tracing::debug!(%error, %target, "Edition release check failed");
                false
            }
        }
    }

    pub fn edition(&self) -> Edition {
        if self.is_commercial_edition {
            Edition::Plus
        } else {
            Edition::Oss
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            mgmt_block: self.supports(MGMT_BLOCK_RELEASE),
        }
    }
}

impl fmt::Display for ProxyEngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_version)?;
        match &self.edition_release {
            Some(release) if self.is_commercial_edition => write!(f, "-{release}"),
            _ => Ok(()),
        }
    }
}

// === impl EditionRelease ===

impl EditionRelease {
    /// Orders by `(major_release, patch)`, where an absent patch sorts below
    /// any present patch. The edition name does not participate.
    pub fn cmp_release(&self, other: &Self) -> Ordering {
        (self.major_release, self.patch).cmp(&(other.major_release, other.patch))
    }
}

impl std::str::FromStr for EditionRelease {
    type Err = ParseEditionReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEditionReleaseError(s.to_string());
        let caps = EDITION_RELEASE.captures(s).ok_or_else(invalid)?;
        let major_release = caps["release"].parse().map_err(|_| invalid())?;
        let patch = caps
            .name("patch")
            .map(|p| p.as_str().parse())
            .transpose()
            .map_err(|_| invalid())?;
        Ok(Self {
            edition: caps.name("edition").map(|e| e.as_str().to_string()),
            major_release,
            patch,
        })
    }
}

impl fmt::Display for EditionRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(edition) = &self.edition {
            write!(f, "{edition}-")?;
        }
        write!(f, "r{}", self.major_release)?;
        if let Some(patch) = self.patch {
            write!(f, "-p{patch}")?;
        }
        Ok(())
    }
}

// === impl Edition ===

impl Edition {
    /// The prefix of this edition's template names.
    pub fn template_prefix(&self) -> &'static str {
        match self {
            Self::Oss => "nginx",
            Self::Plus => "nginx-plus",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_prefix())
    }
}
