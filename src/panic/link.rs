//! Turning a panic origin into a link someone can click.

use std::env;

use super::locate::Origin;

/// Deployment branch, e.g. `production` or `staging`.
pub const BRANCH_VAR: &str = "SERVER_ENV";
/// Project signature searched for in frame paths and names.
pub const SIGNATURE_VAR: &str = "PROJECT_NAME";
/// Repository host and path, e.g. `github.com/acme/orders`.
pub const REPOSITORY_VAR: &str = "PROJECT_REPOSITORY";

/// Environment inputs of link resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticEnv {
    pub branch: String,
    pub signature: String,
    pub repository: Option<String>,
}

impl DiagnosticEnv {
    pub fn new(branch: impl Into<String>, signature: impl Into<String>) -> Self {
        Self { branch: branch.into(), signature: signature.into(), repository: None }
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Reads `SERVER_ENV`, `PROJECT_NAME` and `PROJECT_REPOSITORY`. Unset
    /// variables read as empty.
    pub fn from_env() -> Self {
        Self {
            branch: env::var(BRANCH_VAR).unwrap_or_default(),
            signature: env::var(SIGNATURE_VAR).unwrap_or_default(),
            repository: env::var(REPOSITORY_VAR).ok().filter(|r| !r.is_empty()),
        }
    }

    /// The branch source links point at. Production deploys link to
    /// `master`.
    pub fn link_branch(&self) -> &str {
        if self.branch == "production" { "master" } else { &self.branch }
    }
}

/// Resolves `origin` to a source reference.
///
/// The signature is looked up in the frame's file path and function name;
/// a match at offset 0 does not count. A file match yields the path below
/// the signature. A function-name match turns that path into
/// `https://<name up to the signature>/blob/<branch><path>#L<line>`; with a
/// repository configured, a file match alone is enough for
/// `https://<repository>/blob/<branch><path>#L<line>`. Without any match
/// the plain origin (`name:line`) is returned.
pub fn resolve_link(origin: &Origin, env: &DiagnosticEnv) -> String {
    let Origin::Frame(frame) = origin else {
        return origin.to_string();
    };
    let sign = env.signature.as_str();
    let branch = env.link_branch();

    let mut link = String::new();
    let in_file = find_after_start(&frame.file, sign);
    if let Some(i) = in_file {
        link = frame.file[i + sign.len()..].to_owned();
    }

    if let Some(i) = find_after_start(&frame.name, sign) {
        let repo = &frame.name[..i + sign.len()];
        link = format!("https://{repo}/blob/{branch}{link}#L{}", frame.line);
    } else if let (Some(_), Some(repo)) = (in_file, env.repository.as_deref()) {
        link = format!("https://{repo}/blob/{branch}{link}#L{}", frame.line);
    }

    if link.is_empty() { origin.to_string() } else { link }
}

fn find_after_start(haystack: &str, needle: &str) -> Option<usize> {
    haystack.find(needle).filter(|&i| i > 0)
}
