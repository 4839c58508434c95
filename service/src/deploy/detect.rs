//! Project type detection
//!
//! Classifies a checkout into a build strategy by looking at the files in its
//! root. Checks run in a fixed order and the first match wins, since a repo can
//! carry several markers at once (a Python service with an HTML demo page is
//! still a Python service).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filesys::dir::Dir;

pub const NODE_MANIFEST: &str = "package.json";
pub const PYTHON_MANIFEST: &str = "requirements.txt";
pub const GO_MANIFEST: &str = "go.mod";

/// Build strategy inferred from a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    NodeJs,
    Python,
    Go,
    Static,
}

impl ProjectKind {
    /// Port the synthesized image exposes
    pub fn default_port(&self) -> u16 {
        match self {
            ProjectKind::NodeJs => 3000,
            ProjectKind::Python => 8000,
            ProjectKind::Go => 8000,
            ProjectKind::Static => 80,
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectKind::NodeJs => "nodejs",
            ProjectKind::Python => "python",
            ProjectKind::Go => "go",
            ProjectKind::Static => "static",
        };
        f.write_str(name)
    }
}

/// Classify the checkout at `root`.
///
/// Never fails: an unreadable directory is treated as empty and falls back to
/// [`ProjectKind::Static`].
pub async fn detect(root: &Path) -> (ProjectKind, u16) {
    let files = match Dir::new(root).list_file_names().await {
        Ok(files) => files,
        Err(e) => {
            debug!("Unable to list {}: {}, assuming empty", root.display(), e);
            Vec::new()
        }
    };

    let kind = classify(&files);
    debug!("Detected project type: {} (port: {})", kind, kind.default_port());
    (kind, kind.default_port())
}

/// Classify a list of root-level file names
pub fn classify<S: AsRef<str>>(files: &[S]) -> ProjectKind {
    let has = |name: &str| files.iter().any(|f| f.as_ref() == name);
    let has_ext = |ext: &str| files.iter().any(|f| f.as_ref().ends_with(ext));

    if has(NODE_MANIFEST) {
        ProjectKind::NodeJs
    } else if has(PYTHON_MANIFEST) || has_ext(".py") {
        ProjectKind::Python
    } else if has(GO_MANIFEST) || has_ext(".go") {
        ProjectKind::Go
    } else {
        // Static whether or not an .html file is present
        ProjectKind::Static
    }
}
