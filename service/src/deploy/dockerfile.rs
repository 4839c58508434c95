//! Dockerfile synthesis
//!
//! A `Dockerfile` already present at the root of a checkout always wins and is
//! used verbatim. Otherwise one is generated from the detected project type.

use std::path::Path;

use tracing::{info, warn};

use crate::deploy::detect::{self, ProjectKind, PYTHON_MANIFEST};
use crate::errors::AppError;
use crate::filesys::dir::Dir;

pub const DOCKERFILE: &str = "Dockerfile";

/// Python entry points tried in order before falling back to a directory scan
const PYTHON_ENTRY_POINTS: [&str; 4] = ["app.py", "main.py", "server.py", "run.py"];

const STATIC_TEMPLATE: &str = r#"FROM nginx:alpine

COPY . /usr/share/nginx/html

EXPOSE 80

CMD ["nginx", "-g", "daemon off;"]"#;

const NODE_TEMPLATE: &str = r#"FROM node:18-alpine

WORKDIR /app

COPY package*.json ./

RUN npm install

COPY . .

EXPOSE 3000

CMD ["npm", "start"]"#;

const GO_TEMPLATE: &str = r#"FROM golang:1.21-alpine AS builder

WORKDIR /app

COPY go.* ./
RUN go mod download

COPY . .
RUN go build -o main .

FROM alpine:latest
WORKDIR /app
COPY --from=builder /app/main .

EXPOSE 8000

CMD ["./main"]"#;

/// What happened when a Dockerfile was requested for a checkout
#[derive(Debug)]
pub enum DockerfileOutcome {
    /// The repository ships its own Dockerfile
    Existing,

    /// A Dockerfile was generated for the detected project type
    Synthesized(ProjectKind),

    /// Generation was attempted but the file could not be written
    WriteFailed { kind: ProjectKind, error: AppError },
}

impl DockerfileOutcome {
    /// Whether a Dockerfile is now present in the checkout
    pub fn exists(&self) -> bool {
        !matches!(self, DockerfileOutcome::WriteFailed { .. })
    }

    /// The project type detected along the way, if detection ran
    pub fn detected_kind(&self) -> Option<ProjectKind> {
        match self {
            DockerfileOutcome::Existing => None,
            DockerfileOutcome::Synthesized(kind) => Some(*kind),
            DockerfileOutcome::WriteFailed { kind, .. } => Some(*kind),
        }
    }
}

/// Make sure `root` contains a Dockerfile, generating one if needed.
///
/// Write failures are reported through the outcome rather than returned as an
/// error; the caller decides whether to carry on.
pub async fn ensure_dockerfile(root: &Path) -> DockerfileOutcome {
    let dir = Dir::new(root);
    let dockerfile = dir.file(DOCKERFILE);

    if dockerfile.exists().await {
        info!("Found existing Dockerfile");
        return DockerfileOutcome::Existing;
    }

    let (kind, port) = detect::detect(root).await;
    info!("Detected project type: {} (port: {})", kind, port);

    let contents = render(kind, &dir).await;
    match dockerfile.write_string(&contents).await {
        Ok(()) => {
            info!("Created Dockerfile for {} project", kind);
            DockerfileOutcome::Synthesized(kind)
        }
        Err(e) => {
            warn!("Error creating Dockerfile: {}", e);
            DockerfileOutcome::WriteFailed {
                kind,
                error: AppError::DockerizeError(e.to_string()),
            }
        }
    }
}

/// Render the Dockerfile for `kind`, inspecting `dir` where the template
/// depends on the checkout contents.
pub async fn render(kind: ProjectKind, dir: &Dir) -> String {
    match kind {
        ProjectKind::Static => STATIC_TEMPLATE.to_string(),
        ProjectKind::NodeJs => NODE_TEMPLATE.to_string(),
        ProjectKind::Go => GO_TEMPLATE.to_string(),
        ProjectKind::Python => {
            let files = dir.list_file_names().await.unwrap_or_default();
            let has_requirements = files.iter().any(|f| f == PYTHON_MANIFEST);
            let entry_point = python_entry_point(&files);
            python_template(has_requirements, entry_point)
        }
    }
}

/// Pick the Python entry point from a sorted list of root-level file names.
///
/// Canonical names are tried in order, then the first non-dunder `.py` file,
/// then `app.py`.
pub fn python_entry_point(files: &[String]) -> &str {
    for candidate in PYTHON_ENTRY_POINTS {
        if files.iter().any(|f| f == candidate) {
            return candidate;
        }
    }

    files
        .iter()
        .find(|f| f.ends_with(".py") && !f.starts_with("__"))
        .map(String::as_str)
        .unwrap_or(PYTHON_ENTRY_POINTS[0])
}

fn python_template(has_requirements: bool, entry_point: &str) -> String {
    let install = if has_requirements {
        "COPY requirements.txt .\nRUN pip install --no-cache-dir -r requirements.txt\n\n"
    } else {
        ""
    };

    format!(
        "FROM python:3.9-slim\n\n\
         WORKDIR /app\n\n\
         {install}\
         COPY . .\n\n\
         EXPOSE 8000\n\n\
         CMD [\"python\", \"{entry_point}\"]"
    )
}
