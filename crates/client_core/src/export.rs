//! Turns a finished artifact list into a `sprint-artifacts/` folder.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use shared::domain::{Artifact, ArtifactKind};
use thiserror::Error;
use tracing::info;

pub const BUNDLE_DIR: &str = "sprint-artifacts";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no artifacts to export")]
    NoArtifacts,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBundle {
    pub files: Vec<BundleFile>,
}

impl ArtifactBundle {
    pub fn build(
        goal: &str,
        artifacts: &[Artifact],
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ExportError> {
        if artifacts.is_empty() {
            return Err(ExportError::NoArtifacts);
        }

        let mut files = vec![BundleFile {
            name: "README.md".to_string(),
            contents: readme(goal, artifacts, generated_at),
        }];
        let mut taken: HashSet<String> = HashSet::from(["README.md".to_string()]);

        for artifact in artifacts {
            let base = sanitize_filename(&artifact.title);
            let ext = extension_for(artifact.kind, &artifact.title);
            let mut name = format!("{base}{ext}");
            let mut suffix = 2;
            while taken.contains(&name) {
                name = format!("{base}-{suffix}{ext}");
                suffix += 1;
            }
            taken.insert(name.clone());

            let contents = artifact
                .content
                .clone()
                .filter(|content| !content.is_empty())
                .unwrap_or_else(|| artifact.preview.clone());
            files.push(BundleFile { name, contents });
        }

        Ok(Self { files })
    }

    /// Writes the bundle under `dir/sprint-artifacts/` and returns that folder.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let root = dir.join(BUNDLE_DIR);
        fs::create_dir_all(&root).map_err(|source| ExportError::Io {
            path: root.clone(),
            source,
        })?;
        for file in &self.files {
            let path = root.join(&file.name);
            fs::write(&path, &file.contents).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
        }
        info!(path = %root.display(), files = self.files.len(), "export: artifacts written");
        Ok(root)
    }
}

/// Code artifacts titled without an extension are assumed to be Python.
pub fn extension_for(kind: ArtifactKind, title: &str) -> &'static str {
    match kind {
        ArtifactKind::Code if title.contains('.') => "",
        ArtifactKind::Code => ".py",
        ArtifactKind::Design | ArtifactKind::Test => ".md",
    }
}

/// Names made only of dots would resolve to the bundle folder or its parent.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !sanitized.is_empty() && sanitized.chars().all(|c| c == '.') {
        return "_".to_string();
    }
    sanitized
}

fn readme(goal: &str, artifacts: &[Artifact], generated_at: DateTime<Utc>) -> String {
    let contents = artifacts
        .iter()
        .enumerate()
        .map(|(i, artifact)| {
            format!(
                "{}. **{}** ({})",
                i + 1,
                artifact.title,
                artifact.kind.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# Sprint Artifacts\n\n**Goal:** {goal}\n**Generated:** {}\n**Artifacts:** {}\n\n## Contents\n\n{contents}\n",
        generated_at.to_rfc3339(),
        artifacts.len()
    )
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
