// Shader hot reload
//
// Watches a shader directory and reports which shader files changed since
// the last poll. Rebuilding programs is left to the caller.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use crate::backend::ShaderType;

const SHADER_EXTENSIONS: &[&str] = &["vert", "frag", "geom", "comp", "glsl"];

pub struct ShaderWatcher {
    // Dropping the watcher stops the notifications
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    directory: PathBuf,
}

impl ShaderWatcher {
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        let (tx, events) = channel();

        let mut watcher =
            notify::recommended_watcher(tx).context("Failed to create file watcher")?;
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch shader directory: {:?}", directory))?;

        log::info!("Watching {:?} for shader changes", directory);
        Ok(Self {
            _watcher: watcher,
            events,
            directory,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Shader files created or modified since the last call. Never blocks.
    pub fn poll(&self) -> Vec<PathBuf> {
        let mut changed = BTreeSet::new();
        for event in self.events.try_iter() {
            match event {
                Ok(event) if is_content_change(&event.kind) => {
                    changed.extend(event.paths.into_iter().filter(|p| is_shader_path(p)));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Shader watcher error: {}", e),
            }
        }
        changed.into_iter().collect()
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Whether `path` looks like a GLSL source file.
pub fn is_shader_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SHADER_EXTENSIONS.contains(&ext) || ShaderType::from_extension(ext).is_some()
        })
}
