//! Map document service
//!
//! Finds the primary/sidecar file pair, reads both concurrently and writes
//! both back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, Session};
use crate::config::CodecSettings;
use crate::domain::LayoutSettings;
use crate::infrastructure::traits::FileSystem;
use crate::util::path::{has_extension, sidecar_path};

/// The files making up one map on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapFiles {
    pub primary: PathBuf,
    /// Sidecar to merge, if one was given or found
    pub sidecar: Option<PathBuf>,
}

/// Service for loading and saving map file pairs.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
    codec: CodecSettings,
}

impl DocumentService {
    pub fn new(fs: Arc<dyn FileSystem>, codec: CodecSettings) -> Self {
        Self { fs, codec }
    }

    pub fn codec(&self) -> &CodecSettings {
        &self.codec
    }

    /// Pick primary and sidecar from a set of selected files by extension.
    ///
    /// The last file of each kind wins. Without a primary this fails.
    pub fn classify(&self, paths: &[PathBuf]) -> ApplicationResult<MapFiles> {
        let mut primary = None;
        let mut sidecar = None;
        for path in paths {
            if has_extension(path, &self.codec.primary_extension) {
                primary = Some(path.clone());
            }
            if has_extension(path, &self.codec.sidecar_extension) {
                sidecar = Some(path.clone());
            }
        }
        let primary = primary.ok_or_else(|| ApplicationError::MissingRequiredFile {
            extension: self.codec.primary_extension.clone(),
        })?;
        Ok(MapFiles { primary, sidecar })
    }

    /// File pair for `primary`, with the sidecar next to it if that exists.
    pub fn discover(&self, primary: &Path) -> MapFiles {
        let candidate = sidecar_path(primary, &self.codec.sidecar_extension);
        let sidecar = self.fs.is_file(&candidate).then_some(candidate);
        MapFiles {
            primary: primary.to_path_buf(),
            sidecar,
        }
    }

    /// Read both files (concurrently) and build a session from them.
    ///
    /// A sidecar that vanished between discovery and reading is treated as absent.
    #[instrument(level = "debug", skip(self, layout))]
    pub fn load(&self, files: &MapFiles, layout: LayoutSettings) -> ApplicationResult<Session> {
        let fs = &self.fs;
        let (primary, sidecar) = rayon::join(
            || {
                fs.read_to_string(&files.primary)
                    .with_path_context("read map", &files.primary)
            },
            || match &files.sidecar {
                Some(path) => fs
                    .read_to_string(path)
                    .optional_file("read sidecar", path),
                None => Ok(None),
            },
        );
        let primary = primary?;
        let sidecar = sidecar?;
        debug!(
            "load: primary {} bytes, sidecar {:?} bytes",
            primary.len(),
            sidecar.as_ref().map(String::len)
        );

        let session = Session::load(&primary, sidecar.as_deref(), &self.codec, layout)?;
        info!("loaded {}", files.primary.display());
        Ok(session)
    }

    /// Load `primary` and the sidecar next to it, if any.
    pub fn open(&self, primary: &Path, layout: LayoutSettings) -> ApplicationResult<Session> {
        if !self.fs.is_file(primary) {
            return Err(ApplicationError::MapNotFound {
                path: primary.to_path_buf(),
            });
        }
        self.load(&self.discover(primary), layout)
    }

    /// Write both documents of `session`; the sidecar goes next to `primary`.
    ///
    /// Each file is replaced atomically, the sidecar before the primary.
    #[instrument(level = "debug", skip(self, session))]
    pub fn save(&self, session: &Session, primary: &Path) -> ApplicationResult<MapFiles> {
        let docs = session.save_with_version(&self.codec.map_version);
        let sidecar = sidecar_path(primary, &self.codec.sidecar_extension);

        self.fs
            .ensure_parent(primary)
            .with_path_context("create directory for", primary)?;
        // Sidecar first: a failure there leaves the previous pair intact
        self.fs
            .write(&sidecar, &docs.sidecar)
            .with_path_context("write sidecar", &sidecar)?;
        self.fs
            .write(primary, &docs.primary)
            .with_path_context("write map", primary)?;

        info!("saved {} and {}", primary.display(), sidecar.display());
        Ok(MapFiles {
            primary: primary.to_path_buf(),
            sidecar: Some(sidecar),
        })
    }
}
