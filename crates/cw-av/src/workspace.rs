//! Per-asset scratch space for a trim job.
//!
//! A [`TrimWorkspace`] is a temporary directory created under the configured
//! temp dir. It holds the working copy of the source audio and the trimmed
//! output until [`deliver`](TrimWorkspace::deliver) moves the output into the
//! import directory. The directory is removed when the workspace is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use cw_core::{AssetId, Error};
use tempfile::TempDir;

pub struct TrimWorkspace {
    temp_dir: TempDir,
    asset: AssetId,
    input: PathBuf,
}

impl TrimWorkspace {
    /// Create a workspace under `temp_root` and copy `source` into it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Copy`] if the temp directory cannot be created or the
    /// source cannot be copied.
    pub fn stage(asset: &AssetId, source: &Path, temp_root: &Path) -> cw_core::Result<Self> {
        fs::create_dir_all(temp_root)
            .map_err(|e| Error::copy(temp_root, format!("failed to create temp root: {e}")))?;

        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("cw-{}{}-", asset.category, asset.cart_id))
            .tempdir_in(temp_root)
            .map_err(|e| Error::copy(temp_root, format!("failed to create temp dir: {e}")))?;

        let file_name = source
            .file_name()
            .ok_or_else(|| Error::copy(source, "source has no file name"))?;
        let input = temp_dir.path().join(file_name);

        fs::copy(source, &input)
            .map_err(|e| Error::copy(source, format!("failed to copy into workspace: {e}")))?;

        tracing::debug!("{}: staged {:?} as {:?}", asset, source, input);

        Ok(Self {
            temp_dir,
            asset: asset.clone(),
            input,
        })
    }

    /// The working copy of the source audio.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Where the transcoder writes the trimmed audio. Carries the import file
    /// name so delivery is a plain move.
    pub fn output(&self) -> PathBuf {
        self.temp_dir.path().join(self.asset.import_file_name())
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the trimmed output into `import_dir` under the import naming
    /// convention and return the delivered path.
    ///
    /// A rename is tried first. Across filesystems the file is copied to a
    /// hidden `.part` name in the import directory and renamed into place, so
    /// the server never sees a half-written file under a routable name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Copy`] if the output is missing or the move fails.
    pub fn deliver(self, import_dir: &Path) -> cw_core::Result<PathBuf> {
        let output = self.output();
        if !output.exists() {
            return Err(Error::copy(&output, "trimmed output does not exist"));
        }
        if !import_dir.is_dir() {
            return Err(Error::copy(import_dir, "import directory does not exist"));
        }

        let file_name = self.asset.import_file_name();
        let dest = import_dir.join(&file_name);

        if fs::rename(&output, &dest).is_err() {
            let partial = import_dir.join(format!(".{file_name}.part"));
            fs::copy(&output, &partial)
                .map_err(|e| Error::copy(&output, format!("failed to copy to import dir: {e}")))?;
            if let Err(e) = fs::rename(&partial, &dest) {
                let _ = fs::remove_file(&partial);
                return Err(Error::copy(&dest, format!("failed to finalize import file: {e}")));
            }
        }

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetId {
        "MUS/12".parse().unwrap()
    }

    fn source_in(dir: &Path) -> PathBuf {
        let category = dir.join("MUS");
        fs::create_dir_all(&category).unwrap();
        let source = category.join("SP0012.wav");
        fs::write(&source, b"RIFF....original").unwrap();
        source
    }

    #[test]
    fn stage_copies_source() {
        let root = tempfile::tempdir().unwrap();
        let source = source_in(root.path());
        let temp_root = root.path().join("tmp");

        let ws = TrimWorkspace::stage(&asset(), &source, &temp_root).unwrap();

        assert!(ws.temp_dir().starts_with(&temp_root));
        assert_eq!(ws.input().file_name().unwrap(), "SP0012.wav");
        assert_eq!(fs::read(ws.input()).unwrap(), b"RIFF....original");
        assert_eq!(ws.output().file_name().unwrap(), "MUS0012.wav");
        // The source is untouched.
        assert!(source.exists());
    }

    #[test]
    fn stage_missing_source_is_copy_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("MUS/SP0012.wav");
        let result = TrimWorkspace::stage(&asset(), &missing, root.path());
        assert!(matches!(result, Err(Error::Copy { .. })));
    }

    #[test]
    fn deliver_moves_output_into_import_dir() {
        let root = tempfile::tempdir().unwrap();
        let source = source_in(root.path());
        let import = root.path().join("import");
        fs::create_dir(&import).unwrap();

        let ws = TrimWorkspace::stage(&asset(), &source, &root.path().join("tmp")).unwrap();
        fs::write(ws.output(), b"trimmed").unwrap();
        let temp_dir = ws.temp_dir().to_path_buf();

        let delivered = ws.deliver(&import).unwrap();
        assert_eq!(delivered, import.join("MUS0012.wav"));
        assert_eq!(fs::read(&delivered).unwrap(), b"trimmed");
        // Dropping the workspace cleans the scratch directory.
        assert!(!temp_dir.exists());
    }

    #[test]
    fn deliver_without_output_fails() {
        let root = tempfile::tempdir().unwrap();
        let source = source_in(root.path());
        let ws = TrimWorkspace::stage(&asset(), &source, &root.path().join("tmp")).unwrap();
        assert!(matches!(ws.deliver(root.path()), Err(Error::Copy { .. })));
    }

    #[test]
    fn deliver_to_missing_import_dir_fails() {
        let root = tempfile::tempdir().unwrap();
        let source = source_in(root.path());
        let ws = TrimWorkspace::stage(&asset(), &source, &root.path().join("tmp")).unwrap();
        fs::write(ws.output(), b"trimmed").unwrap();
        let result = ws.deliver(&root.path().join("nowhere"));
        assert!(matches!(result, Err(Error::Copy { .. })));
    }
}
