//! `file:` backend reading local files through `cap-std`.

use std::sync::{Arc, Weak};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use url::Url;

use crate::{
    Backend, Context, Data, DatasourceError, DatasourceResult, MediaType, SourceRegistry,
};

use super::{Source, SourceSpec};

/// Builds [`FileSource`]s for `file:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBackend;

impl Backend for FileBackend {
    fn open(
        &self,
        spec: SourceSpec,
        _registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        Ok(Arc::new(FileSource::from_url(spec.url)?))
    }
}

/// A local file, or a directory whose entry names are read as a JSON array.
#[derive(Debug, Clone)]
pub struct FileSource {
    url: Url,
    path: Utf8PathBuf,
}

impl FileSource {
    /// Build a source for a `file:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`DatasourceError::InvalidDefinition`] when the URL does not
    /// name a local UTF-8 path.
    pub fn from_url(url: Url) -> DatasourceResult<Self> {
        let native = url.to_file_path().map_err(|()| {
            Arc::new(DatasourceError::invalid_definition(
                url.as_str(),
                "not a local file URL",
            ))
        })?;
        let path = Utf8PathBuf::from_path_buf(native).map_err(|p| {
            Arc::new(DatasourceError::invalid_definition(
                p.to_string_lossy(),
                "path is not valid UTF-8",
            ))
        })?;
        Ok(Self { url, path })
    }

    /// Filesystem path this source reads.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_file(&self) -> std::io::Result<Vec<u8>> {
        let (dir, name) = open_parent_dir_and_name(&self.path)?;
        dir.read(name)
    }

    fn list_dir(&self) -> std::io::Result<Vec<String>> {
        let dir = Dir::open_ambient_dir(&self.path, ambient_authority())?;
        let mut names = dir
            .entries()?
            .map(|entry| entry?.file_name())
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort_unstable();
        Ok(names)
    }
}

impl Source for FileSource {
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data> {
        ctx.check()?;
        if self.path.is_dir() {
            tracing::debug!(path = %self.path, "listing directory datasource");
            let names = self
                .list_dir()
                .map_err(|e| Arc::new(DatasourceError::file(&self.path, e)))?;
            let bytes = serde_json::to_vec(&names)
                .map_err(|e| Arc::new(DatasourceError::encode(MediaType::JsonArray, e)))?;
            return Ok(Data::with_media_type(
                self.url.clone(),
                args.to_vec(),
                bytes,
                MediaType::JsonArray,
            ));
        }
        tracing::debug!(path = %self.path, "reading file datasource");
        let bytes = self
            .read_file()
            .map_err(|e| Arc::new(DatasourceError::file(&self.path, e)))?;
        Ok(Data::new(self.url.clone(), args.to_vec(), bytes))
    }
}

/// Return the parent directory of `path`, falling back to `"."` when the path
/// has no parent or the parent is empty.
fn parent_or_dot(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

/// Open the parent directory of `path` via `cap-std` and extract the file name.
fn open_parent_dir_and_name(path: &Utf8Path) -> std::io::Result<(Dir, String)> {
    let parent = parent_or_dot(path);
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::other("cannot determine file name for datasource path"))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name.to_owned()))
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, ensure};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;

    use super::FileSource;
    use crate::{Context, DatasourceError, MediaType, Source};

    #[fixture]
    fn workdir() -> TempDir {
        tempfile::tempdir().expect("create temporary directory")
    }

    fn url_for(dir: &TempDir, name: &str) -> Result<Url> {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name))
            .map_err(|p| anyhow!("non UTF-8 temp path {}", p.display()))?;
        Url::from_file_path(&path).map_err(|()| anyhow!("cannot build file URL for {path}"))
    }

    #[rstest]
    fn reads_file_contents(workdir: TempDir) -> Result<()> {
        std::fs::write(workdir.path().join("values.yaml"), "name: demo\n")?;
        let source = FileSource::from_url(url_for(&workdir, "values.yaml")?)
            .map_err(|e| anyhow!(e.to_string()))?;
        let data = source
            .read(&Context::background(), &[])
            .map_err(|e| anyhow!(e.to_string()))?;
        ensure!(data.media_type().ok() == Some(MediaType::Yaml));
        ensure!(data.unmarshal().ok() == Some(&json!({"name": "demo"})));
        Ok(())
    }

    #[rstest]
    fn lists_directory_entries(workdir: TempDir) -> Result<()> {
        std::fs::write(workdir.path().join("b.json"), "{}")?;
        std::fs::write(workdir.path().join("a.json"), "{}")?;
        let source = FileSource::from_url(url_for(&workdir, "")?)
            .map_err(|e| anyhow!(e.to_string()))?;
        let data = source
            .read(&Context::background(), &[])
            .map_err(|e| anyhow!(e.to_string()))?;
        ensure!(data.media_type().ok() == Some(MediaType::JsonArray));
        ensure!(data.unmarshal().ok() == Some(&json!(["a.json", "b.json"])));
        Ok(())
    }

    #[rstest]
    fn missing_file_reports_path(workdir: TempDir) -> Result<()> {
        let source = FileSource::from_url(url_for(&workdir, "absent.json")?)
            .map_err(|e| anyhow!(e.to_string()))?;
        let err = source
            .read(&Context::background(), &[])
            .expect_err("missing file should fail");
        ensure!(matches!(&*err, DatasourceError::File { .. }));
        ensure!(err.to_string().contains("absent.json"));
        Ok(())
    }

    #[rstest]
    fn cancelled_context_skips_read(workdir: TempDir) -> Result<()> {
        let source = FileSource::from_url(url_for(&workdir, "absent.json")?)
            .map_err(|e| anyhow!(e.to_string()))?;
        let ctx = Context::background();
        ctx.cancel();
        let err = source.read(&ctx, &[]).expect_err("cancelled read should fail");
        ensure!(matches!(&*err, DatasourceError::Cancelled));
        Ok(())
    }
}
