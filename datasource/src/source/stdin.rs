//! `stdin:` backend reading the process's standard input.

use std::io::Read;
use std::sync::{Arc, Weak};

use url::Url;

use crate::{Backend, Context, Data, DatasourceError, DatasourceResult, SourceRegistry};

use super::{Source, SourceSpec};

/// Builds [`StdinSource`]s for `stdin:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinBackend;

impl Backend for StdinBackend {
    fn open(
        &self,
        spec: SourceSpec,
        _registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        Ok(Arc::new(StdinSource { url: spec.url }))
    }
}

/// Reads all of standard input.
///
/// A path on the URL (`stdin:///in.yaml`) only serves as a media type hint.
#[derive(Debug, Clone)]
pub struct StdinSource {
    url: Url,
}

impl Source for StdinSource {
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data> {
        ctx.check()?;
        let mut bytes = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .map_err(|e| Arc::new(DatasourceError::Stdin(e)))?;
        Ok(Data::new(self.url.clone(), args.to_vec(), bytes))
    }
}
