//! In-memory sources shared by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use url::Url;

use crate::{
    Backend, Context, Data, DatasourceError, DatasourceResult, Source, SourceRegistry, SourceSpec,
};

/// Fixed payload that counts how often it is read.
#[derive(Debug)]
pub(crate) struct StaticSource {
    url: Url,
    body: Vec<u8>,
    reads: AtomicUsize,
}

impl StaticSource {
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Source for StaticSource {
    fn read(&self, ctx: &Context, args: &[String]) -> DatasourceResult<Data> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        ctx.check()?;
        Ok(Data::new(self.url.clone(), args.to_vec(), self.body.clone()))
    }
}

/// Serves `mem:<name>` URLs from a fixed table of documents.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemBackend {
    docs: Arc<BTreeMap<String, Arc<StaticSource>>>,
}

impl MemBackend {
    /// Documents keyed by name. The name's extension, if any, drives media
    /// type inference; bodies opening with `{` or `[` sniff as JSON.
    pub(crate) fn new(docs: &[(&str, &str)]) -> Self {
        let docs = docs
            .iter()
            .map(|(name, body)| {
                let url = Url::parse(&format!("mem:{name}")).expect("valid mem URL");
                let source = StaticSource {
                    url,
                    body: body.as_bytes().to_vec(),
                    reads: AtomicUsize::new(0),
                };
                ((*name).to_owned(), Arc::new(source))
            })
            .collect();
        Self {
            docs: Arc::new(docs),
        }
    }

    pub(crate) fn source(&self, name: &str) -> Arc<StaticSource> {
        Arc::clone(self.docs.get(name).expect("document registered"))
    }
}

impl Backend for MemBackend {
    fn open(
        &self,
        spec: SourceSpec,
        _registry: &Weak<SourceRegistry>,
    ) -> DatasourceResult<Arc<dyn Source>> {
        let source = self.docs.get(spec.url.path()).ok_or_else(|| {
            Arc::new(DatasourceError::invalid_definition(
                spec.url.as_str(),
                "no such in-memory document",
            ))
        })?;
        Ok(Arc::clone(source) as Arc<dyn Source>)
    }
}

/// Registry with the built-in backends plus `mem:` serving `docs`, rooted
/// at `base_dir`.
pub(crate) fn mem_registry(
    base_dir: &camino::Utf8Path,
    docs: &[(&str, &str)],
) -> (Arc<SourceRegistry>, MemBackend) {
    let mem = MemBackend::new(docs);
    let registry = SourceRegistry::builder()
        .base_dir(base_dir)
        .backend("mem", mem.clone())
        .build()
        .expect("registry builds");
    (registry, mem)
}
