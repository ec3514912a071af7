//! `merge:` behaviour: precedence, arity, type guards and failure handling.

use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use test_helpers::documents::DocumentTree;
use url::Url;

use super::MergeSource;
use crate::test_support::mem_registry;
use crate::{Context, DatasourceError, MediaType, Source};

#[fixture]
fn tree() -> DocumentTree {
    DocumentTree::new().expect("create document tree")
}

const DOCS: &[(&str, &str)] = &[
    ("base", r#"{"a": 1, "b": {"x": 1}}"#),
    ("override", r#"{"b": {"y": 2}, "c": 3}"#),
    ("a1", r#"{"a": 1}"#),
    ("a2", r#"{"a": 2}"#),
    ("seq-long", r#"{"a": [1, 2]}"#),
    ("seq-short", r#"{"a": [3]}"#),
    ("list", "[1, 2]"),
    ("scalar", "42"),
    ("empty.json", "null"),
    ("deep.yaml", "a:\n  b:\n    c: yaml\n    keep: true\n"),
    ("broken.json", r#"{"a": "#),
    (
        "lookalikes",
        r#"{"underscored": "1_000", "hex": "0x1A", "word": "yes", "tilde": "~",
            "date": "2001-12-14", "octal": "0o17", "exp": "1e3", "null": "null",
            "bool": "True", "n": 7, "f": 1.5}"#,
    ),
];

fn merge(tree: &DocumentTree, uri: &str) -> Result<Value> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    let data = registry
        .read(&Context::background(), uri, &[])
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(data.media_type().ok() == Some(MediaType::Yaml));
    data.unmarshal()
        .cloned()
        .map_err(|e| anyhow!(e.to_string()))
}

#[rstest]
#[case("merge:mem:base|mem:override", json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}))]
#[case("merge:mem:a1|mem:a2", json!({"a": 2}))]
#[case("merge:mem:a2|mem:a1", json!({"a": 1}))]
#[case("merge:mem:seq-long|mem:seq-short", json!({"a": [3]}))]
#[case("merge:mem:base|mem:base", json!({"a": 1, "b": {"x": 1}}))]
#[case(
    "merge:mem:base|mem:a2|mem:seq-short",
    json!({"a": [3], "b": {"x": 1}})
)]
#[case(
    "merge:mem:deep.yaml|mem:base",
    json!({"a": 1, "b": {"x": 1}})
)]
fn merges_left_to_right(
    tree: DocumentTree,
    #[case] uri: &str,
    #[case] expected: Value,
) -> Result<()> {
    let merged = merge(&tree, uri)?;
    ensure!(merged == expected, "{uri}: got {merged}");
    Ok(())
}

#[rstest]
fn nested_yaml_maps_combine_with_json(tree: DocumentTree) -> Result<()> {
    tree.write("extra.json", r#"{"a": {"b": {"c": "json"}}}"#)?;
    let merged = merge(&tree, "merge:mem:deep.yaml|extra.json")?;
    ensure!(merged == json!({"a": {"b": {"c": "json", "keep": true}}}), "got {merged}");
    Ok(())
}

#[rstest]
fn output_is_canonical_yaml(tree: DocumentTree) -> Result<()> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    let data = registry
        .read(&Context::background(), "merge:mem:override|mem:base", &[])
        .map_err(|e| anyhow!(e.to_string()))?;
    let text = std::str::from_utf8(data.bytes())?;
    ensure!(text == "a: 1\nb:\n  x: 1\n  y: 2\nc: 3\n", "unexpected YAML:\n{text}");
    ensure!(data.url().scheme() == "merge");
    Ok(())
}

#[rstest]
#[case("merge:mem:base")]
#[case("merge:")]
fn single_part_fails_before_reading(tree: DocumentTree, #[case] uri: &str) -> Result<()> {
    let (registry, mem) = mem_registry(tree.root(), DOCS);
    let err = registry
        .read(&Context::background(), uri, &[])
        .expect_err("one part cannot be merged");
    ensure!(
        err.to_string().contains("need at least 2 datasources to merge"),
        "{err}"
    );
    ensure!(mem.source("base").reads() == 0);
    Ok(())
}

#[rstest]
#[case("list", "sequence", "application/json")]
#[case("scalar", "string", "text/plain")]
#[case("empty.json", "null", "application/json")]
fn non_map_parts_are_rejected(
    tree: DocumentTree,
    #[case] doc: &str,
    #[case] found_kind: &str,
    #[case] media: &str,
) -> Result<()> {
    let (registry, mem) = mem_registry(tree.root(), DOCS);
    let uri = format!("merge:mem:base|mem:{doc}|mem:a1");
    let err = registry
        .read(&Context::background(), &uri, &[])
        .expect_err("non-map part must fail the merge");
    let DatasourceError::Read { source, .. } = &*err else {
        return Err(anyhow!("expected outer Read wrapper, got {err:?}"));
    };
    let DatasourceError::NotAMap {
        name,
        found,
        media_type,
    } = &**source
    else {
        return Err(anyhow!("expected NotAMap, got {source:?}"));
    };
    ensure!(name == &format!("mem:{doc}"));
    ensure!(*found == found_kind, "found {found}");
    ensure!(media_type.as_str() == media);
    ensure!(mem.source("a1").reads() == 0, "later parts must not be read");
    Ok(())
}

#[rstest]
fn unresolvable_part_is_named(tree: DocumentTree) -> Result<()> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    let merge = registry
        .dynamic("merge:mem:base|mem:nope", None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let err = merge
        .read(&Context::background(), &[])
        .expect_err("unknown part must fail");
    ensure!(
        matches!(&*err, DatasourceError::Resolve { name, .. } if name == "mem:nope"),
        "{err:?}"
    );
    Ok(())
}

#[rstest]
fn read_failure_stops_the_merge(tree: DocumentTree) -> Result<()> {
    let (registry, mem) = mem_registry(tree.root(), DOCS);
    let merge = registry
        .dynamic("merge:mem:base|missing.json|mem:a1", None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let err = merge
        .read(&Context::background(), &[])
        .expect_err("missing file must fail");
    ensure!(
        matches!(&*err, DatasourceError::Read { name, source }
            if name == "missing.json" && matches!(&**source, DatasourceError::File { .. })),
        "{err:?}"
    );
    ensure!(mem.source("base").reads() == 1);
    ensure!(mem.source("a1").reads() == 0);
    Ok(())
}

#[rstest]
fn cancelled_context_reads_nothing(tree: DocumentTree) -> Result<()> {
    let (registry, mem) = mem_registry(tree.root(), DOCS);
    let merge = registry
        .dynamic("merge:mem:a1|mem:a2", None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let ctx = Context::background();
    ctx.cancel();
    let err = merge.read(&ctx, &[]).expect_err("cancelled merge must fail");
    ensure!(err.is_context_error());
    ensure!(mem.source("a1").reads() == 0);
    ensure!(mem.source("a2").reads() == 0);
    Ok(())
}

#[rstest]
fn aliases_are_resolved_before_uris(tree: DocumentTree) -> Result<()> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    registry
        .register("mem:a1", Url::parse("mem:a2")?, None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let data = registry
        .read(&Context::background(), "merge:mem:base|mem:a1", &[])
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(data.unmarshal().ok() == Some(&json!({"a": 2, "b": {"x": 1}})));
    Ok(())
}

#[rstest]
fn outer_query_stays_on_the_result(tree: DocumentTree) -> Result<()> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    let data = registry
        .read(&Context::background(), "merge:mem:a1|mem:a2?type=text/plain", &[])
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(data.url().query() == Some("type=text/plain"));
    ensure!(data.media_type().ok() == Some(MediaType::Yaml));
    ensure!(data.unmarshal().ok() == Some(&json!({"a": 2})));
    Ok(())
}

#[rstest]
fn dropped_registry_is_reported() -> Result<()> {
    let merge = MergeSource::new(Url::parse("merge:a|b")?, std::sync::Weak::new());
    let err = merge
        .read(&Context::background(), &[])
        .expect_err("registry is gone");
    ensure!(matches!(&*err, DatasourceError::RegistryDropped { .. }));
    Ok(())
}

#[rstest]
fn registered_merge_does_not_pin_the_registry(tree: DocumentTree) -> Result<()> {
    let (registry, _) = mem_registry(tree.root(), DOCS);
    let merge = registry
        .register("combined", Url::parse("merge:mem:a1|mem:a2")?, None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let weak = Arc::downgrade(&registry);
    drop(registry);
    ensure!(weak.upgrade().is_none(), "registry should be released");
    ensure!(merge.read(&Context::background(), &[]).is_err());
    Ok(())
}

#[rstest]
fn strings_that_look_like_other_scalars_survive_the_round_trip(tree: DocumentTree) -> Result<()> {
    let merged = merge(&tree, "merge:mem:lookalikes|mem:lookalikes")?;
    let expected: Value = serde_json::from_str(
        DOCS.iter()
            .find(|(name, _)| *name == "lookalikes")
            .map(|(_, body)| *body)
            .ok_or_else(|| anyhow!("lookalikes document missing"))?,
    )?;
    ensure!(merged == expected, "got {merged}");
    Ok(())
}

#[rstest]
fn undecodable_part_is_named_and_stops_the_merge(tree: DocumentTree) -> Result<()> {
    let (registry, mem) = mem_registry(tree.root(), DOCS);
    let merge = registry
        .dynamic("merge:mem:base|mem:broken.json|mem:a1", None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let err = merge
        .read(&Context::background(), &[])
        .expect_err("malformed JSON must fail the merge");
    ensure!(
        matches!(&*err, DatasourceError::Read { name, source }
            if name == "mem:broken.json"
                && matches!(&**source, DatasourceError::Decode { media_type: MediaType::Json, .. })),
        "{err:?}"
    );
    ensure!(mem.source("base").reads() == 1);
    ensure!(mem.source("a1").reads() == 0, "later parts must not be read");
    Ok(())
}

#[rstest]
fn non_ascii_aliases_and_paths_resolve_as_written(tree: DocumentTree) -> Result<()> {
    tree.write("été.json", r#"{"b": 2}"#)?;
    let (registry, _) = mem_registry(tree.root(), DOCS);
    registry
        .register("données", Url::parse("mem:a1")?, None)
        .map_err(|e| anyhow!(e.to_string()))?;
    let data = registry
        .read(&Context::background(), "merge:données|été.json", &[])
        .map_err(|e| anyhow!(e.to_string()))?;
    ensure!(data.unmarshal().ok() == Some(&json!({"a": 1, "b": 2})));
    ensure!(registry.get("été.json").is_some(), "path is bound under its decoded name");
    Ok(())
}

#[rstest]
fn parts_are_percent_decoded() -> Result<()> {
    let merge = MergeSource::new(
        Url::parse("merge:donn%C3%A9es|a%20b.yaml")?,
        std::sync::Weak::new(),
    );
    let parts = merge.parts().map_err(|e| anyhow!(e.to_string()))?;
    ensure!(parts == ["données", "a b.yaml"], "got {parts:?}");
    Ok(())
}
