#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use isoload_boundary::{AmbientRuntime, BoundaryLoader, StaticCatalog, TypeDef};
    use isoload_core::{DependencyCoordinate, IsoError, LibraryTarget, Repository, Result};
    use isoload_resolver::*;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Serves published artifacts from memory and counts every request.
    #[derive(Default)]
    struct MockFetcher {
        artifacts: Mutex<HashMap<(String, String), Bytes>>,
        fetches: AtomicUsize,
    }

    impl MockFetcher {
        fn publish(&self, repository: &Repository, coordinate: &DependencyCoordinate, data: &[u8]) {
            self.artifacts.lock().unwrap().insert(
                (repository.url().to_string(), coordinate.relative_url()),
                Bytes::copy_from_slice(data),
            );
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtifactFetcher for MockFetcher {
        async fn fetch(
            &self,
            repository: &Repository,
            coordinate: &DependencyCoordinate,
        ) -> Result<Option<Bytes>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .artifacts
                .lock()
                .unwrap()
                .get(&(repository.url().to_string(), coordinate.relative_url()))
                .cloned())
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        added: Mutex<Vec<PathBuf>>,
    }

    impl RecordingTarget {
        fn added(&self) -> Vec<PathBuf> {
            self.added.lock().unwrap().clone()
        }
    }

    impl LibraryTarget for RecordingTarget {
        fn add_library(&self, location: &Path) {
            self.added.lock().unwrap().push(location.to_path_buf());
        }
    }

    fn content(artifact: &str) -> Vec<u8> {
        format!("jar bytes of {artifact}").into_bytes()
    }

    fn coord(artifact: &str) -> DependencyCoordinate {
        let d = Digests::of(&content(artifact));
        DependencyCoordinate::builder("org.example", artifact, "1.0", d.md5, d.sha1).build()
    }

    fn published(fetcher: &MockFetcher, coordinate: &DependencyCoordinate) {
        fetcher.publish(
            coordinate.repository(),
            coordinate,
            &content(coordinate.artifact_id()),
        );
    }

    fn downloader(
        target: Arc<dyn LibraryTarget>,
        cache_dir: &Path,
        fetcher: Arc<MockFetcher>,
        graph: Arc<dyn DependencyGraph>,
    ) -> DependencyDownloader {
        let engine = Arc::new(RemoteEngine::new(fetcher, graph));
        DependencyDownloader::new(target, cache_dir, engine)
    }

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    // ── Download and inject tests ──────────────────────────────

    #[tokio::test]
    async fn test_resolve_downloads_and_injects() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let a = coord("alpha");
        published(&fetcher, &a);

        let dl = downloader(target.clone(), dir.path(), fetcher.clone(), Arc::new(NoDependencies));
        let files = dl.resolve(&[a.clone()]).await.unwrap();

        let expected = dir.path().join("org/example/alpha/1.0/alpha-1.0.jar");
        assert_eq!(files, vec![expected.clone()]);
        assert_eq!(target.added(), vec![expected.clone()]);
        assert_eq!(std::fs::read(expected).unwrap(), content("alpha"));
    }

    #[tokio::test]
    async fn test_second_resolve_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let loader = Arc::new(BoundaryLoader::new(
            Arc::new(AmbientRuntime::new()),
            Arc::new(StaticCatalog::new()),
        ));
        let a = coord("alpha");
        published(&fetcher, &a);

        let dl = downloader(loader.clone(), dir.path(), fetcher.clone(), Arc::new(NoDependencies));
        dl.resolve(&[a.clone()]).await.unwrap();
        dl.resolve(&[a.clone()]).await.unwrap();

        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(loader.libraries().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupted_cache_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let a = coord("alpha");
        published(&fetcher, &a);

        let cached = dir.path().join(a.relative_path());
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, b"truncated").unwrap();

        let dl = downloader(
            Arc::new(RecordingTarget::default()),
            dir.path(),
            fetcher.clone(),
            Arc::new(NoDependencies),
        );
        dl.resolve(&[a]).await.unwrap();

        assert_eq!(fetcher.fetch_count(), 1);
        assert_eq!(std::fs::read(cached).unwrap(), content("alpha"));
    }

    #[tokio::test]
    async fn test_cache_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("libs");
        let dl = downloader(
            Arc::new(RecordingTarget::default()),
            &nested,
            Arc::new(MockFetcher::default()),
            Arc::new(NoDependencies),
        );
        assert!(dl.resolve(&[]).await.unwrap().is_empty());
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_unusable_cache_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let dl = downloader(
            Arc::new(RecordingTarget::default()),
            &blocker.join("libs"),
            Arc::new(MockFetcher::default()),
            Arc::new(NoDependencies),
        );
        assert!(matches!(dl.resolve(&[coord("alpha")]).await, Err(IsoError::Io(_))));
    }

    // ── Verification tests ─────────────────────────────────────

    async fn resolve_with_bad_digest(bad_md5: bool) -> (IsoError, Arc<RecordingTarget>, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let good = coord("alpha");
        let bad = if bad_md5 {
            good.derive().md5("0".repeat(32)).build()
        } else {
            good.derive().sha1("0".repeat(40)).build()
        };
        published(&fetcher, &bad);

        let dl = downloader(target.clone(), dir.path(), fetcher, Arc::new(NoDependencies));
        let err = dl.resolve(&[bad.clone()]).await.unwrap_err();
        let path = dir.path().join(bad.relative_path());
        let existed = path.exists();
        assert!(!existed, "unverified artifact must not be cached");
        (err, target, dir.path().to_path_buf())
    }

    #[tokio::test]
    async fn test_md5_mismatch_fails_download() {
        let (err, target, cache_dir) = resolve_with_bad_digest(true).await;
        match &err {
            IsoError::DependencyDownload {
                coordinate,
                cache_dir: hinted,
                source,
            } => {
                assert_eq!(coordinate, "org.example:alpha:1.0");
                assert_eq!(hinted, &cache_dir);
                assert!(matches!(
                    **source,
                    IsoError::ChecksumMismatch { algorithm: "MD5", .. }
                ));
            }
            other => panic!("expected download error, got {other:?}"),
        }
        assert!(err.to_string().contains("delete"));
        assert!(target.added().is_empty());
    }

    #[tokio::test]
    async fn test_sha1_mismatch_fails_download() {
        let (err, target, _) = resolve_with_bad_digest(false).await;
        match err {
            IsoError::DependencyDownload { source, .. } => assert!(matches!(
                *source,
                IsoError::ChecksumMismatch { algorithm: "SHA-1", .. }
            )),
            other => panic!("expected download error, got {other:?}"),
        }
        assert!(target.added().is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_injects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let good = coord("alpha");
        let missing = coord("ghost");
        published(&fetcher, &good);

        let dl = downloader(target.clone(), dir.path(), fetcher, Arc::new(NoDependencies));
        match dl.resolve(&[good, missing]).await {
            Err(IsoError::DependencyDownload { coordinate, source, .. }) => {
                assert_eq!(coordinate, "org.example:ghost:1.0");
                assert!(matches!(*source, IsoError::ArtifactNotFound { .. }));
            }
            other => panic!("expected download error, got {other:?}"),
        }
        assert!(target.added().is_empty());
    }

    #[tokio::test]
    async fn test_escaping_coordinate_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("libs");
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let escaping = coord("alpha").derive().version("../../../..").build();
        published(&fetcher, &escaping);

        let dl = downloader(target.clone(), &cache_dir, fetcher.clone(), Arc::new(NoDependencies));
        match dl.resolve(&[escaping]).await {
            Err(IsoError::DependencyDownload { source, .. }) => {
                assert!(matches!(*source, IsoError::InvalidCoordinate { .. }));
            }
            other => panic!("expected download error, got {other:?}"),
        }
        assert_eq!(fetcher.fetch_count(), 0);
        assert!(target.added().is_empty());
        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(written, vec![std::ffi::OsString::from("libs")]);
        assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 0);
    }

    // ── Repository tests ───────────────────────────────────────

    #[test]
    fn test_repositories_deduplicated_in_order() {
        let dl = DependencyDownloader::new(
            Arc::new(RecordingTarget::default()),
            "/tmp/unused",
            Arc::new(RemoteEngine::new(
                Arc::new(MockFetcher::default()),
                Arc::new(NoDependencies),
            )),
        );
        let coords = [
            coord("a").derive().repository(Repository::sponge()).build(),
            coord("b"),
            coord("c").derive().repository(Repository::new("https://repo.spongepowered.org/maven/")).build(),
        ];
        assert_eq!(
            dl.repositories_for(&coords),
            vec![Repository::maven_central(), Repository::sponge()]
        );
    }

    #[tokio::test]
    async fn test_falls_through_to_declared_repository() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let a = coord("alpha").derive().repository(Repository::sponge()).build();
        published(&fetcher, &a);

        let dl = downloader(
            Arc::new(RecordingTarget::default()),
            dir.path(),
            fetcher.clone(),
            Arc::new(NoDependencies),
        );
        dl.resolve(&[a]).await.unwrap();
        assert_eq!(fetcher.fetch_count(), 2);
    }

    // ── Transitive tests ───────────────────────────────────────

    #[tokio::test]
    async fn test_transitive_outcomes_are_flattened_root_first() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let root = coord("root")
            .derive()
            .transitive()
            .exclusion("org.example:excluded")
            .build();
        let (b, c, d) = (coord("b"), coord("excluded"), coord("d"));
        for x in [&root, &b, &c, &d] {
            published(&fetcher, x);
        }
        let graph = StaticGraph::new()
            .with_edge(&root, b.clone())
            .with_edge(&root, c.clone())
            .with_edge(&b, d.clone())
            .with_edge(&c, coord("under-excluded"));

        let dl = downloader(target.clone(), dir.path(), fetcher.clone(), Arc::new(graph));
        let files = dl.resolve(&[root]).await.unwrap();

        assert_eq!(file_names(&files), vec!["root-1.0.jar", "b-1.0.jar", "d-1.0.jar"]);
        assert_eq!(target.added(), files);
        assert_eq!(fetcher.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_non_transitive_root_ignores_graph() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let root = coord("root");
        let b = coord("b");
        published(&fetcher, &root);
        published(&fetcher, &b);
        let graph = StaticGraph::new().with_edge(&root, b);

        let dl = downloader(
            Arc::new(RecordingTarget::default()),
            dir.path(),
            fetcher,
            Arc::new(graph),
        );
        let files = dl.resolve(&[root]).await.unwrap();
        assert_eq!(file_names(&files), vec!["root-1.0.jar"]);
    }

    #[tokio::test]
    async fn test_transitive_failure_names_child() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let root = coord("root").derive().transitive().build();
        published(&fetcher, &root);
        let graph = StaticGraph::new().with_edge(&root, coord("absent"));

        let dl = downloader(target.clone(), dir.path(), fetcher, Arc::new(graph));
        match dl.resolve(&[root]).await {
            Err(IsoError::DependencyDownload { coordinate, .. }) => {
                assert_eq!(coordinate, "org.example:absent:1.0")
            }
            other => panic!("expected download error, got {other:?}"),
        }
        assert!(target.added().is_empty());
    }

    #[test]
    fn test_outcome_flattening_is_depth_first() {
        let leaf = DownloadOutcome::succeeded(coord("leaf"), vec![], vec![]);
        let mid = DownloadOutcome::succeeded(coord("mid"), vec![], vec![leaf]);
        let side = DownloadOutcome::failed(coord("side"), IsoError::Config("x".into()));
        let root = DownloadOutcome::succeeded(coord("root"), vec![], vec![mid, side]);

        let order: Vec<_> = root
            .into_flat()
            .into_iter()
            .map(|o| (o.coordinate.artifact_id().to_string(), o.is_success()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("root".to_string(), true),
                ("mid".to_string(), true),
                ("leaf".to_string(), true),
                ("side".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_static_graph_from_toml() {
        let raw = r#"
[[dependencies."org.example:root:1.0"]]
group_id = "org.example"
artifact_id = "child"
version = "2.0"
md5 = "00000000000000000000000000000000"
sha1 = "0000000000000000000000000000000000000000"
"#;
        let graph = StaticGraph::from_toml(raw).unwrap();
        let children = graph.children(&coord("root"));
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].display_id(), "org.example:child:2.0");
    }

    // ── DependencyList tests ───────────────────────────────────

    fn ids(list: &DependencyList) -> Vec<String> {
        list.generate_list()
            .iter()
            .map(|c| c.artifact_id().to_string())
            .collect()
    }

    #[test]
    fn test_generate_list_preserves_order() {
        let mut list = DependencyList::new();
        list.add(coord("c")).add(coord("a")).add(coord("b"));
        assert_eq!(ids(&list), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_conditions_evaluated_at_generation() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut list = DependencyList::new();
        let f = flag.clone();
        list.add_when(coord("late"), move || f.load(Ordering::SeqCst));
        list.add_if(coord("picky"), |c| c.version() == "1.0");
        list.add_if(coord("never"), |c| c.version() == "9.9");

        assert_eq!(ids(&list), vec!["picky"]);
        flag.store(true, Ordering::SeqCst);
        assert_eq!(ids(&list), vec!["late", "picky"]);
    }

    fn broken_variants(good: &DependencyCoordinate) -> (DependencyCoordinate, DependencyCoordinate) {
        (
            good.derive().md5("0".repeat(32)).build(),
            good.derive().sha1("0".repeat(40)).build(),
        )
    }

    #[test]
    fn test_derived_variants_are_independent_entries() {
        let good = coord("configurate-hocon");
        let (bad_md5, bad_sha1) = broken_variants(&good);

        let mut list = DependencyList::new();
        list.add(good.clone());
        list.add_if(bad_md5.clone(), |_| true);
        list.add_if(bad_sha1, |_| false);

        assert_eq!(list.len(), 3);
        assert_eq!(list.generate_list(), vec![good, bad_md5]);
    }

    #[test]
    fn test_repeated_add_keeps_both_entries() {
        let mut list = DependencyList::new();
        list.add(coord("a")).add(coord("b"));
        list.add_when(coord("a"), || false);
        list.add(coord("a"));

        assert_eq!(list.len(), 4);
        assert_eq!(ids(&list), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_remove_allows_adding_back() {
        let good = coord("a");
        let (bad_md5, _) = broken_variants(&good);
        let mut list = DependencyList::new();
        list.add(good.clone()).add(bad_md5.clone()).add(coord("b"));

        list.remove(&good).remove(&bad_md5);
        assert_eq!(list.len(), 1);
        assert_eq!(ids(&list), vec!["b"]);

        list.add(good.clone());
        assert_eq!(list.generate_list(), vec![coord("b"), good]);
    }

    #[test]
    fn test_deny_blocks_until_removed() {
        let good = coord("a");
        let (bad_md5, _) = broken_variants(&good);
        let mut list = DependencyList::new();
        list.add(good.clone()).add(bad_md5.clone());

        list.deny(bad_md5.clone());
        list.add(bad_md5.clone());
        assert!(list.is_denied(&bad_md5));
        assert_eq!(list.generate_list(), vec![good.clone()]);

        list.remove(&bad_md5);
        list.add(bad_md5.clone());
        assert_eq!(list.generate_list(), vec![good, bad_md5]);
    }

    #[test]
    fn test_deny_compares_full_coordinate() {
        let mut list = DependencyList::new();
        list.add(coord("a")).add(coord("a").derive().classifier("sources").build());
        list.deny(coord("a"));
        let generated = list.generate_list();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].classifier(), Some("sources"));
    }

    #[test]
    fn test_class_missing_condition() {
        let ambient = Arc::new(AmbientRuntime::new());
        ambient.register(TypeDef::builder("demo::Present").build());

        let present = ClassMissingCondition::with_source("demo::Present", ambient.clone());
        let missing = ClassMissingCondition::with_source("demo::Fabricated", ambient.clone());
        assert!(!present.is_met());
        assert!(missing.is_met());

        let mut list = DependencyList::new();
        list.add_if_missing(coord("a"), present);
        list.add_if_missing(coord("b"), missing);
        assert_eq!(ids(&list), vec!["b"]);
    }

    #[test]
    fn test_symbol_missing_uses_global_runtime() {
        let mut list = DependencyList::new();
        list.add_if_symbol_missing(coord("a"), "resolver_tests::GlobalMarker");
        assert_eq!(ids(&list), vec!["a"]);

        AmbientRuntime::global().register(TypeDef::builder("resolver_tests::GlobalMarker").build());
        assert!(ids(&list).is_empty());
    }

    #[tokio::test]
    async fn test_resolve_list_uses_current_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(MockFetcher::default());
        let target = Arc::new(RecordingTarget::default());
        let (a, b) = (coord("alpha"), coord("beta"));
        published(&fetcher, &a);
        published(&fetcher, &b);

        let mut list = DependencyList::new();
        list.add(a).add_when(b, || false);

        let dl = downloader(target.clone(), dir.path(), fetcher, Arc::new(NoDependencies));
        let files = dl.resolve_list(&list).await.unwrap();
        assert_eq!(file_names(&files), vec!["alpha-1.0.jar"]);
    }

    // ── Verification helper tests ──────────────────────────────

    #[test]
    fn test_verify_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.jar");
        std::fs::write(&path, content("x")).unwrap();
        let d = Digests::of(&content("x"));

        assert!(verify_file(&path, &d.md5, &d.sha1).is_ok());
        assert!(verify_file(&path, &d.md5, &"0".repeat(40)).is_err());
        assert!(matches!(
            verify_file(&dir.path().join("missing.jar"), &d.md5, &d.sha1),
            Err(IsoError::Io(_))
        ));
    }
}
