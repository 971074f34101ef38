use super::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ROOT: &str = "/mem";

#[derive(Clone, Copy, Debug)]
enum Node {
    Dir,
    File(u64),
}

#[derive(Default)]
struct Tree {
    nodes: BTreeMap<PathBuf, Node>,
    unreadable: BTreeSet<PathBuf>,
    unprobeable: BTreeSet<PathBuf>,
}

#[derive(Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory tree with injectable failures and I/O accounting.
#[derive(Clone)]
struct MemoryFs {
    tree: Arc<Mutex<Tree>>,
    listings: Arc<Gauge>,
    probes: Arc<Gauge>,
    latency: Duration,
}

impl MemoryFs {
    fn new() -> Self {
        let mut tree = Tree::default();
        tree.nodes.insert(PathBuf::from(ROOT), Node::Dir);
        Self {
            tree: Arc::new(Mutex::new(tree)),
            listings: Arc::new(Gauge::default()),
            probes: Arc::new(Gauge::default()),
            latency: Duration::ZERO,
        }
    }

    fn insert(self, relative: &str, node: Node) -> Self {
        self.tree
            .lock()
            .expect("tree lock")
            .nodes
            .insert(absolute(relative), node);
        self
    }

    fn dir(self, relative: &str) -> Self {
        self.insert(relative, Node::Dir)
    }

    fn file(self, relative: &str, len: u64) -> Self {
        self.insert(relative, Node::File(len))
    }

    fn unreadable(self, relative: &str) -> Self {
        self.tree
            .lock()
            .expect("tree lock")
            .unreadable
            .insert(absolute(relative));
        self
    }

    fn unprobeable(self, relative: &str) -> Self {
        self.tree
            .lock()
            .expect("tree lock")
            .unprobeable
            .insert(absolute(relative));
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn peak_listings(&self) -> usize {
        self.listings.peak.load(Ordering::SeqCst)
    }

    fn peak_probes(&self) -> usize {
        self.probes.peak.load(Ordering::SeqCst)
    }

    fn probes_started(&self) -> usize {
        self.probes.started.load(Ordering::SeqCst)
    }
}

async fn pause(latency: Duration) {
    if latency.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(latency).await;
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(
        &self,
        path: PathBuf,
    ) -> impl Future<Output = io::Result<Vec<OsString>>> + Send + 'static {
        let tree = Arc::clone(&self.tree);
        let listings = Arc::clone(&self.listings);
        let latency = self.latency;
        async move {
            listings.enter();
            pause(latency).await;
            listings.exit();
            let tree = tree.lock().expect("tree lock");
            if tree.unreadable.contains(&path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "unreadable"));
            }
            match tree.nodes.get(&path) {
                Some(Node::Dir) => Ok(tree
                    .nodes
                    .keys()
                    .filter(|child| child.parent() == Some(path.as_path()))
                    .filter_map(|child| child.file_name().map(OsString::from))
                    .collect()),
                Some(Node::File(_)) => Err(io::Error::other("not a directory")),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "missing")),
            }
        }
    }

    fn metadata(&self, path: PathBuf) -> impl Future<Output = io::Result<Metadata>> + Send + 'static {
        let tree = Arc::clone(&self.tree);
        let probes = Arc::clone(&self.probes);
        let latency = self.latency;
        async move {
            probes.enter();
            pause(latency).await;
            probes.exit();
            let tree = tree.lock().expect("tree lock");
            if tree.unprobeable.contains(&path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "unprobeable"));
            }
            match tree.nodes.get(&path) {
                Some(Node::Dir) => Ok(Metadata::directory()),
                Some(Node::File(len)) => Ok(Metadata::file(*len)),
                None => Err(io::Error::new(io::ErrorKind::NotFound, "missing")),
            }
        }
    }
}

fn absolute(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}

/// Root contains `a/`, `b/` and `f.txt`; `a/` contains `x.txt`; `b/` is empty.
fn sample_tree() -> MemoryFs {
    MemoryFs::new()
        .dir("a")
        .dir("b")
        .file("f.txt", 3)
        .file("a/x.txt", 5)
}

fn wide_tree(directories: usize, files_per_directory: usize) -> MemoryFs {
    let mut fs = MemoryFs::new();
    for d in 0..directories {
        let dir = format!("d{d}");
        fs = fs.dir(&dir);
        for f in 0..files_per_directory {
            fs = fs.file(&format!("{dir}/f{f}"), f as u64);
        }
    }
    fs
}

fn relative_set(entries: &[Entry]) -> BTreeSet<(PathBuf, usize)> {
    entries
        .iter()
        .map(|entry| {
            let relative = entry
                .relative_to(Path::new(ROOT))
                .expect("entry below root")
                .to_path_buf();
            (relative, entry.depth())
        })
        .collect()
}

fn expected(items: &[(&str, usize)]) -> BTreeSet<(PathBuf, usize)> {
    items
        .iter()
        .map(|(path, depth)| (PathBuf::from(path), *depth))
        .collect()
}

async fn run(builder: WalkBuilder, fs: MemoryFs) -> (Vec<Entry>, Vec<WalkError>) {
    let mut walk = builder.build_on(fs).expect("build walk");
    let mut errors = walk.errors().expect("error channel");
    let entries = tokio::time::timeout(Duration::from_secs(10), walk.collect_entries())
        .await
        .expect("walk finished in time");
    let mut reported = Vec::new();
    while let Some(error) = errors.recv().await {
        reported.push(error);
    }
    (entries, reported)
}

#[tokio::test]
async fn emits_every_node_with_its_depth() {
    let (entries, errors) = run(WalkBuilder::new(ROOT), sample_tree()).await;

    assert!(errors.is_empty());
    assert_eq!(entries.len(), 4);
    assert_eq!(
        relative_set(&entries),
        expected(&[("a", 0), ("b", 0), ("f.txt", 0), ("a/x.txt", 1)])
    );
    for entry in &entries {
        assert_eq!(Some(entry.name()), entry.path().file_name());
    }
    let x = entries
        .iter()
        .find(|entry| entry.name() == "x.txt")
        .expect("x.txt");
    assert!(x.metadata().is_file());
    assert_eq!(x.metadata().len(), 5);
}

#[tokio::test]
async fn empty_root_ends_without_entries() {
    let (entries, errors) = run(WalkBuilder::new(ROOT), MemoryFs::new()).await;
    assert!(entries.is_empty());
    assert!(errors.is_empty());
}

#[tokio::test]
async fn rejected_directories_are_neither_emitted_nor_descended() {
    let fs = sample_tree().file("b/y.txt", 1).dir("b/deeper");
    let builder = WalkBuilder::new(ROOT).visit(|entry| entry.name() != "b");

    let mut walk = builder.build_on(fs.clone()).expect("build walk");
    let mut entries = Vec::new();
    while let Some(entry) = walk.next_entry().await {
        entries.push(entry);
    }

    assert_eq!(
        relative_set(&entries),
        expected(&[("a", 0), ("f.txt", 0), ("a/x.txt", 1)])
    );
    let progress = walk.progress();
    assert_eq!(progress.entries_pruned, 1);
    assert_eq!(progress.directories_listed, 2, "root and a only");
    assert!(progress.finished);
    assert_eq!(fs.probes_started(), 4, "b's children are never probed");
}

#[tokio::test]
async fn visit_sees_metadata_before_deciding() {
    let fs = sample_tree().file("big.bin", 4096);
    let builder = WalkBuilder::new(ROOT).visit(|entry| entry.is_dir() || entry.metadata().len() < 1024);
    let (entries, _) = run(builder, fs).await;
    assert!(entries.iter().all(|entry| entry.name() != "big.bin"));
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn listing_failure_is_reported_once_and_siblings_continue() {
    let fs = sample_tree().dir("b/c").file("b/c/z.txt", 1).unreadable("a");
    let (entries, errors) = run(WalkBuilder::new(ROOT), fs).await;

    assert_eq!(
        relative_set(&entries),
        expected(&[
            ("a", 0),
            ("b", 0),
            ("f.txt", 0),
            ("b/c", 1),
            ("b/c/z.txt", 2)
        ])
    );
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert!(error.is_listing());
    assert_eq!(error.path(), absolute("a"));
    assert_eq!(error.io_error().kind(), io::ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn probe_failure_drops_only_that_entry() {
    let fs = sample_tree().unprobeable("a/x.txt");
    let (entries, errors) = run(WalkBuilder::new(ROOT), fs).await;

    assert_eq!(
        relative_set(&entries),
        expected(&[("a", 0), ("b", 0), ("f.txt", 0)])
    );
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        WalkError::Probe {
            path, name, depth, ..
        } => {
            assert_eq!(path, &absolute("a/x.txt"));
            assert_eq!(name, "x.txt");
            assert_eq!(*depth, 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unprobeable_directory_is_not_descended() {
    let fs = sample_tree().unprobeable("a");
    let (entries, errors) = run(WalkBuilder::new(ROOT), fs).await;
    assert_eq!(relative_set(&entries), expected(&[("b", 0), ("f.txt", 0)]));
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].is_listing());
}

#[tokio::test]
async fn missing_root_reports_one_listing_error() {
    let (entries, errors) = run(WalkBuilder::new("/nowhere"), MemoryFs::new()).await;
    assert!(entries.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_listing());
    assert_eq!(errors[0].path(), Path::new("/nowhere"));
}

#[tokio::test]
async fn output_is_independent_of_concurrency() {
    let fs = wide_tree(6, 25).dir("d0/nested").file("d0/nested/leaf", 1);
    let (serial, _) = run(
        WalkBuilder::new(ROOT).max_concurrency(1).backlog_threshold(1),
        fs.clone(),
    )
    .await;
    let (parallel, _) = run(
        WalkBuilder::new(ROOT)
            .max_concurrency(16)
            .listing_concurrency(4),
        fs,
    )
    .await;

    assert_eq!(serial.len(), 6 + 6 * 25 + 2);
    assert_eq!(relative_set(&serial), relative_set(&parallel));
}

#[tokio::test]
async fn probes_in_flight_never_exceed_max_concurrency() {
    let fs = wide_tree(4, 50).with_latency(Duration::from_millis(1));
    let (entries, _) = run(WalkBuilder::new(ROOT).max_concurrency(3), fs.clone()).await;
    assert_eq!(entries.len(), 4 + 4 * 50);
    assert!(fs.peak_probes() <= 3, "peak {}", fs.peak_probes());
    assert!(fs.peak_probes() >= 1);
}

#[tokio::test]
async fn listings_in_flight_never_exceed_listing_concurrency() {
    let mut fs = wide_tree(8, 3).with_latency(Duration::from_millis(2));
    for d in 0..8 {
        for n in 0..4 {
            fs = fs.dir(&format!("d{d}/sub{n}"));
        }
    }
    let (entries, _) = run(
        WalkBuilder::new(ROOT)
            .max_concurrency(16)
            .listing_concurrency(2),
        fs.clone(),
    )
    .await;
    assert_eq!(entries.len(), 8 + 8 * 3 + 8 * 4);
    assert!(fs.peak_listings() <= 2, "peak {}", fs.peak_listings());
    assert!(fs.peak_listings() >= 1);
}

#[tokio::test]
async fn abandoned_pulls_do_not_widen_read_ahead() {
    let fs = wide_tree(1, 400).with_latency(Duration::from_millis(5));
    let mut walk = WalkBuilder::new(ROOT)
        .max_concurrency(2)
        .build_on(fs)
        .expect("build walk");

    let mut received: u64 = 0;
    for _ in 0..300 {
        if let Ok(Some(_)) =
            tokio::time::timeout(Duration::from_micros(10), walk.next_entry()).await
        {
            received += 1;
        }
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let buffered = walk.progress().entries_emitted.saturating_sub(received);
    assert!(
        buffered <= 10,
        "{buffered} entries emitted but never consumed after {received} received"
    );

    let mut total = received;
    while walk.next_entry().await.is_some() {
        total += 1;
    }
    assert_eq!(total, 401);
}

#[tokio::test]
async fn max_depth_keeps_deeper_directories_unread() {
    let fs = sample_tree().dir("a/deep").file("a/deep/z.txt", 1);
    let mut walk = WalkBuilder::new(ROOT)
        .max_depth(0)
        .build_on(fs.clone())
        .expect("build walk");
    let mut entries = Vec::new();
    while let Some(entry) = walk.next_entry().await {
        entries.push(entry);
    }

    assert_eq!(
        relative_set(&entries),
        expected(&[("a", 0), ("b", 0), ("f.txt", 0)])
    );
    assert_eq!(walk.progress().directories_listed, 1);
    assert_eq!(fs.probes_started(), 3);
    assert_eq!(walk.progress().entries_pruned, 0);
}

#[tokio::test]
async fn walk_reports_its_root() {
    let walk = WalkBuilder::new(ROOT)
        .build_on(sample_tree())
        .expect("build walk");
    assert_eq!(walk.root(), Path::new(ROOT));
}

#[tokio::test]
async fn entries_hand_over_their_paths() {
    let (entries, _) = run(WalkBuilder::new(ROOT), sample_tree()).await;
    let mut paths: Vec<PathBuf> = entries.into_iter().map(Entry::into_path).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![absolute("a"), absolute("a/x.txt"), absolute("b"), absolute("f.txt")]
    );
}

#[tokio::test]
async fn stalled_consumer_bounds_discovery() {
    let fs = wide_tree(1, 200);
    let mut walk = WalkBuilder::new(ROOT)
        .max_concurrency(2)
        .build_on(fs.clone())
        .expect("build walk");

    let first = walk.next_entry().await.expect("first entry");
    assert_eq!(first.name(), "d0");

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stalled = walk.progress();
    assert!(!stalled.finished);
    assert!(
        stalled.entries_emitted <= 10,
        "emitted {} while nobody pulled",
        stalled.entries_emitted
    );
    assert!(fs.probes_started() < 20);

    let mut count = 1;
    while walk.next_entry().await.is_some() {
        count += 1;
    }
    assert_eq!(count, 201);
    assert!(walk.progress().finished);
}

#[tokio::test]
async fn nothing_is_listed_before_the_first_pull() {
    let fs = wide_tree(2, 2);
    let walk = WalkBuilder::new(ROOT).build_on(fs.clone()).expect("build walk");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(walk.progress().directories_listed, 0);
    assert_eq!(fs.probes_started(), 0);
}

#[tokio::test]
async fn cancel_ends_the_sequence() {
    let fs = wide_tree(20, 50).with_latency(Duration::from_millis(1));
    let mut walk = WalkBuilder::new(ROOT)
        .max_concurrency(4)
        .build_on(fs.clone())
        .expect("build walk");

    for _ in 0..5 {
        walk.next_entry().await.expect("entry before cancel");
    }
    walk.cancel();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        let mut drained = 0;
        while walk.next_entry().await.is_some() {
            drained += 1;
        }
        drained
    })
    .await
    .expect("sequence ends after cancel");
    assert!(drained < 20 * 50);
    assert!(walk.progress().finished);
    assert!(walk.next_entry().await.is_none(), "stays exhausted");
}

#[tokio::test]
async fn dropping_the_handle_stops_probing() {
    let fs = wide_tree(10, 100).with_latency(Duration::from_millis(1));
    let mut walk = WalkBuilder::new(ROOT)
        .max_concurrency(4)
        .build_on(fs.clone())
        .expect("build walk");
    walk.next_entry().await.expect("entry");
    drop(walk);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let settled = fs.probes_started();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fs.probes_started(), settled);
    assert!(settled < 10 * 100);
}

#[tokio::test]
async fn error_channel_is_handed_out_once() {
    let mut walk = WalkBuilder::new(ROOT)
        .build_on(sample_tree())
        .expect("build walk");
    assert!(walk.errors().is_some());
    assert!(walk.errors().is_none());
}

#[tokio::test]
async fn errors_remain_readable_after_the_walk_ends() {
    let fs = sample_tree().unreadable("a").unprobeable("f.txt");
    let mut walk = WalkBuilder::new(ROOT).build_on(fs).expect("build walk");
    let mut errors = walk.errors().expect("error channel");
    while walk.next_entry().await.is_some() {}

    let drained = errors.drain();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained.iter().filter(|error| error.is_listing()).count(), 1);
    assert_eq!(walk.progress().errors(), 2);
    assert!(errors.recv().await.is_none());
}

#[tokio::test]
async fn invalid_options_fail_before_any_io() {
    let fs = sample_tree();
    let error = WalkBuilder::new(ROOT)
        .max_concurrency(0)
        .build_on(fs.clone())
        .expect_err("zero concurrency");
    assert!(matches!(error, ConfigError::ZeroConcurrency));
    assert_eq!(fs.probes_started(), 0);
}

#[test]
fn building_outside_a_runtime_fails() {
    let error = WalkBuilder::new(ROOT)
        .build_on(sample_tree())
        .expect_err("no runtime");
    assert!(matches!(error, ConfigError::NoRuntime));
}

/// Builds a random tree from `(parent, is_dir)` picks; returns the
/// filesystem and every node with its expected depth.
fn random_tree(shape: &[(prop::sample::Index, bool)]) -> (MemoryFs, BTreeSet<(PathBuf, usize)>) {
    let mut fs = MemoryFs::new();
    let mut directories = vec![PathBuf::new()];
    let mut nodes = BTreeSet::new();
    for (i, (parent, is_dir)) in shape.iter().enumerate() {
        let parent = directories[parent.index(directories.len())].clone();
        let relative = parent.join(format!("n{i}"));
        let depth = relative.components().count() - 1;
        let rendered = relative.to_string_lossy().into_owned();
        fs = if *is_dir {
            directories.push(relative.clone());
            fs.dir(&rendered)
        } else {
            fs.file(&rendered, i as u64)
        };
        nodes.insert((relative, depth));
    }
    (fs, nodes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_reachable_node_is_emitted_once_at_its_depth(
        shape in proptest::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..60),
        max_concurrency in 1usize..6,
        listing_concurrency in 1usize..3,
        backlog_threshold in 1usize..8,
    ) {
        let (fs, nodes) = random_tree(&shape);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let (entries, errors) = runtime.block_on(run(
            WalkBuilder::new(ROOT)
                .max_concurrency(max_concurrency)
                .listing_concurrency(listing_concurrency)
                .backlog_threshold(backlog_threshold),
            fs,
        ));

        prop_assert!(errors.is_empty());
        prop_assert_eq!(entries.len(), nodes.len());
        prop_assert_eq!(relative_set(&entries), nodes);
    }
}
