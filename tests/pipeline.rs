//! End-to-end pipeline tests against an in-memory object store

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;

use s3lines::app::{MemoryStore, NameSource, Pipeline, PipelineConfig, PipelineReport};
use s3lines::constants::pipeline::pool_capacity;

/// Output shared with the test after the pipeline takes ownership of it
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

async fn run(
    store: MemoryStore,
    config: PipelineConfig,
    source: NameSource,
) -> (PipelineReport, String, String) {
    let pipeline = Pipeline::new(config, Arc::new(store)).unwrap();
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let report = pipeline.run(source, out.clone(), err.clone()).await;
    (report, out.text(), err.text())
}

fn sorted_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    lines
}

#[tokio::test]
async fn test_single_plain_object() {
    let store = MemoryStore::new().with_object("b", "a.txt", "x\ny\n");
    let (report, out, err) = run(
        store,
        PipelineConfig::default().with_concurrency(1),
        NameSource::fixed(["s3://b/a.txt"]),
    )
    .await;

    assert_eq!(out, "x\ny\n");
    assert!(err.is_empty());
    assert!(report.is_success());
    assert_eq!(report.concurrency, 1);
}

#[tokio::test]
async fn test_gzip_object_is_decoded() {
    let store = MemoryStore::new().with_object("b", "a.gz", gzip(b"p\nq\n"));
    let (report, out, _) = run(
        store,
        PipelineConfig::default().with_concurrency(1),
        NameSource::fixed(["s3://b/a.gz"]),
    )
    .await;

    assert_eq!(out, "p\nq\n");
    assert!(report.is_success());
    assert_eq!(report.scan.gzipped, 1);
}

#[tokio::test]
async fn test_missing_final_newline_is_added() {
    let store = MemoryStore::new().with_object("b", "a.txt", "x\ny");
    let (report, out, _) = run(
        store,
        PipelineConfig::default().with_concurrency(1),
        NameSource::fixed(["s3://b/a.txt"]),
    )
    .await;

    assert_eq!(out, "x\ny\n");
    assert!(report.is_success());
}

#[tokio::test]
async fn test_two_objects_keep_per_object_order() {
    let store = MemoryStore::new()
        .with_object("b", "one.txt", "1\n2\n")
        .with_object("b", "two.txt", "3\n");
    let (report, out, _) = run(
        store,
        PipelineConfig::default().with_concurrency(2),
        NameSource::fixed(["s3://b/one.txt", "s3://b/two.txt"]),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(sorted_lines(&out), vec!["1", "2", "3"]);
    let one = out.find("1\n").unwrap();
    let two = out.find("2\n").unwrap();
    assert!(one < two);
}

#[tokio::test]
async fn test_identical_objects_each_keep_their_chunk_whole() {
    let store = MemoryStore::new()
        .with_object("b", "x.txt", "L1\nL2\n")
        .with_object("b", "y.txt", "L1\nL2\n")
        .with_object("b", "z.txt", "L1\nL2\n");
    let (report, out, err) = run(
        store,
        PipelineConfig::default().with_concurrency(3),
        NameSource::fixed(["s3://b/x.txt", "s3://b/y.txt", "s3://b/z.txt"]),
    )
    .await;

    assert!(err.is_empty());
    assert!(report.is_success());
    assert_eq!(report.concurrency, 3);
    assert_eq!(out, "L1\nL2\n".repeat(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_known_name_list_raises_worker_count() {
    let mut store = MemoryStore::new();
    let mut names = Vec::new();
    for i in 0..10 {
        let key = format!("n{}.txt", i);
        store = store.with_object("b", &key, format!("{}\n", i));
        names.push(format!("s3://b/{}", key));
    }

    let (report, out, _) = run(
        store,
        PipelineConfig::default().with_concurrency(1),
        NameSource::fixed(names),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(report.concurrency, 10);
    assert_eq!(out.lines().count(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_never_holds_more_than_two_n_plus_two() {
    for concurrency in [1, 3, 16] {
        let mut store = MemoryStore::new();
        for i in 0..60 {
            let body: String = (0..20).map(|n| format!("{}-{}\n", i, n)).collect();
            store = store.with_object("b", &format!("k{}.log", i), body);
        }
        let names: String = (0..60).map(|i| format!("k{}.log\n", i)).collect();

        let (report, _, _) = run(
            store,
            PipelineConfig::default()
                .with_concurrency(concurrency)
                .with_chunk_lines(3)
                .with_default_prefix("s3://b/"),
            NameSource::lines(Cursor::new(names)),
        )
        .await;

        assert!(report.is_success());
        assert_eq!(report.concurrency, concurrency);
        assert_eq!(report.pool.capacity, pool_capacity(concurrency));
        assert!(report.pool.peak_idle > 0);
        assert!(
            report.pool.peak_idle <= pool_capacity(concurrency),
            "pool held {} buffers with N = {}",
            report.pool.peak_idle,
            concurrency
        );
        assert_eq!(report.pool.outstanding(), 0);
    }
}

#[tokio::test]
async fn test_non_utf8_name_line_skips_only_that_name() {
    let store = MemoryStore::new()
        .with_object("b", "a.txt", "a\n")
        .with_object("b", "b.txt", "b\n");
    let (report, out, err) = run(
        store,
        PipelineConfig::default().with_default_prefix("s3://b/"),
        NameSource::lines(Cursor::new(b"a.txt\n\xff\nb.txt\n".to_vec())),
    )
    .await;

    assert_eq!(sorted_lines(&out), vec!["a", "b"]);
    assert_eq!(report.errors, 1);
    assert_eq!(report.names, 2);
    assert!(err.contains("not valid UTF-8"));
}

#[tokio::test]
async fn test_unparseable_name_is_one_error() {
    let (report, out, err) = run(
        MemoryStore::new(),
        PipelineConfig::default().with_concurrency(1),
        NameSource::fixed(["s3:///x"]),
    )
    .await;

    assert!(out.is_empty());
    assert_eq!(err.lines().count(), 1);
    assert!(err.contains("s3:///x"));
    assert_eq!(report.errors, 1);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_empty_input() {
    let (report, out, err) = run(
        MemoryStore::new(),
        PipelineConfig::default(),
        NameSource::lines(Cursor::new("")),
    )
    .await;

    assert!(out.is_empty());
    assert!(err.is_empty());
    assert!(report.is_success());
    assert_eq!(report.names, 0);
}

#[tokio::test]
async fn test_errors_do_not_stop_other_objects() {
    let store = MemoryStore::new()
        .with_object("b", "good.txt", "ok\n")
        .with_object("b", "bad.gz", vec![0x1f, 0x8b, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    let (report, out, err) = run(
        store,
        PipelineConfig::default().with_default_prefix("s3://b/"),
        NameSource::lines(Cursor::new("good.txt\nmissing.txt\nbad.gz\ns3://\n")),
    )
    .await;

    assert_eq!(out, "ok\n");
    assert_eq!(report.errors, 3);
    assert_eq!(err.lines().count(), 3);
    assert!(err.contains("s3://b/missing.txt"));
    assert!(err.contains("bad.gz"));
}

#[tokio::test]
async fn test_large_object_spans_many_chunks_in_order() {
    let body: String = (0..2500).map(|i| format!("line-{}\n", i)).collect();
    let store = MemoryStore::new().with_object("b", "big.log.gz", gzip(body.as_bytes()));
    let (report, out, _) = run(
        store,
        PipelineConfig::default(),
        NameSource::fixed(["s3://b/big.log.gz"]),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(out, body);
    assert_eq!(report.scan.lines, 2500);
    assert_eq!(report.scan.chunks, 3);
}

#[tokio::test]
async fn test_chunks_of_different_objects_never_split_lines() {
    let names: Vec<String> = (0..8).map(|i| format!("s3://b/obj-{}.txt", i)).collect();
    let mut store = MemoryStore::new();
    for i in 0..8 {
        let body: String = (0..50).map(|n| format!("obj{}-{:03}\n", i, n)).collect();
        store = store.with_object("b", &format!("obj-{}.txt", i), body);
    }

    let (report, out, _) = run(
        store,
        PipelineConfig::default().with_concurrency(8).with_chunk_lines(7),
        NameSource::fixed(names),
    )
    .await;

    assert!(report.is_success());
    assert_eq!(out.lines().count(), 400);
    for i in 0..8 {
        let prefix = format!("obj{}-", i);
        let lines: Vec<&str> = out.lines().filter(|l| l.starts_with(&prefix)).collect();
        assert_eq!(lines.len(), 50);
        let mut in_order = lines.clone();
        in_order.sort_unstable();
        assert_eq!(lines, in_order, "lines of object {} out of order", i);
    }
}

#[tokio::test]
async fn test_every_buffer_is_returned_or_discarded() {
    let mut store = MemoryStore::new();
    let mut names = Vec::new();
    for i in 0..40 {
        let body: String = (0..30).map(|n| format!("{}-{}\n", i, n)).collect();
        let key = format!("k{}.txt", i);
        store = store.with_object("b", &key, body);
        names.push(key);
    }
    names.push("absent.txt".to_string());

    let (report, _, _) = run(
        store,
        PipelineConfig::default()
            .with_concurrency(3)
            .with_chunk_lines(4)
            .with_default_prefix("s3://b/"),
        NameSource::fixed(names),
    )
    .await;

    assert_eq!(report.errors, 1);
    assert_eq!(report.scan.lines, 40 * 30);
    assert_eq!(report.pool.outstanding(), 0);
}
