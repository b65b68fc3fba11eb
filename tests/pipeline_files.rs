//! File-backed runs: JSONL inputs in, JSONL/CSV outputs out.

use std::fs;
use std::path::Path;

use cascade_core::{
    corpus::{CascadeReader, ContributionReader, TimeWindow},
    persistence, NetworkError, NetworkPipeline, PipelineConfig,
};

fn write(path: &Path, lines: &[&str]) {
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

fn sample_inputs(dir: &Path) -> (CascadeReader, ContributionReader) {
    let cascades = dir.join("cascades.jsonl");
    let contributions = dir.join("contributions.jsonl");
    write(
        &cascades,
        &[
            r#"{"t3_1": [["alice", 100], ["bob", 105]]}"#,
            r#"{"t3_2": [["bob", 200], ["carol", 230], ["alice", 260]]}"#,
            r#"{"t3_3": [["alice", 300], ["dave", 310]]}"#,
            r#"{"t3_4": [["erin", 400]], "t3_5": [["frank", 500], ["erin", 510]]}"#,
        ],
    );
    write(
        &contributions,
        &[
            r#"{"author": "alice", "data": {"2020": {"rust": 4, "python": 1}}}"#,
            r#"{"author": "bob", "data": {"2020": {"rust": 2}, "2021": {"python": 3}}}"#,
            r#"{"author": "carol", "data": {"2021": {"python": 1, "AskReddit": 9}}}"#,
            r#"{"author": "dave", "data": {"2019": {"knitting": 2}}}"#,
            r#"{"author": "erin", "data": {"2020": {"cats": 1, "AskReddit": 2}}}"#,
            r#"{"author": "frank", "data": {"2020": {"cats": 5}}}"#,
        ],
    );
    (CascadeReader::new(cascades), ContributionReader::new(contributions))
}

#[test]
fn build_writes_consistent_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (cascades, contributions) = sample_inputs(dir.path());

    let mut config = PipelineConfig::default();
    config.graph.excluded_subreddits.insert("askreddit".into());
    let out = NetworkPipeline::new(config)
        .unwrap()
        .run_files(&cascades, &contributions)
        .unwrap();

    assert_eq!(out.retained.sorted(), vec!["alice", "bob", "carol"]);
    assert_eq!(out.giant.weight_between("alice", "bob"), Some(2));
    assert_eq!(out.giant.weight_between("bob", "carol"), Some(1));
    assert_eq!(out.stats.cascade_load.map(|r| r.records), Some(5));
    assert_eq!(out.stats.cascades_out, 2);

    let cascades_out = dir.path().join("filtered.jsonl");
    let edges_out = dir.path().join("edges.csv");
    let scores_out = dir.path().join("scores.csv");
    persistence::write_cascades(&cascades_out, &out.cascades).unwrap();
    persistence::write_edge_list(&edges_out, &out.giant).unwrap();
    persistence::write_scores(&scores_out, &out.backbone.records(&out.giant)).unwrap();

    assert_eq!(
        fs::read_to_string(&cascades_out).unwrap(),
        concat!(
            "{\"t3_1\":[[\"alice\",100],[\"bob\",105]]}\n",
            "{\"t3_2\":[[\"bob\",200],[\"carol\",230],[\"alice\",260]]}\n",
        )
    );
    assert_eq!(
        fs::read_to_string(&edges_out).unwrap(),
        "source,target,weight\nalice,bob,2\nalice,carol,1\nbob,carol,1\n"
    );

    let scores = fs::read_to_string(&scores_out).unwrap();
    assert!(scores.starts_with("source,target,weight,expected,z,p_value,retained\n"));
    assert_eq!(scores.lines().count(), 4);

    let (reloaded, report) = persistence::read_edge_list(&edges_out).unwrap();
    assert_eq!(reloaded.edge_records(), out.giant.edge_records());
    assert_eq!(report.skipped, 0);
}

#[test]
fn time_window_trims_cascades_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let (cascades, _) = sample_inputs(dir.path());

    let (set, report) = cascades
        .with_window(TimeWindow::new(Some(200), Some(300)))
        .load()
        .unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.get("t3_3").map(|c| c.len()), Some(1));
    assert_eq!(report.dropped, 3);
}

#[test]
fn corrupt_input_halts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (_, contributions) = sample_inputs(dir.path());
    let cascades = dir.path().join("broken.jsonl");
    write(
        &cascades,
        &[
            r#"{"t3_1": [["alice", 100]]}"#,
            "not json",
            r#"{"t3_2": [["bob", "yesterday"]]}"#,
        ],
    );

    let err = NetworkPipeline::new(PipelineConfig::default())
        .unwrap()
        .run_files(&CascadeReader::new(cascades), &contributions)
        .unwrap_err();
    match err {
        NetworkError::CorruptInput { skipped, total, .. } => {
            assert_eq!(skipped, 2);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tolerance_allows_sparse_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let (cascades, contributions) = sample_inputs(dir.path());
    let mut lines: Vec<String> = fs::read_to_string(cascades.path())
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    lines.push("{broken".into());
    fs::write(cascades.path(), lines.join("\n")).unwrap();

    let mut config = PipelineConfig::default();
    config.max_skip_rate = 0.5;
    let out = NetworkPipeline::new(config)
        .unwrap()
        .run_files(&cascades, &contributions)
        .unwrap();
    assert_eq!(out.stats.cascade_load.map(|r| r.skipped), Some(1));
}
