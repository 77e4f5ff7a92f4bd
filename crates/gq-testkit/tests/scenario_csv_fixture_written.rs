use gq_testkit::{random_walk, write_bars_csv};

#[test]
fn csv_fixture_has_header_and_one_row_per_bar() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bars.csv");
    let bars = random_walk(42, 25, 100.0, 0.01);

    write_bars_csv(&path, &bars).expect("write csv");

    let text = std::fs::read_to_string(&path).expect("read back");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ts,open,high,low,close,volume"));
    assert_eq!(lines.count(), bars.len());
}
