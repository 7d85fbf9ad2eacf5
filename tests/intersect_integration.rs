use vbprox::intersect::{BatchOptions, PairError, PairSpec, Window, parse_pairs, run_batch};
use vbprox::io::{self, CompressMode, DirectorySource, IoError};
use vbprox::vbyte::DecodeError;

fn store(dir: &std::path::Path, id: u64, values: &[u64], mode: CompressMode) {
    let raw = dir.join(format!("raw{id}.bin"));
    io::write_raw(&raw, values).unwrap();
    let out = dir.join(format!("F{id}{}", mode.suffix()));
    io::compress_file(&raw, &out, mode).unwrap();
}

#[test]
fn batch_over_plain_and_sorted_files_agree() {
    let dir = tempfile::tempdir().unwrap();
    let lists: [(u64, Vec<u64>); 3] = [
        (1, vec![500, 20, 300, 1000]),
        (2, vec![18, 25, 298, 305, 999, 2000, 21]),
        (3, vec![]),
    ];
    for (id, values) in &lists {
        store(dir.path(), *id, values, CompressMode::Plain);
        store(dir.path(), *id, values, CompressMode::Sorted);
    }

    let pairs = parse_pairs("1 2\n2 1\n1 3\n3 1\n").unwrap();
    let opts = BatchOptions {
        window: Window::new(2, 5),
        collect_matches: true,
        keep_going: false,
    };

    let plain = DirectorySource::new(dir.path());
    let sorted = DirectorySource {
        suffix: CompressMode::Sorted.suffix().to_string(),
        delta: true,
        ..DirectorySource::new(dir.path())
    };

    let plain_report = run_batch(&plain, &pairs, &opts);
    let sorted_report = run_batch(&sorted, &pairs, &opts);
    assert!(plain_report.is_success());
    assert!(sorted_report.is_success());

    let matches = |r: &vbprox::intersect::BatchReport| -> Vec<Vec<u64>> {
        r.outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().matches.clone().unwrap())
            .collect()
    };
    let expected: Vec<Vec<u64>> = vec![
        vec![18, 21, 25, 298, 305, 999],
        vec![20, 300, 1000],
        vec![],
        vec![],
    ];
    assert_eq!(matches(&plain_report), expected);
    assert_eq!(matches(&sorted_report), expected);
    assert_eq!(plain_report.total_matches(), 9);
}

#[test]
fn corrupt_list_surfaces_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    store(dir.path(), 1, &[1, 2, 3], CompressMode::Plain);
    std::fs::write(dir.path().join("F2.vb"), [0x81, 0x02]).unwrap();

    let report = run_batch(
        &DirectorySource::new(dir.path()),
        &[PairSpec { a: 1, b: 2 }],
        &BatchOptions::default(),
    );
    assert_eq!(report.failures(), 1);
    let Err(PairError::Load { id, source }) = &report.outcomes[0].result else {
        panic!("expected load failure, got {:?}", report.outcomes[0].result);
    };
    assert_eq!(*id, 2);
    let io_err = source.downcast_ref::<IoError>().unwrap();
    assert!(matches!(
        io_err,
        IoError::Decode {
            source: DecodeError::Truncated { offset: 1, .. },
            ..
        }
    ));
}
