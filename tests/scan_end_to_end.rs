use pbmgrep::{
    scan, Bitmap, Feature, FeatureSet, PbmGrepError, PbmReader, ScanConfig, ScanOutcome, Scanner,
    MAX_WIDTH,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_bitmap(rng: &mut StdRng, width: usize, height: usize) -> Bitmap {
    let bits = (0..width * height)
        .map(|_| u8::from(rng.random_bool(0.5)))
        .collect();
    Bitmap::new(bits, width, height).unwrap()
}

fn solid(width: usize, height: usize) -> Bitmap {
    Bitmap::new(vec![1; width * height], width, height).unwrap()
}

fn run(features: &FeatureSet, image: &Bitmap) -> ScanOutcome {
    scan(features, &mut image.rows(), &ScanConfig::default()).unwrap()
}

fn found(outcome: ScanOutcome) -> (usize, usize, usize, usize, usize) {
    match outcome {
        ScanOutcome::Found(m) => (m.x, m.y, m.width, m.height, m.feature.index()),
        ScanOutcome::Exhausted { rows } => panic!("no match after {rows} rows"),
    }
}

#[test]
fn finds_solid_bar_in_blank_image() {
    let features =
        FeatureSet::new(vec![Feature::from_bitmap("bar", &solid(32, 2)).unwrap()]).unwrap();
    let mut image = Bitmap::blank(128, 20).unwrap();
    image.paste(&solid(32, 2), 64, 10).unwrap();

    let outcome = run(&features, &image);
    assert_eq!(found(outcome), (64, 10, 32, 2, 0));
    if let ScanOutcome::Found(m) = outcome {
        assert_eq!(m.to_tsv(&features), "64\t10\t32\t2\tbar");
    }
}

#[test]
fn finds_random_patterns_at_unaligned_positions() {
    let mut rng = StdRng::seed_from_u64(7);
    for &(x, y) in &[(0usize, 0usize), (5, 3), (37, 41), (95, 12), (130, 60)] {
        let tpl = random_bitmap(&mut rng, 64, 9);
        let features = FeatureSet::new(vec![Feature::from_bitmap("tpl", &tpl).unwrap()]).unwrap();
        let mut image = random_bitmap(&mut rng, 256, 80);
        image.paste(&tpl, x, y).unwrap();

        assert_eq!(found(run(&features, &image)), (x, y, 64, 9, 0));
    }
}

#[test]
fn clean_image_is_exhausted() {
    let mut rng = StdRng::seed_from_u64(11);
    let tpl = random_bitmap(&mut rng, 32, 12);
    let features = FeatureSet::new(vec![Feature::from_bitmap("tpl", &tpl).unwrap()]).unwrap();
    let image = Bitmap::blank(200, 50).unwrap();

    assert_eq!(run(&features, &image), ScanOutcome::Exhausted { rows: 50 });
}

#[test]
fn shared_signature_without_full_match_is_not_reported() {
    // Both features end in the same solid bottom row, so they share a
    // signature; only the second one is present in the image.
    let mut decoy = solid(32, 3);
    decoy.set(10, 0, false).unwrap();
    let mut real = solid(32, 3);
    real.set(20, 1, false).unwrap();
    let features = FeatureSet::new(vec![
        Feature::from_bitmap("decoy", &decoy).unwrap(),
        Feature::from_bitmap("real", &real).unwrap(),
    ])
    .unwrap();
    assert!(features.iter().all(|f| f.signature() == u32::MAX));
    assert_eq!(
        features.index().lookup(u32::MAX).len(),
        2,
        "both features share one key"
    );

    let mut image = Bitmap::blank(96, 16).unwrap();
    image.paste(&real, 33, 6).unwrap();
    let outcome = run(&features, &image);
    assert_eq!(found(outcome), (33, 6, 32, 3, 1));
}

#[test]
fn earliest_row_wins_then_leftmost_then_insertion_order() {
    let a = solid(32, 2);
    let b = solid(32, 2);
    let features = FeatureSet::new(vec![
        Feature::from_bitmap("a", &a).unwrap(),
        Feature::from_bitmap("b", &b).unwrap(),
    ])
    .unwrap();

    let mut image = Bitmap::blank(160, 20).unwrap();
    image.paste(&solid(32, 2), 90, 4).unwrap();
    image.paste(&solid(32, 2), 3, 9).unwrap();
    // Ends on row 5, before the block at x = 3 which ends on row 10.
    assert_eq!(found(run(&features, &image)), (90, 4, 32, 2, 0));
}

#[test]
fn features_larger_than_the_image_never_match() {
    let tall = Feature::from_bitmap("tall", &solid(32, 30)).unwrap();
    let wide = Feature::from_bitmap("wide", &solid(128, 2)).unwrap();
    let features = FeatureSet::new(vec![tall, wide]).unwrap();
    let image = solid(128, 20);

    assert_eq!(run(&features, &image), ScanOutcome::Exhausted { rows: 20 });
}

#[test]
fn widest_attempted_feature_touches_second_to_last_column() {
    let mut rng = StdRng::seed_from_u64(3);
    // 4 packed columns in the image; a 3-column feature is the widest tried.
    let tpl = random_bitmap(&mut rng, 96, 5);
    let features = FeatureSet::new(vec![Feature::from_bitmap("wide", &tpl).unwrap()]).unwrap();
    let mut image = Bitmap::blank(128, 10).unwrap();
    image.paste(&tpl, 0, 2).unwrap();
    assert_eq!(found(run(&features, &image)), (0, 2, 96, 5, 0));

    // Same feature shifted so it would end in the last packed column.
    let mut shifted = Bitmap::blank(128, 10).unwrap();
    shifted.paste(&tpl, 32, 2).unwrap();
    assert_eq!(run(&features, &shifted), ScanOutcome::Exhausted { rows: 10 });
}

#[test]
fn feature_as_wide_as_image_is_never_attempted() {
    let tpl = solid(64, 2);
    let features = FeatureSet::new(vec![Feature::from_bitmap("full", &tpl).unwrap()]).unwrap();
    let image = solid(64, 6);
    assert_eq!(run(&features, &image), ScanOutcome::Exhausted { rows: 6 });
}

#[test]
fn repeated_scans_are_identical() {
    let mut rng = StdRng::seed_from_u64(99);
    let tpls: Vec<Bitmap> = (0..4)
        .map(|i| random_bitmap(&mut rng, 32 * (1 + i % 2), 3 + i))
        .collect();
    let features = FeatureSet::new(
        tpls.iter()
            .enumerate()
            .map(|(i, t)| Feature::from_bitmap(format!("f{i}"), t).unwrap())
            .collect(),
    )
    .unwrap();
    let mut image = random_bitmap(&mut rng, 192, 64);
    image.paste(&tpls[2], 70, 30).unwrap();
    image.paste(&tpls[1], 11, 50).unwrap();

    let first = run(&features, &image);
    let second = run(&features, &image);
    assert_eq!(first, second);
    assert_eq!(found(first), (70, 30, 32, 5, 2));
}

#[test]
fn scan_reads_pbm_stream() {
    let mut image = Bitmap::blank(96, 8).unwrap();
    image.paste(&solid(32, 3), 40, 2).unwrap();
    let mut text = String::from("P1\n96 8\n");
    for y in 0..image.height() {
        for &b in image.row(y).unwrap() {
            text.push(if b == 1 { '1' } else { '0' });
        }
        text.push('\n');
    }

    let features =
        FeatureSet::new(vec![Feature::from_bitmap("block", &solid(32, 3)).unwrap()]).unwrap();
    let mut reader = PbmReader::new(text.as_bytes()).unwrap();
    let outcome = scan(&features, &mut reader, &ScanConfig::default()).unwrap();
    assert_eq!(found(outcome), (40, 2, 32, 3, 0));
    // The rows after the match are never read.
    assert_eq!(reader.rows_read(), 5);
}

#[test]
fn too_wide_image_is_rejected_before_reading() {
    let features =
        FeatureSet::new(vec![Feature::from_bitmap("bar", &solid(32, 1)).unwrap()]).unwrap();
    let image = Bitmap::blank(256, 4).unwrap();
    let cfg = ScanConfig { max_width: 255 };
    assert_eq!(
        scan(&features, &mut image.rows(), &cfg).err().unwrap(),
        PbmGrepError::StreamTooWide {
            width: 256,
            max: 255,
        }
    );
}

#[test]
fn oversized_stream_header_is_too_wide() {
    let features =
        FeatureSet::new(vec![Feature::from_bitmap("bar", &solid(32, 1)).unwrap()]).unwrap();
    let mut reader = PbmReader::new(&b"P4\n1000000000000000000 1\n\x00"[..]).unwrap();
    assert_eq!(
        scan(&features, &mut reader, &ScanConfig::default()).err().unwrap(),
        PbmGrepError::StreamTooWide {
            width: 1_000_000_000_000_000_000,
            max: MAX_WIDTH,
        }
    );
    assert_eq!(reader.rows_read(), 0);
}

#[test]
fn scanner_stops_after_first_match() {
    let features =
        FeatureSet::new(vec![Feature::from_bitmap("bar", &solid(32, 1)).unwrap()]).unwrap();
    let mut scanner = Scanner::new(&features, 96, &ScanConfig::default()).unwrap();
    assert_eq!(scanner.ring().cols32(), 3);
    assert_eq!(scanner.ring().cycle_rows(), 1);

    assert_eq!(scanner.push_row(&[0; 96]).unwrap(), None);
    let mut row = vec![0u8; 96];
    row[7..39].fill(1);
    let m = scanner.push_row(&row).unwrap().unwrap();
    assert_eq!((m.x, m.y), (7, 1));
    assert!(scanner.is_finished());
    assert_eq!(scanner.rows_seen(), 2);
    assert_eq!(scanner.push_row(&row), Err(PbmGrepError::ScanFinished));
}

#[test]
fn malformed_row_is_fatal() {
    let features =
        FeatureSet::new(vec![Feature::from_bitmap("bar", &solid(32, 1)).unwrap()]).unwrap();
    let mut reader = PbmReader::new(&b"P1 64 2\n0000"[..]).unwrap();
    let err = scan(&features, &mut reader, &ScanConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, PbmGrepError::StreamRead { row: 0, .. }));
}
