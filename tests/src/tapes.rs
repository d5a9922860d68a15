use crate::fakes::Fixture;

use pclp_lib::{StorageError, TapeCatalog};


fn names(count: usize) -> Vec<(String, Vec<u8>)> {
    (0..count).map(|i| (format!("T{i:02}.TAP"), vec![i as u8])).collect()
}

fn fixture(count: usize) -> Fixture {
    let files = names(count);
    let files: Vec<(&str, &[u8])> = files.iter().map(|(n, d)| (n.as_str(), d.as_slice())).collect();
    Fixture::new(&files)
}

fn visible(catalog: &TapeCatalog) -> Vec<(usize, String)> {
    catalog.visible().map(|(slot, name)| (slot, name.to_string())).collect()
}

#[test]
fn first_page() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    catalog.enumerate(&mut storage).unwrap();

    assert_eq!(catalog.found(), 7);
    assert_eq!(catalog.selection(), Some(0));
    assert_eq!(catalog.selected(), Some("T00.TAP"));
    let shown = visible(&catalog);
    assert_eq!(shown.len(), 7);
    assert_eq!(shown[6], (6, "T06.TAP".to_string()));
}

#[test]
fn next_wraps_to_next_page() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    catalog.enumerate(&mut storage).unwrap();

    for _ in 0..6 {
        catalog.next();
        catalog.enumerate(&mut storage).unwrap();
        assert_eq!(catalog.page(), 0);
    }
    assert_eq!(catalog.selected(), Some("T06.TAP"));

    catalog.next();
    assert_eq!(catalog.page(), 1);
    assert_eq!(catalog.selection(), Some(0));
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.found(), 10);
    assert_eq!(catalog.selected(), Some("T07.TAP"));
    assert_eq!(visible(&catalog), [
        (0, "T07.TAP".to_string()),
        (1, "T08.TAP".to_string()),
        (2, "T09.TAP".to_string()),
    ]);
}

#[test]
fn previous_from_top_clamps_to_page_zero() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    catalog.enumerate(&mut storage).unwrap();

    catalog.previous();
    assert_eq!(catalog.page(), 0);
    assert_eq!(catalog.selection(), Some(6));
    assert_eq!(catalog.found(), 0);

    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.selection(), Some(6));
    assert_eq!(catalog.selected(), Some("T06.TAP"));
}

#[test]
fn previous_returns_to_last_page() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    for _ in 0..7 {
        catalog.next();
    }
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.selected(), Some("T07.TAP"));

    catalog.previous();
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.page(), 0);
    assert_eq!(catalog.selected(), Some("T06.TAP"));
}

#[test]
fn selection_clamped_to_found() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    for _ in 0..7 {
        catalog.next();
    }
    catalog.enumerate(&mut storage).unwrap();

    for _ in 0..4 {
        catalog.next();
        catalog.enumerate(&mut storage).unwrap();
    }
    assert_eq!(catalog.page(), 1);
    assert_eq!(catalog.selection(), Some(2));
    assert_eq!(catalog.selected(), Some("T09.TAP"));
}

#[test]
fn empty_page_has_no_selection() {
    let fx = fixture(14);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    for _ in 0..14 {
        catalog.next();
    }
    assert_eq!(catalog.page(), 2);
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.found(), 14);
    assert_eq!(catalog.selection(), None);
    assert_eq!(catalog.selected(), None);
    assert!(visible(&catalog).is_empty());

    catalog.previous();
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.page(), 1);
    assert_eq!(catalog.selected(), Some("T13.TAP"));
}

#[test]
fn rescan_starts_over() {
    let fx = fixture(10);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    for _ in 0..9 {
        catalog.next();
    }
    catalog.enumerate(&mut storage).unwrap();

    catalog.rescan();
    assert_eq!((catalog.page(), catalog.found(), catalog.selection()), (0, 0, Some(0)));
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.selected(), Some("T00.TAP"));
}

#[test]
fn only_matching_files_listed() {
    let fx = Fixture::new(&[("B.TAP", b""), ("A.tap", b""), ("PRT.TXT", b""), ("NOTES", b"")]);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(visible(&catalog), [(0, "A.tap".to_string()), (1, "B.TAP".to_string())]);
}

#[test]
fn no_tapes_is_an_error() {
    let fx = Fixture::new(&[("PRT.TXT", b"")]);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    let res = catalog.enumerate(&mut storage);
    assert!(matches!(res, Err(StorageError::NoMatches(_))));
    assert_eq!(catalog.selection(), None);
    assert_eq!(catalog.selected(), None);

    // Moving on from nothing starts at the top again.
    catalog.next();
    assert_eq!(catalog.selection(), Some(0));
}

#[test]
fn tapes_appear_after_empty_scan() {
    let fx = Fixture::new(&[]);
    let mut storage = fx.storage();
    let mut catalog = TapeCatalog::new(7, "*.TAP");
    assert!(catalog.enumerate(&mut storage).is_err());
    assert_eq!(catalog.selection(), None);

    std::fs::write(fx.path("NEW.TAP"), b"n").unwrap();
    catalog.rescan();
    catalog.enumerate(&mut storage).unwrap();
    assert_eq!(catalog.selected(), Some("NEW.TAP"));
}
