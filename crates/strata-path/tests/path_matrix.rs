//! Round-trip and relationship matrix over representative paths.

use strata_path::{common_prefix, format, is_child, parse, template, PathError, Step};

#[test]
fn roundtrip_matrix() {
    let cases = [
        "",
        "time",
        "comment",
        "profile.density",
        "system[0]",
        "system[12].cost",
        "system[:].cost",
        "slice[:].trace",
        "grid[0][1]",
    ];
    for case in cases {
        let parsed = parse(case).unwrap();
        assert_eq!(format(&parsed), case, "roundtrip failed for {case:?}");
    }
}

#[test]
fn template_instance_matrix() {
    let cases = [
        ("system[4].cost", "system[:].cost"),
        ("slice[0].trace", "slice[:].trace"),
        ("profile.density", "profile.density"),
        ("grid[1][2]", "grid[:][:]"),
    ];
    for (instance, tpl) in cases {
        let parsed = parse(instance).unwrap();
        assert_eq!(format(&template(&parsed)), tpl);
        // A template shares its full prefix with any of its instances.
        let tpl_parsed = parse(tpl).unwrap();
        assert_eq!(common_prefix(&parsed, &tpl_parsed), parsed.len());
    }
}

#[test]
fn ancestry_matrix() {
    let root = parse("").unwrap();
    let section = parse("system[0]").unwrap();
    let leaf = parse("system[0].cost").unwrap();
    let other = parse("system[1].cost").unwrap();

    assert!(is_child(&root, &section));
    assert!(is_child(&section, &leaf));
    assert!(!is_child(&section, &other));
    assert_eq!(common_prefix(&leaf, &other), 1);
}

#[test]
fn malformed_paths() {
    for (case, err) in [
        ("a..b", PathError::EmptyStep),
        (".a", PathError::EmptyStep),
        ("a[", PathError::UnclosedBracket),
        ("a[-1]", PathError::InvalidIndex),
        ("a[]", PathError::InvalidIndex),
        ("a[0]x", PathError::InvalidIndex),
    ] {
        assert_eq!(parse(case), Err(err), "expected failure for {case:?}");
    }
}

#[test]
fn step_accessors() {
    let path = parse("system[3].cost").unwrap();
    assert_eq!(path[0].name(), Some("system"));
    assert_eq!(path[0].index(), None);
    assert_eq!(path[1].index(), Some(3));
    assert_eq!(path[2].name(), Some("cost"));
    assert_eq!(parse("a[:]").unwrap()[1], Step::Wild);
}
