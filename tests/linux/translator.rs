use std::ffi::{OsStr, OsString};

use fatmirror::{MappingError, PathMapper, PathResolver, PathTranslator, SharedMapper, SubstitutionTable};

fn translate(t: &mut PathTranslator, path: &str) -> OsString {
    t.translate(OsStr::new(path)).expect("translate")
}

fn names(list: &[&str]) -> Vec<OsString> {
    list.iter().map(OsString::from).collect()
}

fn resolve(t: &PathTranslator, path: &OsStr) -> OsString {
    PathResolver::new(t.tables()).resolve_original(path)
}

#[test]
fn identity_for_clean_paths() {
    let mut t = PathTranslator::default();
    for path in ["/", "/a", "/a/b.txt", "/with space/x_y", "/.hidden"] {
        assert_eq!(translate(&mut t, path), path);
        assert_eq!(resolve(&t, OsStr::new(path)), path);
    }
    assert!(t.tables().is_empty());
}

#[test]
fn translation_is_idempotent() {
    let mut t = PathTranslator::default();
    let first = translate(&mut t, "/report: final?.doc");
    let second = translate(&mut t, "/report: final?.doc");
    assert_eq!(first, "/report_ final_.doc");
    assert_eq!(first, second);
    assert_eq!(t.tables().len(), 1);
}

#[test]
fn collision_gets_numbered_suffix() {
    let mut t = PathTranslator::default();
    assert_eq!(translate(&mut t, "a?.txt"), "a_.txt");
    assert_eq!(t.tables().backward(OsStr::new("a_.txt")).unwrap(), "a?.txt");

    assert_eq!(translate(&mut t, "a*.txt"), "a_1.txt");
    assert_eq!(resolve(&t, OsStr::new("a_1.txt")), "a*.txt");
    assert_eq!(resolve(&t, OsStr::new("a_.txt")), "a?.txt");
}

#[test]
fn bijection_holds_after_many_translations() {
    let mut t = PathTranslator::default();
    let originals = [
        "/x?", "/x*", "/x:", "/x?/a?.b", "/x?/a*.b", "/y:z.tar.gz", "/y*z.tar.gz", "/.c?fg",
    ];
    for path in originals {
        translate(&mut t, path);
        assert!(t.tables().is_bijective());
    }
    assert_eq!(t.tables().len(), originals.len());
    for (original, translated) in t.tables().iter() {
        assert_eq!(t.tables().forward(original), Some(translated));
        assert_eq!(t.tables().backward(translated), Some(original));
    }
}

#[test]
fn round_trip_survives_later_translations() {
    let mut t = PathTranslator::default();
    let dir = translate(&mut t, "/music: live");
    let first = translate(&mut t, "/music_ live/track?.ogg");
    assert_eq!(dir, "/music_ live");
    assert_eq!(resolve(&t, &first), "/music: live/track?.ogg");

    for i in 0..20 {
        translate(&mut t, &format!("/music_ live/other{i}*.ogg"));
    }
    translate(&mut t, "/music_ live/track*.ogg");
    assert_eq!(resolve(&t, &first), "/music: live/track?.ogg");
    assert_eq!(resolve(&t, OsStr::new("/music_ live/track_1.ogg")), "/music: live/track*.ogg");
}

#[test]
fn collisions_are_counted_per_translated_stem() {
    let mut t = PathTranslator::default();
    assert_eq!(translate(&mut t, "/d1/f?"), "/d1/f_");
    assert_eq!(translate(&mut t, "/d2/f?"), "/d2/f_");
    assert_eq!(translate(&mut t, "/d1/f*"), "/d1/f_1");
    assert_eq!(translate(&mut t, "/d2/f*"), "/d2/f_1");
}

#[test]
fn exhaustion_after_nine_suffixes() {
    let table = SubstitutionTable::with_extra("<>|\"#%&+", '_').unwrap();
    let mut t = PathTranslator::new(table);
    let originals = [
        "/n?.md", "/n*.md", "/n:.md", "/n<.md", "/n>.md", "/n|.md", "/n\".md", "/n#.md", "/n%.md",
        "/n&.md", "/n+.md",
    ];
    assert_eq!(translate(&mut t, originals[0]), "/n_.md");
    for (i, path) in originals.iter().enumerate().skip(1).take(9) {
        assert_eq!(translate(&mut t, path), OsString::from(format!("/n_{i}.md")));
    }

    let err = t.translate(OsStr::new(originals[10])).unwrap_err();
    assert!(matches!(err, MappingError::CollisionExhausted { .. }));
    assert!(t.tables().forward(OsStr::new(originals[10])).is_none());
    assert!(t.tables().is_bijective());

    // Earlier entries keep working after the failure.
    assert_eq!(resolve(&t, OsStr::new("/n_9.md")), originals[9]);
}

#[test]
fn shared_mapper_listing_is_deterministic() {
    let listing = |mapper: &SharedMapper| {
        mapper
            .translate_dir_entries(OsStr::new("/dir"), names(&["z*", "b.txt", "z?", "a?.txt", "z:"]))
            .into_iter()
            .map(|e| e.result.unwrap())
            .collect::<Vec<_>>()
    };

    let mapper = SharedMapper::default();
    let first = listing(&mapper);
    let second = listing(&mapper);
    assert_eq!(first, names(&["a_.txt", "b.txt", "z_", "z_1", "z_2"]));
    assert_eq!(first, second);

    let fresh = SharedMapper::default();
    assert_eq!(listing(&fresh), first);

    assert_eq!(mapper.resolve_original(OsStr::new("/dir/z_")), "/dir/z*");
    assert_eq!(mapper.resolve_original(OsStr::new("/dir/z_1")), "/dir/z:");
    assert_eq!(mapper.resolve_original(OsStr::new("/dir/z_2")), "/dir/z?");
}

#[test]
fn shared_mapper_hides_only_the_exhausted_entry() {
    let mapper = SharedMapper::default();
    let mut names: Vec<OsString> = Vec::new();
    for a in ['?', '*', ':'] {
        for b in ['?', '*', ':'] {
            for c in ['?', '*', ':'] {
                names.push(OsString::from(format!("k{a}{b}{c}")));
            }
        }
    }
    names.push(OsString::from("plain"));
    let entries = mapper.translate_dir_entries(OsStr::new("/"), names);
    let ok = entries.iter().filter(|e| e.result.is_ok()).count();
    let exhausted = entries
        .iter()
        .filter(|e| matches!(e.result, Err(MappingError::CollisionExhausted { .. })))
        .count();
    assert_eq!(ok, 11);
    assert_eq!(exhausted, 17);
}
