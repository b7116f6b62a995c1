use tensorize_index::{IndexMap, KeyTransform, SortPolicy};

#[test]
fn sort_none_keeps_insertion_order() {
    let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::None);
    map.add("banana").unwrap();
    map.add("apple").unwrap();
    map.add("0").unwrap();

    assert!(!map.is_finalized());
    map.build_map().unwrap();
    assert!(map.is_finalized());

    assert_eq!(map.index_of("banana").unwrap(), Some(1));
    assert_eq!(map.index_of("apple").unwrap(), Some(2));
    assert_eq!(map.index_of("0").unwrap(), Some(3));
}

#[test]
fn sort_lex_orders_by_text() {
    let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
    map.add("banana").unwrap();
    map.add("apple").unwrap();
    map.add("0").unwrap();

    map.build_map().unwrap();

    assert_eq!(map.index_of("0").unwrap(), Some(1));
    assert_eq!(map.index_of("apple").unwrap(), Some(2));
    assert_eq!(map.index_of("banana").unwrap(), Some(3));
}

#[test]
fn sort_num_orders_integers_numerically() {
    let mut map = IndexMap::new("m", KeyTransform::Int, SortPolicy::Num);
    map.add("3").unwrap();
    map.add("2").unwrap();
    map.add("0").unwrap();

    map.build_map().unwrap();

    assert_eq!(map.index_of("0").unwrap(), Some(1));
    assert_eq!(map.index_of("2").unwrap(), Some(2));
    assert_eq!(map.index_of("3").unwrap(), Some(3));
}

#[test]
fn sort_num_is_not_string_order() {
    let mut map = IndexMap::new("m", KeyTransform::Int, SortPolicy::Num);
    map.add("9").unwrap();
    map.add("10").unwrap();
    map.add("2").unwrap();

    map.build_map().unwrap();

    assert_eq!(map.index_of("2").unwrap(), Some(1));
    assert_eq!(map.index_of("9").unwrap(), Some(2));
    assert_eq!(map.index_of("10").unwrap(), Some(3));
}

#[test]
fn sort_num_orders_floats() {
    let mut map = IndexMap::new("m", KeyTransform::Float, SortPolicy::Num);
    map.add("3.2").unwrap();
    map.add("2.1").unwrap();
    map.add("2.5").unwrap();

    map.build_map().unwrap();

    assert_eq!(map.index_of("2.1").unwrap(), Some(1));
    assert_eq!(map.index_of("2.5").unwrap(), Some(2));
    assert_eq!(map.index_of("3.2").unwrap(), Some(3));
}

#[test]
fn indices_are_contiguous_from_one() {
    let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
    for raw in ["d", "b", "a", "c", "b", "a"] {
        map.add(raw).unwrap();
    }
    map.build_map().unwrap();

    assert_eq!(map.len(), 4);
    let mut seen: Vec<u64> = ["a", "b", "c", "d"]
        .iter()
        .map(|raw| map.index_of(raw).unwrap().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4]);
}

#[test]
fn sub_to_zero_excludes_key_from_domain() {
    let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
    map.add("keep").unwrap();
    map.add("drop").unwrap();
    map.add("drop").unwrap();

    map.sub("drop").unwrap();
    map.sub("drop").unwrap();
    assert_eq!(map.get_count("drop"), 0);

    map.build_map().unwrap();

    // Pruned key: plain None, never an error.
    assert_eq!(map.index_of("drop").unwrap(), None);
    assert_eq!(map.index_of("keep").unwrap(), Some(1));
    assert_eq!(map.len(), 1);
}

#[test]
fn write_lists_keys_in_index_order() {
    let mut map = IndexMap::new("m", KeyTransform::Int, SortPolicy::Num);
    map.add("30").unwrap();
    map.add("4").unwrap();
    map.add("100").unwrap();
    map.build_map().unwrap();

    let mut out = Vec::new();
    map.write(&mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "4\n30\n100\n");
}

#[test]
fn write_before_build_is_an_error() {
    let mut map = IndexMap::new("m", KeyTransform::Str, SortPolicy::Lex);
    map.add("a").unwrap();
    let mut out = Vec::new();
    assert!(map.write(&mut out).is_err());
}
