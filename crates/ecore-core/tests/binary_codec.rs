use std::rc::Rc;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ecore_core::binary::{DEFAULT_MAX_DEPTH, SIGNATURE};
use ecore_pack::msgpack::MsgPackError;
use ecore_core::metamodel::FeatureSpec;
use ecore_core::object::same_object;
use ecore_core::{
    BinaryDecoder, BinaryEncoder, BinaryError, DecodeOptions, DynamicEObject, EClassBuilder,
    EDataType, EObjectRef, EPackage, EPackageBuilder, EncodeOptions, ErrorKind, IdManager,
    IdStrategy, PackageRegistry, Resource, ResourceSet, Value,
};
use proptest::prelude::*;
use tracing_subscriber::EnvFilter;

const NS_URI: &str = "urn:binary-codec-test:library";

// Library features.
const NAME: usize = 0;
const BOOKS: usize = 1;
const FEATURED: usize = 2;

// Book features.
const TITLE: usize = 0;
const PAGES: usize = 1;
const PRICE: usize = 2;
const RATIO: usize = 3;
const INITIAL: usize = 4;
const PUBLISHED: usize = 5;
const COVER: usize = 6;
const GENRE: usize = 7;
const TAGS: usize = 8;
const ISBN: usize = 9;
const LIBRARY: usize = 10;
const SEQUEL: usize = 11;
const RELATED: usize = 12;
const SCRATCH: usize = 13;

fn library_package(ns_uri: &str, genres: &[&str]) -> Arc<EPackage> {
    EPackageBuilder::new("library", ns_uri)
        .data_type(EDataType::enumeration("Genre", genres.iter().copied()))
        .data_type(EDataType::new("Isbn", None))
        .class(
            EClassBuilder::new("Library")
                .attribute("name", "EString")
                .feature(FeatureSpec::reference("books").containment().many())
                .feature(FeatureSpec::reference("featured")),
        )
        .class(
            EClassBuilder::new("Book")
                .attribute("title", "EString")
                .attribute("pages", "EInt")
                .attribute("price", "EDouble")
                .attribute("ratio", "EFloat")
                .attribute("initial", "EChar")
                .attribute("published", "EDate")
                .attribute("cover", "EByteArray")
                .attribute("genre", "Genre")
                .feature(FeatureSpec::attribute("tags", "Genre").many())
                .attribute("isbn", "Isbn")
                .feature(FeatureSpec::reference("library").container("books"))
                .feature(FeatureSpec::reference("sequel"))
                .feature(FeatureSpec::reference("related").many())
                .feature(FeatureSpec::attribute("scratch", "EString").transient()),
        )
        .build()
        .unwrap()
}

fn package() -> Arc<EPackage> {
    library_package(NS_URI, &["fiction", "mystery", "poetry"])
}

fn create(package: &Arc<EPackage>, class: &str) -> EObjectRef {
    DynamicEObject::new(package.class(class).unwrap().clone())
}

fn book(package: &Arc<EPackage>, title: &str) -> EObjectRef {
    let book = create(package, "Book");
    book.e_set(TITLE, Value::from(title)).unwrap();
    book
}

fn resource_set(package: &Arc<EPackage>) -> ResourceSet {
    let set = ResourceSet::new();
    set.register_package(package.clone());
    set
}

fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ecore_core=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

fn round_trip(package: &Arc<EPackage>, source: &Resource) -> Rc<Resource> {
    init_tracing();
    let bytes = source.save(&EncodeOptions::default()).unwrap();
    let set = resource_set(package);
    let target = set.create_resource(source.uri());
    target
        .load(&bytes, &DecodeOptions::default(), Some(&set))
        .unwrap();
    target
}

#[test]
fn stream_starts_with_signature_and_version() {
    let package = package();
    let bytes = BinaryEncoder::default()
        .encode_objects(&[book(&package, "Dune")])
        .unwrap();
    assert_eq!(&bytes[..8], &SIGNATURE);
    assert_eq!(&bytes[..8], &[0x89, 0x65, 0x6d, 0x66, 0x0a, 0x0d, 0x1a, 0x0a]);
    // Version 0, one root, object 0, package 0.
    assert_eq!(&bytes[8..12], &[0x00, 0x01, 0x00, 0x00]);
}

#[test]
fn attribute_values_survive_a_round_trip() {
    let package = package();
    let published = Utc.with_ymd_and_hms(1965, 8, 1, 12, 30, 0).unwrap();
    let dune = book(&package, "Dune");
    dune.e_set(PAGES, Value::Int(412)).unwrap();
    dune.e_set(PRICE, Value::Float(12.99)).unwrap();
    dune.e_set(RATIO, Value::Float(0.25)).unwrap();
    dune.e_set(INITIAL, Value::Char('é')).unwrap();
    dune.e_set(PUBLISHED, Value::Date(published)).unwrap();
    dune.e_set(COVER, Value::Bytes(vec![0, 1, 2, 255])).unwrap();
    dune.e_set(GENRE, Value::Enum("fiction".into())).unwrap();
    dune.e_set(
        TAGS,
        Value::List(vec![Value::Enum("poetry".into()), Value::Enum("mystery".into())]),
    )
    .unwrap();
    dune.e_set(ISBN, Value::from("978-0441013593")).unwrap();

    let source = Resource::new("books.bin");
    source.add(dune);
    let target = round_trip(&package, &source);

    let roots = target.contents();
    assert_eq!(roots.len(), 1);
    let decoded = &roots[0];
    assert_eq!(decoded.e_class().name(), "Book");
    assert_eq!(decoded.e_get(TITLE), Value::from("Dune"));
    assert_eq!(decoded.e_get(PAGES), Value::Int(412));
    assert_eq!(decoded.e_get(PRICE), Value::Float(12.99));
    assert_eq!(decoded.e_get(RATIO), Value::Float(0.25));
    assert_eq!(decoded.e_get(INITIAL), Value::Char('é'));
    assert_eq!(decoded.e_get(PUBLISHED), Value::Date(published));
    assert_eq!(decoded.e_get(COVER), Value::Bytes(vec![0, 1, 2, 255]));
    assert_eq!(decoded.e_get(GENRE), Value::Enum("fiction".into()));
    assert_eq!(
        decoded.e_get(TAGS),
        Value::List(vec![Value::Enum("poetry".into()), Value::Enum("mystery".into())])
    );
    assert_eq!(decoded.e_get(ISBN), Value::from("978-0441013593"));
}

#[test]
fn shared_references_keep_their_identity() {
    let package = package();
    let library = create(&package, "Library");
    library.e_set(NAME, Value::from("City")).unwrap();
    let first = book(&package, "Foundation");
    let second = book(&package, "Foundation and Empire");
    first.e_set(SEQUEL, Value::from(&second)).unwrap();
    second.e_set(RELATED, Value::List(vec![Value::from(&first)])).unwrap();
    library
        .e_set(BOOKS, Value::List(vec![Value::from(&first), Value::from(&second)]))
        .unwrap();
    library.e_set(FEATURED, Value::from(&second)).unwrap();

    let source = Resource::new("city.bin");
    source.add(library);
    let target = round_trip(&package, &source);

    let roots = target.contents();
    let library = &roots[0];
    assert_eq!(library.e_get(NAME), Value::from("City"));
    let books = library.e_get(BOOKS).objects();
    assert_eq!(books.len(), 2);
    let (first, second) = (&books[0], &books[1]);
    assert_eq!(first.e_get(TITLE), Value::from("Foundation"));
    assert!(same_object(first.e_get(SEQUEL).as_object().unwrap(), second));
    assert!(same_object(library.e_get(FEATURED).as_object().unwrap(), second));
    assert!(second.e_get(RELATED).holds(first));
    for book in &books {
        assert!(same_object(&book.e_container().unwrap(), library));
        assert_eq!(book.e_container_feature_id(), Some(BOOKS));
        assert!(book.e_get(LIBRARY).holds(library));
    }
}

#[test]
fn cycles_are_written_as_back_references() {
    let package = package();
    let ouroboros = book(&package, "Ouroboros");
    ouroboros.e_set(SEQUEL, Value::from(&ouroboros)).unwrap();

    let bytes = BinaryEncoder::default().encode_objects(&[ouroboros]).unwrap();
    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry(&package))
        .decode(&bytes)
        .unwrap();
    let decoded = &roots[0];
    assert!(same_object(decoded.e_get(SEQUEL).as_object().unwrap(), decoded));
}

fn registry(package: &Arc<EPackage>) -> PackageRegistry {
    let registry = PackageRegistry::new();
    registry.register(package.clone());
    registry
}

#[test]
fn names_are_written_once_per_stream() {
    let package = package();
    let books: Vec<EObjectRef> = (0..3)
        .map(|i| {
            let b = book(&package, &format!("Volume {i}"));
            b.e_set(PAGES, Value::Int(100 + i)).unwrap();
            b
        })
        .collect();
    let bytes = BinaryEncoder::default().encode_objects(&books).unwrap();

    assert_eq!(occurrences(&bytes, NS_URI.as_bytes()), 1);
    assert_eq!(occurrences(&bytes, b"Book"), 1);
    assert_eq!(occurrences(&bytes, b"title"), 1);
    assert_eq!(occurrences(&bytes, b"pages"), 1);
}

#[test]
fn enum_literal_is_spelled_out_once() {
    let package = package();
    let b = book(&package, "Collected");
    let tags = vec![Value::Enum("mystery".into()); 5];
    // Reference lists deduplicate; attribute lists keep repeats.
    b.e_set(TAGS, Value::List(tags.clone())).unwrap();
    b.e_set(GENRE, Value::Enum("mystery".into())).unwrap();

    let bytes = BinaryEncoder::default().encode_objects(&[b]).unwrap();
    assert_eq!(occurrences(&bytes, b"mystery"), 1);

    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry(&package))
        .decode(&bytes)
        .unwrap();
    assert_eq!(roots[0].e_get(TAGS), Value::List(tags));
    assert_eq!(roots[0].e_get(GENRE), Value::Enum("mystery".into()));
}

#[test]
fn unset_and_transient_features_are_skipped() {
    let package = package();
    let b = book(&package, "Sparse");
    b.e_set(SCRATCH, Value::from("scribbles")).unwrap();
    let bytes = BinaryEncoder::default().encode_objects(&[b]).unwrap();
    assert_eq!(occurrences(&bytes, b"scratch"), 0);
    assert_eq!(occurrences(&bytes, b"scribbles"), 0);
    assert_eq!(occurrences(&bytes, b"pages"), 0);

    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry(&package))
        .decode(&bytes)
        .unwrap();
    assert!(!roots[0].e_is_set(PAGES));
    assert!(!roots[0].e_is_set(SCRATCH));
    assert_eq!(roots[0].e_get(TITLE), Value::from("Sparse"));
}

#[test]
fn single_object_streams() {
    let package = package();
    let b = book(&package, "Solo");
    let bytes = BinaryEncoder::default().encode_object(&b).unwrap();
    let decoded = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry(&package))
        .decode_object(&bytes)
        .unwrap()
        .unwrap();
    assert_eq!(decoded.e_get(TITLE), Value::from("Solo"));
}

#[test]
fn chunked_input_decodes_like_contiguous_input() {
    let package = package();
    let books: Vec<EObjectRef> = ["a", "b", "c"].iter().map(|t| book(&package, t)).collect();
    let bytes = BinaryEncoder::default().encode_objects(&books).unwrap();
    let chunks: Vec<&[u8]> = bytes.chunks(5).collect();

    let registry = registry(&package);
    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode_chunks(&chunks)
        .unwrap();
    let titles: Vec<Value> = roots.iter().map(|r| r.e_get(TITLE)).collect();
    assert_eq!(titles, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
}

#[test]
fn object_ids_travel_with_the_stream() {
    let package = package();
    let source = Resource::new("ids.bin");
    source.set_id_manager(IdManager::new(IdStrategy::Ulid));
    let b = book(&package, "Tagged");
    source.add(b.clone());
    let id = source.with_id_manager(|m| m.register(&b)).unwrap();

    let bytes = source.save(&EncodeOptions::default()).unwrap();
    let set = resource_set(&package);
    let target = set.create_resource("ids.bin");
    target.set_id_manager(IdManager::new(IdStrategy::Ulid));
    target
        .load(&bytes, &DecodeOptions::default(), Some(&set))
        .unwrap();
    let roots = target.contents();
    let decoded = &roots[0];
    assert_eq!(target.object_id(decoded), Some(id.clone()));
    assert!(same_object(&target.get_eobject(&id.to_string()).unwrap(), decoded));

    // Without an ID manager the IDs are dropped, not an error.
    let plain = set.create_resource("plain.bin");
    plain.load(&bytes, &DecodeOptions::default(), Some(&set)).unwrap();
    assert_eq!(plain.object_id(&plain.contents()[0]), None);

    let without_ids = source
        .save(&EncodeOptions {
            write_object_ids: false,
            ..EncodeOptions::default()
        })
        .unwrap();
    assert!(without_ids.len() < bytes.len());
}

#[test]
fn cross_resource_references_become_proxies() {
    let package = package();
    let source_set = resource_set(&package);
    let shelf = source_set.create_resource("shelf.bin");
    let remote = book(&package, "Remote");
    shelf.add(remote.clone());
    let home = source_set.create_resource("home.bin");
    let library = create(&package, "Library");
    library.e_set(FEATURED, Value::from(&remote)).unwrap();
    home.add(library);

    let home_bytes = home.save(&EncodeOptions::default()).unwrap();
    assert_eq!(occurrences(&home_bytes, b"shelf.bin#/0"), 1);
    assert_eq!(occurrences(&home_bytes, b"Remote"), 0);
    let shelf_bytes = shelf.save(&EncodeOptions::default()).unwrap();

    // Left as a proxy, resolved on access.
    let set = resource_set(&package);
    let home = set.create_resource("home.bin");
    home.load(&home_bytes, &DecodeOptions::default(), Some(&set))
        .unwrap();
    let library = home.contents()[0].clone();
    let proxy = library.e_get(FEATURED).as_object().unwrap().clone();
    assert!(proxy.e_is_proxy());
    assert_eq!(proxy.e_proxy_uri().as_deref(), Some("shelf.bin#/0"));
    assert_eq!(proxy.e_class().name(), "Book");

    let shelf = set.create_resource("shelf.bin");
    shelf
        .load(&shelf_bytes, &DecodeOptions::default(), Some(&set))
        .unwrap();
    let resolved = set.get_resolved(&library, FEATURED);
    let resolved = resolved.as_object().unwrap();
    assert!(!resolved.e_is_proxy());
    assert!(same_object(resolved, &shelf.contents()[0]));

    // Resolved while decoding when the target is already loaded.
    let eager = set.create_resource("eager.bin");
    let options = DecodeOptions {
        resolve_proxies: true,
        ..DecodeOptions::default()
    };
    eager.load(&home_bytes, &options, Some(&set)).unwrap();
    let featured = eager.contents()[0].e_get(FEATURED);
    assert!(same_object(featured.as_object().unwrap(), &shelf.contents()[0]));
}

#[test]
fn unresolvable_proxies_stay_proxies() {
    let package = package();
    let dangling = book(&package, "Dangling");
    dangling.e_set_proxy_uri(Some("missing.bin#/3".into()));
    let library = create(&package, "Library");
    library.e_set(FEATURED, Value::from(&dangling)).unwrap();
    let source = Resource::new("lonely.bin");
    source.add(library);

    let bytes = source.save(&EncodeOptions::default()).unwrap();
    let set = resource_set(&package);
    let target = set.create_resource("lonely.bin");
    let options = DecodeOptions {
        resolve_proxies: true,
        ..DecodeOptions::default()
    };
    target.load(&bytes, &options, Some(&set)).unwrap();
    let featured = target.contents()[0].e_get(FEATURED);
    let proxy = featured.as_object().unwrap();
    assert_eq!(proxy.e_proxy_uri().as_deref(), Some("missing.bin#/3"));
    assert!(!proxy.e_is_set(TITLE));
}

#[test]
fn framing_errors_leave_the_resource_untouched() {
    let package = package();
    let set = resource_set(&package);
    let target = set.create_resource("kept.bin");
    target.add(book(&package, "Original"));

    let err = target
        .load(b"not a model", &DecodeOptions::default(), Some(&set))
        .unwrap_err();
    assert_eq!(err, BinaryError::Signature);
    assert_eq!(err.kind(), ErrorKind::Framing);

    let err = target
        .load(&SIGNATURE[..4], &DecodeOptions::default(), Some(&set))
        .unwrap_err();
    assert_eq!(err, BinaryError::Signature);

    let mut corrupted = BinaryEncoder::default()
        .encode_objects(&[book(&package, "Corrupted")])
        .unwrap();
    corrupted[0] = 0x88;
    let err = target
        .load(&corrupted, &DecodeOptions::default(), Some(&set))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Framing);

    let mut bytes = BinaryEncoder::default()
        .encode_objects(&[book(&package, "Future")])
        .unwrap();
    bytes[8] = 0x01;
    let err = target
        .load(&bytes, &DecodeOptions::default(), Some(&set))
        .unwrap_err();
    assert_eq!(err, BinaryError::UnsupportedVersion("1".into()));
    assert_eq!(err.kind(), ErrorKind::Framing);

    let mut truncated = BinaryEncoder::default()
        .encode_objects(&[book(&package, "Cut short")])
        .unwrap();
    truncated.truncate(truncated.len() - 3);
    let err = target
        .load(&truncated, &DecodeOptions::default(), Some(&set))
        .unwrap_err();
    assert!(matches!(err, BinaryError::Pack(_)));
    assert_eq!(err.kind(), ErrorKind::Framing);

    let roots = target.contents();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].e_get(TITLE), Value::from("Original"));
}

#[test]
fn malformed_markers_and_ids_are_rejected() {
    let package = package();
    let registry = registry(&package);
    let header = {
        let mut bytes = SIGNATURE.to_vec();
        bytes.push(0x00);
        bytes
    };

    // Root count 1, object 0, package 0 with its URI, class 0 "Book", marker -5.
    let mut bytes = header.clone();
    bytes.extend_from_slice(&[0x01, 0x00, 0x00]);
    bytes.push(0xa0 | NS_URI.len() as u8);
    bytes.extend_from_slice(NS_URI.as_bytes());
    bytes.extend_from_slice(&[0x00, 0xa4]);
    bytes.extend_from_slice(b"Book");
    bytes.push(0xfb);
    let err = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .unwrap_err();
    assert_eq!(err, BinaryError::InvalidMarker(-5));

    // First object numbered 3.
    let mut bytes = header;
    bytes.extend_from_slice(&[0x01, 0x03]);
    let err = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .unwrap_err();
    assert_eq!(
        err,
        BinaryError::InvalidObjectId {
            table: "object",
            id: 3,
            next: 0
        }
    );
    assert_eq!(err.kind(), ErrorKind::Framing);
}

#[test]
fn nesting_beyond_the_limit_is_rejected() {
    let package = package();
    let bytes = BinaryEncoder::default()
        .encode_objects(&[sequel_chain(&package, 10)])
        .unwrap();
    let registry = registry(&package);

    let shallow = DecodeOptions {
        max_depth: 4,
        ..DecodeOptions::default()
    };
    let err = BinaryDecoder::new(shallow)
        .with_registry(&registry)
        .decode(&bytes)
        .unwrap_err();
    assert_eq!(err, BinaryError::TooDeep(4));

    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .unwrap();
    assert_eq!(roots.len(), 1);
}

fn sequel_chain(package: &Arc<EPackage>, len: usize) -> EObjectRef {
    let head = book(package, "0");
    let mut tail = head.clone();
    for i in 1..len {
        let next = book(package, &i.to_string());
        tail.e_set(SEQUEL, Value::from(&next)).unwrap();
        tail = next;
    }
    head
}

#[test]
fn chains_just_under_the_default_limit_round_trip() {
    let package = package();
    let registry = registry(&package);
    let len = DEFAULT_MAX_DEPTH - 1;
    let bytes = BinaryEncoder::default()
        .encode_objects(&[sequel_chain(&package, len)])
        .unwrap();
    let roots = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .unwrap();

    let mut count = 0;
    let mut current = roots.first().cloned();
    while let Some(book) = current {
        assert_eq!(book.e_get(TITLE), Value::from(count.to_string()));
        count += 1;
        current = book.e_get(SEQUEL).as_object().cloned();
    }
    assert_eq!(count, len);
}

#[test]
fn chains_over_the_limit_fail_on_both_sides() {
    let package = package();
    let registry = registry(&package);
    let chain = sequel_chain(&package, DEFAULT_MAX_DEPTH + 1);

    let err = BinaryEncoder::default()
        .encode_objects(&[chain.clone()])
        .err()
        .unwrap();
    assert_eq!(err, BinaryError::TooDeep(DEFAULT_MAX_DEPTH));

    let deep = EncodeOptions {
        max_depth: DEFAULT_MAX_DEPTH + 1,
        ..EncodeOptions::default()
    };
    let bytes = BinaryEncoder::new(deep).encode_objects(&[chain]).unwrap();
    let err = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .err()
        .unwrap();
    assert_eq!(err, BinaryError::TooDeep(DEFAULT_MAX_DEPTH));
    assert_eq!(err.kind(), ErrorKind::Framing);
}

#[test]
fn nested_containers_in_place_of_scalars_are_framing_errors() {
    let package = package();
    let registry = registry(&package);
    let mut bytes = SIGNATURE.to_vec();
    bytes.push(0x00);
    bytes.extend(std::iter::repeat(0x91).take(2_000_000));
    let err = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .err()
        .unwrap();
    assert_eq!(
        err,
        BinaryError::Pack(MsgPackError::InvalidByte {
            byte: 0x91,
            offset: SIGNATURE.len() + 1
        })
    );
    assert_eq!(err.kind(), ErrorKind::Framing);

    // Inside an object, where a feature marker is expected.
    let mut bytes = BinaryEncoder::default()
        .encode_objects(&[book(&package, "Nested")])
        .unwrap();
    bytes.pop();
    let offset = bytes.len();
    bytes.extend(std::iter::repeat(0xdc).take(1000));
    let err = BinaryDecoder::new(DecodeOptions::default())
        .with_registry(&registry)
        .decode(&bytes)
        .err()
        .unwrap();
    assert_eq!(err, BinaryError::Pack(MsgPackError::InvalidByte { byte: 0xdc, offset }));
}

#[test]
fn unknown_metamodel_names_are_resolution_errors() {
    let evolved = EPackageBuilder::new("library", "urn:binary-codec-test:evolving")
        .data_type(EDataType::enumeration("Genre", ["fiction", "satire"]))
        .class(
            EClassBuilder::new("Book")
                .attribute("title", "EString")
                .attribute("genre", "Genre")
                .attribute("edition", "EInt"),
        )
        .class(EClassBuilder::new("Pamphlet").attribute("title", "EString"))
        .build()
        .unwrap();
    let original = EPackageBuilder::new("library", "urn:binary-codec-test:evolving")
        .data_type(EDataType::enumeration("Genre", ["fiction"]))
        .class(
            EClassBuilder::new("Book")
                .attribute("title", "EString")
                .attribute("genre", "Genre"),
        )
        .build()
        .unwrap();
    let registry = registry(&original);
    let decode = |object: EObjectRef| {
        let bytes = BinaryEncoder::default().encode_objects(&[object]).unwrap();
        BinaryDecoder::new(DecodeOptions::default())
            .with_registry(&registry)
            .decode(&bytes)
    };

    let with_edition = create(&evolved, "Book");
    with_edition.e_set(2, Value::Int(2)).unwrap();
    let err = decode(with_edition).unwrap_err();
    assert_eq!(
        err,
        BinaryError::UnknownFeature {
            class: "Book".into(),
            feature: "edition".into()
        }
    );
    assert_eq!(err.kind(), ErrorKind::Resolution);

    let err = decode(create(&evolved, "Pamphlet")).unwrap_err();
    assert!(matches!(err, BinaryError::UnknownClass { ref class, .. } if class == "Pamphlet"));
    assert_eq!(err.kind(), ErrorKind::Resolution);

    let satire = create(&evolved, "Book");
    satire.e_set(1, Value::Enum("satire".into())).unwrap();
    let err = decode(satire).unwrap_err();
    assert!(matches!(err, BinaryError::UnknownLiteral { ref literal, .. } if literal == "satire"));

    let stranger = library_package("urn:binary-codec-test:unregistered", &["fiction"]);
    let err = decode(book(&stranger, "Who?")).unwrap_err();
    assert_eq!(
        err,
        BinaryError::UnknownPackage("urn:binary-codec-test:unregistered".into())
    );
    assert_eq!(err.kind(), ErrorKind::Resolution);
}

#[test]
fn values_the_encoding_cannot_carry_are_reported() {
    let package = package();
    let b = book(&package, "Bad genre");
    b.e_set(GENRE, Value::Enum("western".into())).unwrap();
    let err = BinaryEncoder::default().encode_objects(&[b]).unwrap_err();
    assert_eq!(
        err,
        BinaryError::UnknownLiteral {
            data_type: "Genre".into(),
            literal: "western".into()
        }
    );

    let b = book(&package, "Bad pages");
    b.e_set(PAGES, Value::from("many")).unwrap();
    let err = BinaryEncoder::default().encode_objects(&[b]).unwrap_err();
    assert!(matches!(err, BinaryError::UnencodableValue { ref feature, .. } if feature == "pages"));
    assert_eq!(err.kind(), ErrorKind::Data);
}

proptest! {
    #[test]
    fn attributes_round_trip(
        title in "[a-zA-Z0-9 ]{0,40}",
        pages in any::<i32>(),
        price in -1.0e9f64..1.0e9,
        cover in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let package = package();
        let b = book(&package, &title);
        b.e_set(PAGES, Value::Int(i64::from(pages))).unwrap();
        b.e_set(PRICE, Value::Float(price)).unwrap();
        b.e_set(COVER, Value::Bytes(cover.clone())).unwrap();

        let bytes = BinaryEncoder::default().encode_objects(&[b]).unwrap();
        let roots = BinaryDecoder::new(DecodeOptions::default())
            .with_registry(&registry(&package))
            .decode(&bytes)
            .unwrap();
        prop_assert_eq!(roots[0].e_get(TITLE), Value::from(title.as_str()));
        prop_assert_eq!(roots[0].e_get(PAGES), Value::Int(i64::from(pages)));
        prop_assert_eq!(roots[0].e_get(PRICE), Value::Float(price));
        prop_assert_eq!(roots[0].e_get(COVER), Value::Bytes(cover));
    }
}
