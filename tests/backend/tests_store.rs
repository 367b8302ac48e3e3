//! Identifiable stores over both backends.

use std::sync::Arc;

use aas::IdentifiableRef;
use aas::backend::{
    BackendError, FileBackend, IdentifiableStore, MemoryBackend, ObjectBackend, StoreError,
};
use aas::interchange::Xml;
use aas::model::{Identifiable, KeyTypes};
use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::*;

fn populate<B: ObjectBackend>(store: &IdentifiableStore<B>) {
    for item in motor_environment().iter() {
        store.create(item).unwrap();
    }
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_environment_survives_storage(#[case] on_disk: bool) {
    let dir = TempDir::new().unwrap();
    let backend: Box<dyn ObjectBackend> = if on_disk {
        Box::new(FileBackend::open(dir.path()).unwrap())
    } else {
        Box::new(MemoryBackend::new())
    };
    let store = IdentifiableStore::json(backend);
    populate(&store);

    let loaded = store.load_environment().unwrap();
    assert_same_environment(&motor_environment(), &loaded);

    let reference = element_ref(&[(KeyTypes::Entity, "Bearing")]);
    assert!(aas::resolve(&reference, &loaded).is_ok());
}

#[test]
fn test_files_persist_across_handles() {
    let dir = TempDir::new().unwrap();
    {
        let store =
            IdentifiableStore::new(FileBackend::open(dir.path()).unwrap(), Box::new(Xml::new()));
        populate(&store);
    }
    let store =
        IdentifiableStore::new(FileBackend::open(dir.path()).unwrap(), Box::new(Xml::new()));
    let mut ids = store.ids().unwrap();
    ids.sort();
    let mut expected = vec![SHELL_ID, SUBMODEL_ID, CONCEPT_ID];
    expected.sort();
    assert_eq!(ids, expected);
    assert_same_environment(&motor_environment(), &store.load_environment().unwrap());
}

#[test]
fn test_stale_revision_conflicts() {
    let dir = TempDir::new().unwrap();
    let first = IdentifiableStore::json(FileBackend::open(dir.path()).unwrap());
    let second = IdentifiableStore::json(FileBackend::open(dir.path()).unwrap());
    let original = submodel();
    first.create(IdentifiableRef::Submodel(&original)).unwrap();

    let (_, seen) = first.get(SUBMODEL_ID).unwrap().unwrap();
    let (Identifiable::Submodel(mut edited), theirs) = second.get(SUBMODEL_ID).unwrap().unwrap()
    else {
        panic!("not a submodel");
    };
    edited.common.referable.category = Some("VARIABLE".to_string());
    second.update(IdentifiableRef::Submodel(&edited), &theirs).unwrap();

    let err = first
        .update(IdentifiableRef::Submodel(&original), &seen)
        .unwrap_err();
    let conflict = err.as_conflict().expect("conflict");
    assert_eq!(conflict.id, SUBMODEL_ID);
    assert_eq!(conflict.expected.as_ref(), Some(&seen));
    assert_ne!(conflict.actual.as_ref(), Some(&seen));

    let (current, _) = first.get(SUBMODEL_ID).unwrap().unwrap();
    let Identifiable::Submodel(current) = current else {
        panic!("not a submodel");
    };
    assert_eq!(current.common.referable.category.as_deref(), Some("VARIABLE"));
}

#[test]
fn test_create_twice_conflicts() {
    let store = IdentifiableStore::json(MemoryBackend::new());
    let sm = submodel();
    store.create(IdentifiableRef::Submodel(&sm)).unwrap();
    let err = store.create(IdentifiableRef::Submodel(&sm)).unwrap_err();
    assert!(matches!(err, StoreError::Backend(BackendError::Conflict(_))), "{err:?}");
}

#[test]
fn test_delete_needs_current_revision() {
    let store = IdentifiableStore::json(MemoryBackend::new());
    let sm = submodel();
    let created = store.create(IdentifiableRef::Submodel(&sm)).unwrap();
    let updated = store.update(IdentifiableRef::Submodel(&sm), &created).unwrap();

    assert!(store.delete(SUBMODEL_ID, &created).unwrap_err().as_conflict().is_some());
    store.delete(SUBMODEL_ID, &updated).unwrap();
    assert!(store.get(SUBMODEL_ID).unwrap().is_none());
}

#[test]
fn test_concurrent_creates_admit_one() {
    let backend = Arc::new(MemoryBackend::new());
    let winners: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let backend = Arc::clone(&backend);
                scope.spawn(move || {
                    let bytes = format!("writer {n}").into_bytes();
                    usize::from(backend.put("urn:contended", &bytes, None).is_ok())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(winners, 1);
    assert_eq!(backend.list().unwrap(), ["urn:contended"]);
}
