use conference_core::db::open_db_in_memory;
use conference_core::{
    Conference, ConferenceListQuery, ConferenceService, ConferenceServiceError,
    ConferenceValidationError, SqliteConferenceRepository,
};

fn default_conference() -> Conference {
    Conference::new("AAAAAAAAAA", "1970-01-01T00:00:00Z")
}

#[test]
fn create_returns_saved_conference() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));

    let created = service.create_conference(&default_conference()).unwrap();
    assert!(created.id.is_some());
    assert_eq!(created.name.as_deref(), Some("AAAAAAAAAA"));

    let page = service
        .list_conferences(&ConferenceListQuery::default())
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items, vec![created]);
}

#[test]
fn create_with_existing_id_reports_idexists() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));

    let conference = Conference {
        id: Some(1),
        ..default_conference()
    };
    let err = service.create_conference(&conference).unwrap_err();
    assert!(matches!(
        err,
        ConferenceServiceError::Validation(ConferenceValidationError::IdExists)
    ));
    assert_eq!(err.error_key(), Some("idexists"));
}

#[test]
fn update_replaces_existing_conference() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));
    let created = service.create_conference(&default_conference()).unwrap();
    let id = created.id.unwrap();

    let replacement = Conference {
        id: Some(id),
        name: Some("BBBBBBBBBB".to_string()),
        date: Some("2024-05-01T10:00:00Z".to_string()),
    };
    let updated = service.update_conference(id, &replacement).unwrap();
    assert_eq!(updated, replacement);
    assert_eq!(service.get_conference(id).unwrap(), Some(replacement));
}

#[test]
fn update_rejects_missing_mismatched_and_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));
    let created = service.create_conference(&default_conference()).unwrap();
    let id = created.id.unwrap();

    let without_id = default_conference();
    let err = service.update_conference(id, &without_id).unwrap_err();
    assert_eq!(err.error_key(), Some("idnull"));

    let mismatched = Conference {
        id: Some(id + 1),
        ..default_conference()
    };
    let err = service.update_conference(id, &mismatched).unwrap_err();
    assert_eq!(err.error_key(), Some("idinvalid"));

    let unknown = Conference {
        id: Some(id + 100),
        ..default_conference()
    };
    let err = service.update_conference(id + 100, &unknown).unwrap_err();
    assert!(matches!(err, ConferenceServiceError::EntityNotFound(missing) if missing == id + 100));
    assert_eq!(err.error_key(), Some("idnotfound"));

    assert_eq!(service.get_conference(id).unwrap(), Some(created));
}

#[test]
fn partial_update_with_only_id_keeps_stored_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));
    let created = service.create_conference(&default_conference()).unwrap();
    let id = created.id.unwrap();

    let patch = Conference {
        id: Some(id),
        ..Conference::default()
    };
    let patched = service.partial_update_conference(id, &patch).unwrap();
    assert_eq!(patched, created);
}

#[test]
fn partial_update_overwrites_present_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));
    let created = service.create_conference(&default_conference()).unwrap();
    let id = created.id.unwrap();

    let patch = Conference {
        id: Some(id),
        name: Some("BBBBBBBBBB".to_string()),
        date: None,
    };
    let patched = service.partial_update_conference(id, &patch).unwrap();
    assert_eq!(patched.name.as_deref(), Some("BBBBBBBBBB"));
    assert_eq!(patched.date, created.date);
}

#[test]
fn partial_update_of_unknown_conference_reports_idnotfound() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));

    let patch = Conference {
        id: Some(42),
        ..default_conference()
    };
    let err = service.partial_update_conference(42, &patch).unwrap_err();
    assert_eq!(err.error_key(), Some("idnotfound"));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = ConferenceService::new(SqliteConferenceRepository::new(&conn));
    let created = service.create_conference(&default_conference()).unwrap();
    let id = created.id.unwrap();

    service.delete_conference(id).unwrap();
    service.delete_conference(id).unwrap();
    assert_eq!(service.get_conference(id).unwrap(), None);
    assert_eq!(
        service
            .list_conferences(&ConferenceListQuery::default())
            .unwrap()
            .total,
        0
    );
}
