use chrono::NaiveDate;
use comunidad_core::db::open_db_in_memory;
use comunidad_core::model::validate::ValidationError;
use comunidad_core::{
    ActivityDraft, ActivityListQuery, AttendanceKind, CatalogRepository, EnrollmentRepository,
    EventRepository, PersonDraft, PersonRepository, ProgramService, RepoError,
    SqliteCatalogRepository, SqliteEnrollmentRepository, SqliteEventRepository,
    SqlitePersonRepository, TripDraft, TripListQuery,
};
use rusqlite::Connection;

struct Seed {
    unit_id: i64,
    second_unit_id: i64,
    person_id: i64,
    workshop_id: i64,
    benefit_id: i64,
}

fn seed_registry(conn: &mut Connection) -> Seed {
    let (unit_id, second_unit_id, gender_id, nationality_id, workshop_id, benefit_id) = {
        let catalogs = SqliteCatalogRepository::try_new(conn).unwrap();
        let sector = catalogs.create_macro_sector("Norte").unwrap();
        let unit = catalogs
            .create_neighborhood_unit("Villa Los Aromos", sector.id)
            .unwrap();
        let second_unit = catalogs
            .create_neighborhood_unit("Barrio Estación", sector.id)
            .unwrap();
        let gender = catalogs.create_gender("Femenino").unwrap();
        let nationality = catalogs.create_nationality("Chilena").unwrap();
        let workshop = catalogs.create_workshop("Tejido").unwrap();
        let benefit = catalogs.create_benefit("BON-2024", "Bono invierno").unwrap();
        (
            unit.id,
            second_unit.id,
            gender.id,
            nationality.id,
            workshop.id,
            benefit.id,
        )
    };

    let person_id = SqlitePersonRepository::try_new(conn)
        .unwrap()
        .create_person(&PersonDraft {
            national_id: "1234567-9".to_string(),
            given_name: "María".to_string(),
            middle_name: None,
            last_name: "González".to_string(),
            second_last_name: None,
            gender_id,
            nationality_id,
            birth_date: NaiveDate::from_ymd_opt(1948, 6, 12).unwrap(),
            address: "Pasaje Los Olmos 124".to_string(),
            email: None,
            neighborhood_unit_id: unit_id,
        })
        .unwrap();

    Seed {
        unit_id,
        second_unit_id,
        person_id,
        workshop_id,
        benefit_id,
    }
}

fn activity_draft(unit_id: i64, start: NaiveDate) -> ActivityDraft {
    ActivityDraft {
        name: "Gimnasia entretenida".to_string(),
        neighborhood_unit_id: unit_id,
        start_date: start,
        end_date: None,
        description: None,
    }
}

#[test]
fn activity_end_date_must_not_precede_start() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

    let mut draft = activity_draft(seed.unit_id, start);
    draft.end_date = NaiveDate::from_ymd_opt(2025, 1, 5);
    let err = events.create_activity(&draft).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidDateRange {
            start_field: "start_date",
            end_field: "end_date"
        })
    ));
    assert!(events
        .list_activities(&ActivityListQuery::default())
        .unwrap()
        .is_empty());

    // A same-day range is a valid single-day event.
    draft.end_date = Some(start);
    events.create_activity(&draft).unwrap();
}

#[test]
fn activity_identity_is_name_start_and_unit() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

    events
        .create_activity(&activity_draft(seed.unit_id, start))
        .unwrap();
    let err = events
        .create_activity(&activity_draft(seed.unit_id, start))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "activities(name, start_date, neighborhood_unit_id)"
        }
    ));

    // Any differing key component makes it a distinct activity.
    events
        .create_activity(&activity_draft(seed.second_unit_id, start))
        .unwrap();
    events
        .create_activity(&activity_draft(
            seed.unit_id,
            NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        ))
        .unwrap();
}

#[test]
fn trip_dates_and_identity_follow_the_same_rules() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    let departure = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();

    let mut draft = TripDraft {
        name: "Paseo a la costa".to_string(),
        destination: "Valparaíso".to_string(),
        departure_date: departure,
        return_date: NaiveDate::from_ymd_opt(2025, 3, 18),
        neighborhood_unit_id: seed.unit_id,
    };
    let err = events.create_trip(&draft).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidDateRange {
            start_field: "departure_date",
            end_field: "return_date"
        })
    ));

    draft.return_date = NaiveDate::from_ymd_opt(2025, 3, 21);
    events.create_trip(&draft).unwrap();

    let err = events.create_trip(&draft).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "trips(name, departure_date, neighborhood_unit_id)"
        }
    ));

    let listed = events.list_trips(&TripListQuery::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].destination, "Valparaíso");
}

#[test]
fn one_logical_attendance_per_person_and_target() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    enrollment
        .record_attendance(
            AttendanceKind::Workshop,
            seed.person_id,
            seed.workshop_id,
            Some(1_700_000_000_000),
        )
        .unwrap();

    // A later timestamp does not create a second logical attendance.
    let err = enrollment
        .record_attendance(
            AttendanceKind::Workshop,
            seed.person_id,
            seed.workshop_id,
            Some(1_700_000_999_000),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "workshop_attendance(person_id, workshop_id)"
        }
    ));

    let history = enrollment
        .attendance_for_person(AttendanceKind::Workshop, seed.person_id)
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].attended_at, 1_700_000_000_000);

    let roster = enrollment
        .attendance_for_target(AttendanceKind::Workshop, seed.workshop_id)
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].person_id, seed.person_id);
}

#[test]
fn attendance_requires_existing_person_and_target() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    let err = enrollment
        .record_attendance(AttendanceKind::Activity, seed.person_id, 9999, None)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DanglingReference {
            entity: "activity_attendance"
        }
    ));

    let err = enrollment
        .record_attendance(AttendanceKind::Workshop, 9999, seed.workshop_id, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::DanglingReference { .. }));
}

#[test]
fn deleting_events_takes_their_attendance_along() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let activity_id = {
        let events = SqliteEventRepository::try_new(&conn).unwrap();
        events
            .create_activity(&activity_draft(
                seed.unit_id,
                NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            ))
            .unwrap()
    };

    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    enrollment
        .record_attendance(AttendanceKind::Activity, seed.person_id, activity_id, None)
        .unwrap();
    enrollment
        .record_attendance(AttendanceKind::Workshop, seed.person_id, seed.workshop_id, None)
        .unwrap();

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    events.delete_activity(activity_id).unwrap();
    assert!(enrollment
        .attendance_for_target(AttendanceKind::Activity, activity_id)
        .unwrap()
        .is_empty());

    // Workshops are catalog rows, but their attendance history is the one
    // dependency that follows them out.
    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    catalogs.delete_workshop(seed.workshop_id).unwrap();
    assert!(enrollment
        .attendance_for_target(AttendanceKind::Workshop, seed.workshop_id)
        .unwrap()
        .is_empty());
}

#[test]
fn assigned_benefit_blocks_catalog_delete_until_revoked() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    let assignment = enrollment
        .assign_benefit(
            seed.person_id,
            seed.benefit_id,
            NaiveDate::from_ymd_opt(2024, 11, 5),
        )
        .unwrap();
    assert_eq!(
        assignment.assigned_on,
        NaiveDate::from_ymd_opt(2024, 11, 5).unwrap()
    );

    let err = enrollment
        .assign_benefit(seed.person_id, seed.benefit_id, None)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "person_benefits(person_id, benefit_id)"
        }
    ));

    let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
    let err = catalogs.delete_benefit(seed.benefit_id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::ReferentialBlock {
            entity: "benefits",
            ..
        }
    ));

    enrollment
        .revoke_benefit(seed.person_id, seed.benefit_id)
        .unwrap();
    catalogs.delete_benefit(seed.benefit_id).unwrap();
}

#[test]
fn activity_listing_filters_by_window_and_unit() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    events
        .create_activity(&activity_draft(
            seed.unit_id,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        ))
        .unwrap();
    events
        .create_activity(&activity_draft(
            seed.unit_id,
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        ))
        .unwrap();
    events
        .create_activity(&activity_draft(
            seed.second_unit_id,
            NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        ))
        .unwrap();

    // Newest first within the window, constrained to one unit.
    let listed = events
        .list_activities(&ActivityListQuery {
            neighborhood_unit_id: Some(seed.unit_id),
            starts_from: NaiveDate::from_ymd_opt(2025, 1, 1),
            starts_until: NaiveDate::from_ymd_opt(2025, 12, 31),
            ..ActivityListQuery::default()
        })
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].start_date > listed[1].start_date);

    let march_on = events
        .list_activities(&ActivityListQuery {
            starts_from: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..ActivityListQuery::default()
        })
        .unwrap();
    assert_eq!(march_on.len(), 2);
}

#[test]
fn duplicate_insert_from_second_connection_loses_at_the_storage_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("comunidad.db");

    let mut writer_a = comunidad_core::db::open_db(&path).unwrap();
    let seed = seed_registry(&mut writer_a);
    let writer_b = comunidad_core::db::open_db(&path).unwrap();

    let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
    let events_a = SqliteEventRepository::try_new(&writer_a).unwrap();
    let events_b = SqliteEventRepository::try_new(&writer_b).unwrap();

    // The uniqueness scope lives in the durable schema, so whichever writer
    // lands second loses no matter which connection it came through.
    events_a
        .create_activity(&activity_draft(seed.unit_id, start))
        .unwrap();
    let err = events_b
        .create_activity(&activity_draft(seed.unit_id, start))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey { .. }));
}

#[test]
fn program_service_schedules_and_records_attendance() {
    let mut conn = open_db_in_memory().unwrap();
    let seed = seed_registry(&mut conn);

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    let service = ProgramService::new(events, enrollment);

    let activity = service
        .schedule_activity(&activity_draft(
            seed.unit_id,
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        ))
        .unwrap();
    assert_eq!(activity.name, "Gimnasia entretenida");

    let record = service
        .record_attendance(AttendanceKind::Activity, seed.person_id, activity.id)
        .unwrap();
    assert!(record.attended_at > 0);

    let roster = service
        .attendance_for_target(AttendanceKind::Activity, activity.id)
        .unwrap();
    assert_eq!(roster.len(), 1);

    service.cancel_activity(activity.id).unwrap();
    assert!(service
        .attendance_for_target(AttendanceKind::Activity, activity.id)
        .unwrap()
        .is_empty());
}
