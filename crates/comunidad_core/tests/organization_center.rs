use chrono::NaiveDate;
use comunidad_core::db::open_db_in_memory;
use comunidad_core::model::validate::ValidationError;
use comunidad_core::{
    CatalogRepository, CenterDraft, CenterRepository, EnrollmentRepository, OrganizationDraft,
    OrganizationListQuery, OrganizationRepository, PersonDraft, PersonRepository, PhoneNumber,
    RepoError, SqliteCatalogRepository, SqliteCenterRepository, SqliteEnrollmentRepository,
    SqliteOrganizationRepository, SqlitePersonRepository,
};
use rusqlite::Connection;

fn seed_unit(conn: &Connection) -> i64 {
    let catalogs = SqliteCatalogRepository::try_new(conn).unwrap();
    let sector = catalogs.create_macro_sector("Norte").unwrap();
    catalogs
        .create_neighborhood_unit("Villa Los Aromos", sector.id)
        .unwrap()
        .id
}

fn organization_draft(unit_id: i64, name: &str) -> OrganizationDraft {
    OrganizationDraft {
        name: name.to_string(),
        address: "Calle Principal 45".to_string(),
        neighborhood_unit_id: unit_id,
        founding_date: NaiveDate::from_ymd_opt(1998, 3, 15).unwrap(),
        legal_status: "Vigente".to_string(),
        email: None,
    }
}

#[test]
fn organization_create_update_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let repo = SqliteOrganizationRepository::try_new(&mut conn).unwrap();
    let id = repo
        .create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap();

    let mut stored = repo.get_organization(id).unwrap().unwrap();
    assert_eq!(stored.name, "Club Los Aromos");

    stored.legal_status = "En trámite".to_string();
    stored.email = Some("contacto@losaromos.cl".to_string());
    repo.update_organization(&stored).unwrap();

    let reloaded = repo.get_organization(id).unwrap().unwrap();
    assert_eq!(reloaded.legal_status, "En trámite");
    assert_eq!(reloaded.email.as_deref(), Some("contacto@losaromos.cl"));
}

#[test]
fn organization_email_and_name_constraints() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let repo = SqliteOrganizationRepository::try_new(&mut conn).unwrap();

    let mut draft = organization_draft(unit_id, "Club Los Aromos");
    draft.email = Some("contacto@club".to_string());
    let err = repo.create_organization(&draft).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidFormat { field: "email", .. })
    ));

    repo.create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap();
    let err = repo
        .create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "organizations.name"
        }
    ));
}

#[test]
fn organization_phones_are_unique_per_type() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let mut repo = SqliteOrganizationRepository::try_new(&mut conn).unwrap();
    let id = repo
        .create_organization_with_phones(
            &organization_draft(unit_id, "Club Los Aromos"),
            &[PhoneNumber::principal("221234567")],
        )
        .unwrap();

    let err = repo
        .add_phone(id, &PhoneNumber::principal("229999999"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey { .. }));

    repo.add_phone(id, &PhoneNumber::with_kind("secretaría", "229999999"))
        .unwrap();
    assert_eq!(repo.list_phones(id).unwrap().len(), 2);

    repo.remove_phone(id, "secretaría").unwrap();
    assert_eq!(repo.list_phones(id).unwrap().len(), 1);
}

#[test]
fn organization_list_filters_by_name_and_founding_window() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let repo = SqliteOrganizationRepository::try_new(&mut conn).unwrap();
    repo.create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap();

    let mut newer = organization_draft(unit_id, "Junta Vecinal Norte");
    newer.founding_date = NaiveDate::from_ymd_opt(2015, 8, 1).unwrap();
    repo.create_organization(&newer).unwrap();

    let by_name = repo
        .list_organizations(&OrganizationListQuery {
            name: Some("Aromos".to_string()),
            ..OrganizationListQuery::default()
        })
        .unwrap();
    assert_eq!(by_name.len(), 1);

    let founded_since_2000 = repo
        .list_organizations(&OrganizationListQuery {
            founded_from: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..OrganizationListQuery::default()
        })
        .unwrap();
    assert_eq!(founded_since_2000.len(), 1);
    assert_eq!(founded_since_2000[0].name, "Junta Vecinal Norte");
}

#[test]
fn deleting_organization_cascades_phones_memberships_and_requests() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let center_id = {
        let centers = SqliteCenterRepository::try_new(&conn).unwrap();
        centers
            .create_center(&CenterDraft {
                name: "Centro Comunitario Norte".to_string(),
                address: "Avenida Central 1000".to_string(),
                neighborhood_unit_id: unit_id,
            })
            .unwrap()
    };

    let person_id = {
        let catalogs = SqliteCatalogRepository::try_new(&conn).unwrap();
        let gender = catalogs.create_gender("Masculino").unwrap();
        let nationality = catalogs.create_nationality("Chilena").unwrap();
        SqlitePersonRepository::try_new(&mut conn)
            .unwrap()
            .create_person(&PersonDraft {
                national_id: "1234567-9".to_string(),
                given_name: "Pedro".to_string(),
                middle_name: None,
                last_name: "Soto".to_string(),
                second_last_name: None,
                gender_id: gender.id,
                nationality_id: nationality.id,
                birth_date: NaiveDate::from_ymd_opt(1950, 1, 30).unwrap(),
                address: "Pasaje Uno 2".to_string(),
                email: None,
                neighborhood_unit_id: unit_id,
            })
            .unwrap()
    };

    let org_id = {
        let mut orgs = SqliteOrganizationRepository::try_new(&mut conn).unwrap();
        orgs.create_organization_with_phones(
            &organization_draft(unit_id, "Club Los Aromos"),
            &[PhoneNumber::principal("221234567")],
        )
        .unwrap()
    };

    {
        let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
        enrollment.join_organization(person_id, org_id).unwrap();

        let centers = SqliteCenterRepository::try_new(&conn).unwrap();
        centers
            .file_center_request(
                org_id,
                center_id,
                NaiveDate::from_ymd_opt(2024, 5, 10),
            )
            .unwrap();
    }

    SqliteOrganizationRepository::try_new(&mut conn)
        .unwrap()
        .delete_organization(org_id)
        .unwrap();

    let enrollment = SqliteEnrollmentRepository::try_new(&conn).unwrap();
    assert!(enrollment
        .members_of_organization(org_id)
        .unwrap()
        .is_empty());

    let centers = SqliteCenterRepository::try_new(&conn).unwrap();
    assert!(centers.requests_for_center(center_id).unwrap().is_empty());

    let orgs = SqliteOrganizationRepository::try_new(&mut conn).unwrap();
    assert!(orgs.list_phones(org_id).unwrap().is_empty());
    assert!(orgs.get_organization(org_id).unwrap().is_none());
}

#[test]
fn request_history_accumulates_across_dates_but_not_within_one() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let org_id = SqliteOrganizationRepository::try_new(&mut conn)
        .unwrap()
        .create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap();

    let centers = SqliteCenterRepository::try_new(&conn).unwrap();
    let center_id = centers
        .create_center(&CenterDraft {
            name: "Centro Comunitario Norte".to_string(),
            address: "Avenida Central 1000".to_string(),
            neighborhood_unit_id: unit_id,
        })
        .unwrap();

    centers
        .file_center_request(org_id, center_id, NaiveDate::from_ymd_opt(2024, 5, 10))
        .unwrap();
    centers
        .file_center_request(org_id, center_id, NaiveDate::from_ymd_opt(2024, 6, 2))
        .unwrap();

    let err = centers
        .file_center_request(org_id, center_id, NaiveDate::from_ymd_opt(2024, 6, 2))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey {
            scope: "center_requests(organization_id, center_id, requested_on)"
        }
    ));

    let history = centers.requests_for_pair(org_id, center_id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].requested_on < history[1].requested_on);

    // A request for a nonexistent pair member never lands.
    let err = centers
        .file_center_request(org_id, 9999, None)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DanglingReference {
            entity: "center_requests"
        }
    ));
}

#[test]
fn maintenance_log_is_unique_per_center_service_and_date() {
    let conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let centers = SqliteCenterRepository::try_new(&conn).unwrap();
    let center_id = centers
        .create_center(&CenterDraft {
            name: "Centro Comunitario Norte".to_string(),
            address: "Avenida Central 1000".to_string(),
            neighborhood_unit_id: unit_id,
        })
        .unwrap();

    let serviced_on = NaiveDate::from_ymd_opt(2024, 4, 18).unwrap();
    centers
        .log_maintenance(center_id, "Gasfitería", serviced_on, Some("Cambio de llaves"))
        .unwrap();
    let err = centers
        .log_maintenance(center_id, "Gasfitería", serviced_on, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey { .. }));

    // Same service on a later date is a new log entry.
    centers
        .log_maintenance(
            center_id,
            "Gasfitería",
            NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
            None,
        )
        .unwrap();
    let log = centers.maintenance_for_center(center_id).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].serviced_on > log[1].serviced_on);
}

#[test]
fn deleting_center_cascades_maintenance_and_requests() {
    let mut conn = open_db_in_memory().unwrap();
    let unit_id = seed_unit(&conn);

    let org_id = SqliteOrganizationRepository::try_new(&mut conn)
        .unwrap()
        .create_organization(&organization_draft(unit_id, "Club Los Aromos"))
        .unwrap();

    let centers = SqliteCenterRepository::try_new(&conn).unwrap();
    let center_id = centers
        .create_center(&CenterDraft {
            name: "Centro Comunitario Norte".to_string(),
            address: "Avenida Central 1000".to_string(),
            neighborhood_unit_id: unit_id,
        })
        .unwrap();

    centers
        .log_maintenance(
            center_id,
            "Electricidad",
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            None,
        )
        .unwrap();
    centers
        .file_center_request(org_id, center_id, NaiveDate::from_ymd_opt(2024, 5, 10))
        .unwrap();

    centers.delete_center(center_id).unwrap();

    assert!(centers.get_center(center_id).unwrap().is_none());
    assert!(centers
        .maintenance_for_center(center_id)
        .unwrap()
        .is_empty());
    assert!(centers.requests_for_center(center_id).unwrap().is_empty());
}
