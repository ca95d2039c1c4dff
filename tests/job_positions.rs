use serde_json::json;
use staffing_catalog::curation::DemandCuration;
use staffing_catalog::models::{Client, JobPosition, JobPositionPatch, NewClient, NewJobPosition};
use staffing_catalog::service::{CatalogService, ServiceError};
use staffing_catalog::store::{Filter, MemoryStore, Window};

fn service() -> CatalogService<MemoryStore> {
    CatalogService::new(MemoryStore::new())
}

async fn client(service: &CatalogService<MemoryStore>, name: &str, high_growth: bool) -> Client {
    service
        .create::<Client>(NewClient {
            name: name.to_string(),
            high_growth,
        })
        .await
        .unwrap()
}

fn position(client_id: i32, exclusivity: &str) -> NewJobPosition {
    serde_json::from_value(json!({
        "name": "Backend Engineer",
        "bill_rate": 95.0,
        "region": "EMEA",
        "skills": ["rust", "postgres"],
        "exclusivity": exclusivity,
        "client_id": client_id,
    }))
    .unwrap()
}

#[tokio::test]
async fn high_growth_committed_is_strategic() {
    let service = service();
    let acme = client(&service, "Acme", true).await;

    let created = service
        .create_job_position(position(acme.id, "committed"))
        .await
        .unwrap();

    assert_eq!(created.demand_curation, DemandCuration::Strategic);
    assert!(created.audit.active);

    let updated = service
        .update_job_position(
            created.id,
            JobPositionPatch {
                bill_rate: Some(120.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.bill_rate, 120.0);
    assert_eq!(updated.demand_curation, DemandCuration::Strategic);
}

#[tokio::test]
async fn each_combination_is_classified() {
    let service = service();
    let growing = client(&service, "Growing", true).await;
    let steady = client(&service, "Steady", false).await;

    let cases = [
        (steady.id, "committed", DemandCuration::Committed),
        (steady.id, "non_committed", DemandCuration::Open),
        (growing.id, "non-committed", DemandCuration::Open),
    ];
    for (client_id, exclusivity, expected) in cases {
        let created = service
            .create_job_position(position(client_id, exclusivity))
            .await
            .unwrap();
        assert_eq!(created.demand_curation, expected, "{exclusivity}");
    }
}

#[tokio::test]
async fn exclusivity_alone_never_recomputes() {
    let service = service();
    let steady = client(&service, "Steady", false).await;
    let created = service
        .create_job_position(position(steady.id, "committed"))
        .await
        .unwrap();
    assert_eq!(created.demand_curation, DemandCuration::Committed);

    let updated = service
        .update_job_position(
            created.id,
            JobPositionPatch {
                exclusivity: Some("non_committed".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.exclusivity.as_str(), "non_committed");
    assert_eq!(updated.demand_curation, DemandCuration::Committed);
}

#[tokio::test]
async fn client_alone_never_recomputes() {
    let service = service();
    let steady = client(&service, "Steady", false).await;
    let growing = client(&service, "Growing", true).await;
    let created = service
        .create_job_position(position(steady.id, "committed"))
        .await
        .unwrap();
    assert_eq!(created.demand_curation, DemandCuration::Committed);

    let moved = service
        .update_job_position(
            created.id,
            JobPositionPatch {
                client_id: Some(growing.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.client_id, growing.id);
    assert_eq!(moved.demand_curation, DemandCuration::Committed);

    let stored = service.get::<JobPosition>(created.id).await.unwrap();
    assert_eq!(stored.demand_curation, DemandCuration::Committed);
}

#[tokio::test]
async fn moving_to_a_high_growth_client_recomputes() {
    let service = service();
    let steady = client(&service, "Steady", false).await;
    let growing = client(&service, "Growing", true).await;
    let created = service
        .create_job_position(position(steady.id, "committed"))
        .await
        .unwrap();

    let updated = service
        .update_job_position(
            created.id,
            JobPositionPatch {
                client_id: Some(growing.id),
                exclusivity: Some("committed".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.client_id, growing.id);
    assert_eq!(updated.demand_curation, DemandCuration::Strategic);
}

#[tokio::test]
async fn missing_client_writes_nothing() {
    let service = service();

    let err = service
        .create_job_position(position(42, "committed"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { entity: "client", id: 42 }));
    let rows = service
        .list::<JobPosition>(&Filter::everything(), Window::all())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn update_to_missing_client_keeps_the_row() {
    let service = service();
    let steady = client(&service, "Steady", false).await;
    let created = service
        .create_job_position(position(steady.id, "committed"))
        .await
        .unwrap();

    let err = service
        .update_job_position(
            created.id,
            JobPositionPatch {
                client_id: Some(99),
                exclusivity: Some("committed".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "client", .. }));

    let stored = service.get::<JobPosition>(created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn unknown_position_update_is_not_found() {
    let service = service();

    let err = service
        .update_job_position(
            7,
            JobPositionPatch {
                name: Some("Platform Engineer".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { entity: "job position", id: 7 }));
}
