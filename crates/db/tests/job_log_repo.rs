use photo_core::job::{generate_job_id, JobType};
use photo_db::models::job_log::{JobLogFilter, JobLogUpdate, NewJobLog};
use photo_db::models::status::JobStatus;
use photo_db::repositories::JobLogRepo;
use sqlx::PgPool;

fn upload_job(job_id: &str) -> NewJobLog {
    NewJobLog {
        job_id: job_id.to_string(),
        job_type: JobType::Upload,
        filename: Some("abc.jpg".into()),
        s3_bucket: Some("photos-raw".into()),
        s3_key: Some("2024/01/01/abc.jpg".into()),
        source_url: None,
        content_type: Some("image/jpeg".into()),
        content_length: Some(2048),
        job_metadata: Some(r#"{"album":"holiday"}"#.into()),
        workflow_task_queue: "image-tasks".into(),
        status: JobStatus::Submitted,
        started_at: Some(chrono::Utc::now()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bootstrap_seeds_job_statuses(pool: PgPool) {
    photo_db::health_check(&pool).await.unwrap();

    let rows: Vec<(i16, String)> = sqlx::query_as("SELECT id, name FROM job_statuses ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();

    let expected: Vec<(i16, String)> = JobStatus::ALL
        .into_iter()
        .map(|s| (s.id(), s.name().to_string()))
        .collect();
    assert_eq!(rows, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_find(pool: PgPool) {
    let job_id = generate_job_id();
    let created = JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap();

    assert_eq!(created.job_id, job_id);
    assert_eq!(created.workflow_id, job_id);
    assert_eq!(created.job_type, "upload");
    assert_eq!(created.status(), JobStatus::Submitted);
    assert_eq!(created.content_type.as_deref(), Some("image/jpeg"));
    assert!(created.started_at.is_some());
    assert!(created.completed_at.is_none());

    let found = JobLogRepo::find_by_job_id(&pool, &job_id).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);

    let missing = JobLogRepo::find_by_job_id(&pool, "img-missing").await.unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_job_id_violates_unique_constraint(pool: PgPool) {
    let job_id = generate_job_id();
    JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap();

    let err = JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap_err();
    let db_err = err.as_database_error().expect("expected a database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_job_logs_job_id"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_sets_fields_and_keeps_unset_ones(pool: PgPool) {
    let job_id = generate_job_id();
    JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap();

    let updated = JobLogRepo::update(
        &pool,
        &job_id,
        &JobLogUpdate::status(JobStatus::Unknown).with_error("execution not found"),
    )
    .await
    .unwrap();
    assert!(updated);

    let updated = JobLogRepo::update(&pool, &job_id, &JobLogUpdate::status(JobStatus::Running))
        .await
        .unwrap();
    assert!(updated);

    let row = JobLogRepo::find_by_job_id(&pool, &job_id).await.unwrap().unwrap();
    assert_eq!(row.status(), JobStatus::Running);
    assert_eq!(row.error_message.as_deref(), Some("execution not found"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_terminal_rows_are_not_overwritten(pool: PgPool) {
    let job_id = generate_job_id();
    JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap();

    let result = serde_json::json!({ "thumbnails": 3 });
    let done = JobLogUpdate::status(JobStatus::Completed)
        .with_result(result.clone())
        .completed_at(chrono::Utc::now());
    assert!(JobLogRepo::update(&pool, &job_id, &done).await.unwrap());

    let downgrade = JobLogUpdate::status(JobStatus::Unknown).with_error("gone");
    assert!(!JobLogRepo::update(&pool, &job_id, &downgrade).await.unwrap());

    let row = JobLogRepo::find_by_job_id(&pool, &job_id).await.unwrap().unwrap();
    assert_eq!(row.status(), JobStatus::Completed);
    assert_eq!(row.result, Some(result));
    assert!(row.completed_at.is_some());
    assert!(row.error_message.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_row_returns_false(pool: PgPool) {
    let updated = JobLogRepo::update(&pool, "img-missing", &JobLogUpdate::status(JobStatus::Started))
        .await
        .unwrap();
    assert!(!updated);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_pages(pool: PgPool) {
    let mut ids = Vec::new();
    for _ in 0..3 {
        let job_id = generate_job_id();
        JobLogRepo::create(&pool, &upload_job(&job_id)).await.unwrap();
        ids.push(job_id);
    }
    JobLogRepo::update(&pool, &ids[0], &JobLogUpdate::status(JobStatus::Started))
        .await
        .unwrap();

    let all = JobLogRepo::list(&pool, &JobLogFilter::default()).await.unwrap();
    assert_eq!(all.len(), 3);

    let started = JobLogRepo::list(
        &pool,
        &JobLogFilter {
            status: Some(JobStatus::Started),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].job_id, ids[0]);

    let urls = JobLogRepo::list(
        &pool,
        &JobLogFilter {
            job_type: Some(JobType::Url),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(urls.is_empty());

    let page = JobLogRepo::list(
        &pool,
        &JobLogFilter {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_count_ignores_paging(pool: PgPool) {
    for _ in 0..4 {
        JobLogRepo::create(&pool, &upload_job(&generate_job_id())).await.unwrap();
    }

    let filter = JobLogFilter {
        limit: Some(1),
        offset: Some(3),
        ..Default::default()
    };
    assert_eq!(JobLogRepo::count(&pool, &filter).await.unwrap(), 4);

    let failed = JobLogFilter {
        status: Some(JobStatus::Failed),
        ..Default::default()
    };
    assert_eq!(JobLogRepo::count(&pool, &failed).await.unwrap(), 0);
}
