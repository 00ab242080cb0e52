//! Loan slip list, create, update and delete over HTTP

use std::sync::Arc;

use chrono::NaiveDate;
use loan_desk::{
    models::{ImageUpload, LoanSlipQuery, LoanStatus, Role},
    schemas::{CreateLoanSlipForm, UpdateLoanSlipForm},
    services::LoanSlipApi,
    state::{LoadOutcome, LoanSlipBoard, QueryController, QueryPatch},
    AppError, ErrorCode,
};

use crate::support::{spawn, Backend};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_list_pages_through_fifteen_records() {
    let backend = spawn(Backend::seeded(15, 0)).await;
    let services = backend.signed_in("admin").await;

    let first = services.loan_slips.list(&LoanSlipQuery::default()).await.unwrap();
    assert_eq!(first.total, 15);
    assert_eq!(first.items.len(), 10);

    let second = services
        .loan_slips
        .list(&LoanSlipQuery::default().with_page(2))
        .await
        .unwrap();
    assert_eq!(second.total, 15);
    assert_eq!(second.items.len(), 5);

    let mut ids: Vec<i64> = first.items.iter().chain(&second.items).map(|s| s.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids, (1..=15).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_board_follows_controller_filters() {
    let backend = spawn(Backend::seeded(15, 0)).await;
    let services = backend.signed_in("admin").await;

    let controller = QueryController::new(LoanSlipQuery::default());
    let board = LoanSlipBoard::linked(Arc::clone(&services.loan_slips), &controller);

    controller.patch(QueryPatch::new().status(Some(LoanStatus::Returned)));
    assert_eq!(board.load(controller.current()).await.unwrap(), LoadOutcome::Applied);

    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.total, 3);
    assert!(snapshot.items.iter().all(|s| s.status == LoanStatus::Returned));

    controller.reset();
    controller.patch(QueryPatch::new().search(Some("dell 07".to_string())));
    board.load(controller.current()).await.unwrap();
    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.items[0].id, 7);
}

#[tokio::test]
async fn test_create_returns_borrowing_record() {
    let backend = spawn(Backend::seeded(3, 0)).await;
    let services = backend.signed_in("itstaff").await;
    let board = LoanSlipBoard::new(Arc::clone(&services.loan_slips));

    let mut form = CreateLoanSlipForm::new("Dell Latitude 5420", "Tran Van B", date(2024, 1, 1), date(2024, 1, 5));
    form.department = Some("IT".to_string());
    form.images = vec![ImageUpload::new("front.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])];

    let outcome = board.create(form).await.unwrap();
    assert_eq!(outcome.created.status, LoanStatus::Borrowing);
    assert_eq!(outcome.created.borrowed_date, Some(date(2024, 1, 1)));
    assert_eq!(outcome.created.returned_date, Some(date(2024, 1, 5)));
    assert_eq!(outcome.created.images, vec!["/uploads/front.png".to_string()]);
    assert!(outcome.refreshed);

    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.total, 4);
    assert_eq!(snapshot.query.map(|q| q.page), Some(1));

    let fields = backend.state.lock().unwrap().last_form_fields.clone();
    assert_eq!(
        fields,
        vec![
            "name",
            "borrower_name",
            "borrowed_date",
            "returned_date",
            "department",
            "position",
            "description",
            "serial_number",
            "images"
        ]
    );
}

#[tokio::test]
async fn test_admin_update_changes_only_status_and_dates() {
    let backend = spawn(Backend::seeded(3, 0)).await;
    let services = backend.signed_in("admin").await;
    let board = LoanSlipBoard::new(Arc::clone(&services.loan_slips));
    board.load(LoanSlipQuery::default()).await.unwrap();

    let before = backend.slip(1).unwrap();
    let mut form = UpdateLoanSlipForm::from_slip(&before);
    form.name = Some("Renamed by admin".to_string());
    form.description = Some("Changed description".to_string());
    form.status = Some(LoanStatus::Returned);
    form.returned_date = date(2024, 1, 9);

    let updated = board.update(1, form, &Role::Admin).await.unwrap();
    assert_eq!(updated.status, LoanStatus::Returned);
    assert_eq!(updated.returned_date, Some(date(2024, 1, 9)));
    assert_eq!(updated.name, before.name);
    assert_eq!(updated.description, before.description);
    assert_eq!(updated.serial_number, before.serial_number);

    let fields = backend.state.lock().unwrap().last_form_fields.clone();
    assert_eq!(fields, vec!["status", "borrowed_date", "returned_date"]);

    // Now returned, so the board refuses further edits locally
    let form = UpdateLoanSlipForm::from_slip(&updated);
    assert!(matches!(
        board.update(1, form, &Role::It).await,
        Err(AppError::NotEditable { id: 1, .. })
    ));
}

#[tokio::test]
async fn test_it_update_replaces_images() {
    let backend = spawn(Backend::seeded(2, 0)).await;
    let services = backend.signed_in("itstaff").await;
    let board = LoanSlipBoard::new(Arc::clone(&services.loan_slips));
    board.load(LoanSlipQuery::default()).await.unwrap();

    let mut form = UpdateLoanSlipForm::from_slip(&backend.slip(1).unwrap());
    form.name = Some("Dell Latitude 7440".to_string());
    form.existing_images = vec!["/uploads/old.png".to_string()];
    form.new_images = vec![ImageUpload::new("new.webp", "image/webp", vec![1, 2, 3])];

    let updated = board.update(1, form, &Role::It).await.unwrap();
    assert_eq!(updated.name, "Dell Latitude 7440");
    assert_eq!(updated.images, vec!["/uploads/old.png", "/uploads/new.webp"]);
    assert_eq!(board.snapshot().await.items[0].name, "Dell Latitude 7440");
}

#[tokio::test]
async fn test_get_missing_record_is_absent() {
    let backend = spawn(Backend::seeded(2, 0)).await;
    let services = backend.signed_in("admin").await;

    assert!(services.loan_slips.get(1).await.unwrap().is_some());
    assert_eq!(services.loan_slips.get(404).await.unwrap(), None);
}

#[tokio::test]
async fn test_delete_removes_record() {
    let backend = spawn(Backend::seeded(5, 0)).await;
    let services = backend.signed_in("itstaff").await;
    let board = LoanSlipBoard::new(Arc::clone(&services.loan_slips));
    board.load(LoanSlipQuery::default()).await.unwrap();

    // Record 5 is returned
    assert!(matches!(board.delete(5).await, Err(AppError::NotDeletable { id: 5, .. })));
    assert!(backend.slip(5).is_some());

    board.delete(2).await.unwrap();
    assert!(backend.slip(2).is_none());
    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.total, 4);
    assert!(snapshot.items.iter().all(|s| s.id != 2));
}

#[tokio::test]
async fn test_missing_token_is_normalized() {
    let backend = spawn(Backend::seeded(1, 0)).await;
    let (services, _) = backend.client();

    let err = services.loan_slips.list(&LoanSlipQuery::default()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(err.http_status, 401);
    assert_eq!(err.user_message(), "You must sign in to continue");
}
