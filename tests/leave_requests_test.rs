mod common;

use anyhow::Result;
use common::{balance, hire, leave_type, parse_date, request, test_service};
use leavebook::application::{AppError, ErrorKind, NewLeaveRequest};
use leavebook::domain::{LeaveCategory, LeaveStatus};
use uuid::Uuid;

#[tokio::test]
async fn test_approve_then_accrue_deducts_quota_twice() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 5).await?;

    let req = request(&service, &ada, &annual, "2024-01-01", "2024-01-03").await?;
    assert_eq!(req.status, LeaveStatus::Pending);
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 20);

    service.approve_leave_request(req.id).await?;
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 15);
    assert_eq!(
        service.get_leave_request(req.id).await?.status,
        LeaveStatus::Approved
    );

    service.accrue_leave(req.id).await?;
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 10);
    assert_eq!(
        service.get_leave_request(req.id).await?.status,
        LeaveStatus::Accrued
    );

    // Other categories are untouched
    assert_eq!(balance(&service, &ada, LeaveCategory::Sick).await?, 20);

    Ok(())
}

#[tokio::test]
async fn test_second_approval_fails_without_deducting() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let sick = leave_type(&service, LeaveCategory::Sick, 3).await?;
    let req = request(&service, &ada, &sick, "2024-02-01", "2024-02-02").await?;

    service.approve_leave_request(req.id).await?;
    let err = service.approve_leave_request(req.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyApproved(_)));
    assert_eq!(err.kind(), ErrorKind::Error);

    assert_eq!(balance(&service, &ada, LeaveCategory::Sick).await?, 17);

    Ok(())
}

#[tokio::test]
async fn test_accrue_requires_approval_and_runs_once() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 4).await?;
    let req = request(&service, &ada, &annual, "2024-02-01", "2024-02-02").await?;

    let err = service.accrue_leave(req.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotApproved(_)));
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 20);

    service.approve_leave_request(req.id).await?;
    service.accrue_leave(req.id).await?;

    let err = service.accrue_leave(req.id).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyAccrued(_)));
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 12);

    // An accrued request cannot go back to approved
    let err = service.approve_leave_request(req.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Error);

    Ok(())
}

#[tokio::test]
async fn test_accrue_can_overdraw_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let maternity = leave_type(&service, LeaveCategory::Maternity, 15).await?;
    let req = request(&service, &ada, &maternity, "2024-06-01", "2024-06-30").await?;

    service.approve_leave_request(req.id).await?;
    service.accrue_leave(req.id).await?;

    assert_eq!(balance(&service, &ada, LeaveCategory::Maternity).await?, -10);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_balance_on_create() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let unpaid = leave_type(&service, LeaveCategory::Unpaid, 8).await?;

    let first = request(&service, &ada, &unpaid, "2024-01-01", "2024-01-02").await?;
    service.approve_leave_request(first.id).await?;
    let second = request(&service, &ada, &unpaid, "2024-02-01", "2024-02-02").await?;
    service.approve_leave_request(second.id).await?;
    assert_eq!(balance(&service, &ada, LeaveCategory::Unpaid).await?, 4);

    let err = request(&service, &ada, &unpaid, "2024-03-01", "2024-03-02")
        .await
        .unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(
        err,
        AppError::InsufficientBalance {
            category: LeaveCategory::Unpaid,
            balance: 4,
            required: 8,
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Error);

    assert_eq!(balance(&service, &ada, LeaveCategory::Unpaid).await?, 4);
    assert_eq!(service.get_employee_leave_requests(ada.id).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_approval_rechecks_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let paternity = leave_type(&service, LeaveCategory::Paternity, 12).await?;

    // Both pass the creation check against the untouched balance of 20
    let first = request(&service, &ada, &paternity, "2024-01-01", "2024-01-12").await?;
    let second = request(&service, &ada, &paternity, "2024-03-01", "2024-03-12").await?;

    service.approve_leave_request(first.id).await?;
    let err = service.approve_leave_request(second.id).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientBalance { .. }));

    assert_eq!(balance(&service, &ada, LeaveCategory::Paternity).await?, 8);
    assert_eq!(
        service.get_leave_request(second.id).await?.status,
        LeaveStatus::Pending
    );

    Ok(())
}

#[tokio::test]
async fn test_overlapping_requests_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 1).await?;
    let first = request(&service, &ada, &annual, "2024-03-10", "2024-03-15").await?;

    for (start, end) in [
        ("2024-03-15", "2024-03-20"), // shares the last day
        ("2024-03-05", "2024-03-10"), // shares the first day
        ("2024-03-11", "2024-03-12"), // inside
        ("2024-03-01", "2024-03-31"), // encloses
    ] {
        let err = request(&service, &ada, &annual, start, end)
            .await
            .unwrap_err()
            .downcast::<AppError>()?;
        match err {
            AppError::OverlappingRequest { existing_id, .. } => {
                assert_eq!(existing_id, first.id.to_string())
            }
            other => panic!("expected overlap for {start}..{end}, got {other:?}"),
        }
    }

    // Adjacent windows are fine
    request(&service, &ada, &annual, "2024-03-16", "2024-03-18").await?;
    request(&service, &ada, &annual, "2024-03-08", "2024-03-09").await?;

    Ok(())
}

#[tokio::test]
async fn test_overlap_is_per_employee() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let grace = hire(&service, "Grace", "grace@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;

    request(&service, &ada, &annual, "2024-07-01", "2024-07-05").await?;
    request(&service, &grace, &annual, "2024-07-01", "2024-07-05").await?;

    assert_eq!(service.get_leave_requests().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rejected_request_does_not_block_new_request() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    let first = request(&service, &ada, &annual, "2024-08-01", "2024-08-05").await?;

    service.reject_leave_request(first.id).await?;
    assert_eq!(
        service.get_leave_request(first.id).await?.status,
        LeaveStatus::Rejected
    );
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 20);

    request(&service, &ada, &annual, "2024-08-03", "2024-08-04").await?;

    // A rejected request cannot be approved or rejected again
    let err = service.approve_leave_request(first.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            status: LeaveStatus::Rejected,
            ..
        }
    ));
    let err = service.reject_leave_request(first.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Error);

    Ok(())
}

#[tokio::test]
async fn test_reversed_dates_are_invalid_even_when_overlapping() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    request(&service, &ada, &annual, "2024-09-01", "2024-09-10").await?;

    let err = request(&service, &ada, &annual, "2024-09-05", "2024-09-02")
        .await
        .unwrap_err()
        .downcast::<AppError>()?;
    assert!(matches!(err, AppError::InvalidDateRange { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidPayload);

    Ok(())
}

#[tokio::test]
async fn test_single_day_request_is_accepted() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let sick = leave_type(&service, LeaveCategory::Sick, 1).await?;
    let req = request(&service, &ada, &sick, "2024-10-01", "2024-10-01").await?;

    assert_eq!(req.days(), 1);

    Ok(())
}

#[tokio::test]
async fn test_create_request_with_unknown_references() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;

    let err = service
        .create_leave_request(NewLeaveRequest {
            employee_id: Uuid::new_v4(),
            leave_type_id: annual.id,
            start_date: parse_date("2024-01-01"),
            end_date: parse_date("2024-01-02"),
            reason: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmployeeNotFound(_)));

    let err = service
        .create_leave_request(NewLeaveRequest {
            employee_id: ada.id,
            leave_type_id: Uuid::new_v4(),
            start_date: parse_date("2024-01-01"),
            end_date: parse_date("2024-01-02"),
            reason: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LeaveTypeNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_cancel_pending_request_removes_it() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    let keep = request(&service, &ada, &annual, "2024-04-01", "2024-04-02").await?;
    let drop = request(&service, &ada, &annual, "2024-05-01", "2024-05-02").await?;

    service.cancel_leave_request(drop.id).await?;

    let remaining = service.get_employee_leave_requests(ada.id).await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);

    let err = service.get_leave_request(drop.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Cancelling frees the window for a new request
    request(&service, &ada, &annual, "2024-05-01", "2024-05-02").await?;

    Ok(())
}

#[tokio::test]
async fn test_cancel_approved_request_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    let req = request(&service, &ada, &annual, "2024-04-01", "2024-04-02").await?;
    service.approve_leave_request(req.id).await?;

    let err = service.cancel_leave_request(req.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::CannotCancel {
            status: LeaveStatus::Approved,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Error);

    let listed = service.get_employee_leave_requests(ada.id).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, req.id);

    Ok(())
}

#[tokio::test]
async fn test_cancel_accrued_request_deletes_it() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    let req = request(&service, &ada, &annual, "2024-04-01", "2024-04-02").await?;
    service.approve_leave_request(req.id).await?;
    service.accrue_leave(req.id).await?;

    service.cancel_leave_request(req.id).await?;

    let err = service.get_leave_request(req.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    // Deductions already taken stay taken
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 16);

    Ok(())
}

#[tokio::test]
async fn test_cancel_rejected_request_deletes_it() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 2).await?;
    let req = request(&service, &ada, &annual, "2024-04-01", "2024-04-02").await?;
    service.reject_leave_request(req.id).await?;

    service.cancel_leave_request(req.id).await?;

    let err = service.get_leave_requests().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_unknown_request_operations_are_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let id = Uuid::new_v4();

    assert_eq!(
        service.approve_leave_request(id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.accrue_leave(id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.reject_leave_request(id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.cancel_leave_request(id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    Ok(())
}

#[tokio::test]
async fn test_listing_requests() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.get_leave_requests().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let grace = hire(&service, "Grace", "grace@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 1).await?;

    let err = service
        .get_employee_leave_requests(ada.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let a1 = request(&service, &ada, &annual, "2024-01-01", "2024-01-01").await?;
    let g1 = request(&service, &grace, &annual, "2024-01-01", "2024-01-01").await?;
    let a2 = request(&service, &ada, &annual, "2024-02-01", "2024-02-01").await?;

    let all: Vec<Uuid> = service
        .get_leave_requests()
        .await?
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(all, vec![a1.id, g1.id, a2.id]);

    let ada_ids: Vec<Uuid> = service
        .get_employee_leave_requests(ada.id)
        .await?
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ada_ids, vec![a1.id, a2.id]);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_approvals_never_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ada = hire(&service, "Ada", "ada@example.com").await?;
    let annual = leave_type(&service, LeaveCategory::Annual, 12).await?;
    let first = request(&service, &ada, &annual, "2024-01-01", "2024-01-12").await?;
    let second = request(&service, &ada, &annual, "2024-02-01", "2024-02-12").await?;

    let (a, b) = tokio::join!(
        service.approve_leave_request(first.id),
        service.approve_leave_request(second.id)
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert_eq!(balance(&service, &ada, LeaveCategory::Annual).await?, 8);

    Ok(())
}
