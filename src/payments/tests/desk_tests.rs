//! Tests for the payment desk.

use super::*;
use crate::coordinator::test_support::{Fixture, TODAY};
use crate::domain::UserId;

struct DeskFixture {
    fx: Fixture,
    desk: PaymentDesk,
    handle: CoordinatorHandle,
}

async fn desk(tier: Tier) -> DeskFixture {
    let fx = Fixture::new();
    let (coordinator, snapshot_rx) = fx.coordinator(fx.record(tier, 3, TODAY));
    let (handle, _join) = CoordinatorHandle::spawn(coordinator, snapshot_rx)
        .await
        .unwrap();
    let ledger = PaymentLedger::new(fx.dir.path().join("payments.json"));
    let desk = PaymentDesk::new(ledger, handle.clone(), fx.clock.clone(), 500);
    DeskFixture { fx, desk, handle }
}

#[tokio::test]
async fn test_submit_records_request_and_marks_pending() {
    let t = desk(Tier::Free).await;

    let request = t.desk.submit(" 01712345678 ", PaymentMethod::Nagad).await.unwrap();

    assert_eq!(request.phone_number, "01712345678");
    assert_eq!(request.status, PaymentStatus::Pending);
    assert_eq!(request.username, "Swift_Panda_42");
    assert_eq!(t.desk.list().unwrap(), vec![request]);
    assert_eq!(t.handle.user_record().await.unwrap().tier, Tier::Pending);
    assert_eq!(t.fx.stored().tier, Tier::Pending);
}

#[tokio::test]
async fn test_short_phone_is_rejected() {
    let t = desk(Tier::Free).await;

    let err = t.desk.submit("0171234567", PaymentMethod::BKash).await.unwrap_err();

    assert!(err.to_string().contains("at least 11"));
    assert!(t.desk.list().unwrap().is_empty());
    assert_eq!(t.fx.stored().tier, Tier::Free);
}

#[tokio::test]
async fn test_premium_user_cannot_submit() {
    let t = desk(Tier::Premium).await;

    assert!(t.desk.submit("01712345678", PaymentMethod::BKash).await.is_err());
    assert!(t.desk.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_approve_upgrades_local_user() {
    let t = desk(Tier::Free).await;
    let request = t.desk.submit("01712345678", PaymentMethod::BKash).await.unwrap();

    let approved = t.desk.approve(&request.id).await.unwrap();

    assert_eq!(approved.status, PaymentStatus::Approved);
    let record = t.handle.user_record().await.unwrap();
    assert_eq!(record.tier, Tier::Premium);
    assert_eq!(record.usage_count, 3);
    assert_eq!(t.fx.stored().tier, Tier::Premium);

    // Resolved requests cannot be resolved again.
    assert!(t.desk.approve(&request.id).await.is_err());
    assert!(t.desk.reject(&request.id).is_err());
}

#[tokio::test]
async fn test_approving_foreign_request_leaves_tier() {
    let t = desk(Tier::Free).await;
    let foreign = PaymentRequest {
        id: "foreign01".to_string(),
        user_id: UserId::new().to_string(),
        username: "Arctic_Eagle_1".to_string(),
        phone_number: "01898765432".to_string(),
        method: PaymentMethod::Nagad,
        timestamp: 0,
        status: PaymentStatus::Pending,
    };
    t.desk.ledger.append(foreign).unwrap();

    t.desk.approve("foreign01").await.unwrap();

    assert_eq!(t.handle.user_record().await.unwrap().tier, Tier::Free);
}

#[tokio::test]
async fn test_reject_keeps_pending_tier() {
    let t = desk(Tier::Free).await;
    let request = t.desk.submit("01712345678", PaymentMethod::BKash).await.unwrap();

    let rejected = t.desk.reject(&request.id).unwrap();

    assert_eq!(rejected.status, PaymentStatus::Rejected);
    assert_eq!(t.handle.user_record().await.unwrap().tier, Tier::Pending);
}

#[tokio::test]
async fn test_unknown_request_id() {
    let t = desk(Tier::Free).await;
    let err = t.desk.approve("missing").await.unwrap_err();
    assert!(err.to_string().contains("No payment request"));
}

#[tokio::test]
async fn test_stats_count_revenue_from_approved() {
    let t = desk(Tier::Free).await;
    let first = t.desk.submit("01712345678", PaymentMethod::BKash).await.unwrap();
    let second = t.desk.submit("01712345679", PaymentMethod::Nagad).await.unwrap();
    t.desk.submit("01712345670", PaymentMethod::Nagad).await.unwrap();

    t.desk.reject(&second.id).unwrap();
    t.desk.approve(&first.id).await.unwrap();

    let stats = t.desk.stats().unwrap();
    assert_eq!(
        stats,
        PaymentStats {
            total: 3,
            pending: 1,
            approved: 1,
            revenue: 500,
        }
    );
}
