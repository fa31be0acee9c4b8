mod common;

use engine::{EngineError, Money, NewEntryCmd, Scope, TransferRequestCmd};
use sea_orm::ConnectionTrait;

use common::{add_member, donate, fixture, occurred_at, spend};

#[tokio::test]
async fn user_without_activity_has_zero_balance() {
    let fx = fixture().await;

    let balance = fx
        .engine
        .balance(&fx.member, fx.member.user_id, None)
        .await
        .unwrap();
    assert_eq!(balance, Money::ZERO);

    let manager_balance = fx
        .engine
        .balance(&fx.manager, fx.manager.user_id, None)
        .await
        .unwrap();
    assert_eq!(manager_balance, Money::ZERO);
}

#[tokio::test]
async fn balance_is_donations_minus_expenses_minus_approved_transfers() {
    let fx = fixture().await;

    spend(&fx.engine, &fx.member, "e-1", 200_00).await;
    donate(&fx.engine, &fx.member, "d-1", 500_00).await;
    donate(&fx.engine, &fx.member, "d-2", 300_00).await;
    assert_eq!(
        fx.engine
            .user_balance(&fx.member, fx.member.user_id, None)
            .await
            .unwrap(),
        Money::new(600_00)
    );

    fx.engine
        .request_transfer(
            &fx.member,
            TransferRequestCmd::new("t-1", Money::new(250_00)),
        )
        .await
        .unwrap();
    fx.engine
        .request_transfer(
            &fx.member,
            TransferRequestCmd::new("t-2", Money::new(100_00)),
        )
        .await
        .unwrap();
    fx.engine.approve_transfer(&fx.manager, "t-1").await.unwrap();
    fx.engine.reject_transfer(&fx.manager, "t-2").await.unwrap();

    let summary = fx
        .engine
        .wallet_summary(&fx.member, fx.member.user_id, None)
        .await
        .unwrap();
    assert_eq!(summary.collected, Money::new(800_00));
    assert_eq!(summary.spent, Money::new(200_00));
    assert_eq!(summary.transferred_out, Money::new(250_00));
    assert_eq!(summary.received, Money::ZERO);
    assert_eq!(summary.balance, Money::new(350_00));
}

#[tokio::test]
async fn manager_balance_adds_received_transfers() {
    let fx = fixture().await;
    let other = add_member(&fx.engine, &fx.manager, "Kiran", "9000000003").await;

    donate(&fx.engine, &fx.manager, "m-d-1", 1_000_00).await;
    spend(&fx.engine, &fx.manager, "m-e-1", 150_00).await;
    donate(&fx.engine, &fx.member, "d-1", 400_00).await;
    donate(&fx.engine, &other, "d-2", 90_00).await;

    for (actor, key, amount) in [(&fx.member, "t-1", 400_00), (&other, "t-2", 90_00)] {
        fx.engine
            .request_transfer(actor, TransferRequestCmd::new(key, Money::new(amount)))
            .await
            .unwrap();
        fx.engine.approve_transfer(&fx.manager, key).await.unwrap();
    }

    let own = fx
        .engine
        .user_balance(&fx.manager, fx.manager.user_id, None)
        .await
        .unwrap();
    assert_eq!(own, Money::new(850_00));

    let total = fx
        .engine
        .manager_balance(&fx.manager, fx.manager.user_id, None)
        .await
        .unwrap();
    assert_eq!(total, Money::new(850_00 + 490_00));
    assert_eq!(
        fx.engine
            .balance(&fx.manager, fx.manager.user_id, None)
            .await
            .unwrap(),
        total
    );
}

#[tokio::test]
async fn pending_transfers_do_not_count() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    fx.engine
        .request_transfer(&fx.member, TransferRequestCmd::new("t-1", Money::new(100_00)))
        .await
        .unwrap();

    assert_eq!(
        fx.engine
            .balance(&fx.member, fx.member.user_id, None)
            .await
            .unwrap(),
        Money::new(100_00)
    );
    assert_eq!(
        fx.engine
            .balance(&fx.manager, fx.manager.user_id, None)
            .await
            .unwrap(),
        Money::ZERO
    );
}

#[tokio::test]
async fn soft_deleted_donation_leaves_approved_transfer_alone() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 500_00).await;
    fx.engine
        .request_transfer(&fx.member, TransferRequestCmd::new("t-1", Money::new(500_00)))
        .await
        .unwrap();
    fx.engine.approve_transfer(&fx.manager, "t-1").await.unwrap();

    fx.engine.soft_delete_entry(&fx.member, "d-1").await.unwrap();

    assert_eq!(
        fx.engine
            .balance(&fx.member, fx.member.user_id, None)
            .await
            .unwrap(),
        Money::new(-500_00)
    );
    let transfer = fx.engine.transfer(&fx.member, "t-1").await.unwrap();
    assert_eq!(transfer.status, engine::TransferStatus::Approved);
    assert_eq!(
        fx.engine
            .balance(&fx.manager, fx.manager.user_id, None)
            .await
            .unwrap(),
        Money::new(500_00)
    );
}

#[tokio::test]
async fn event_narrowed_balance_only_counts_that_event() {
    let fx = fixture().await;
    let ganesh = fx.engine.create_event(&fx.manager, "Ganeshotsav").await.unwrap();
    let navratri = fx.engine.create_event(&fx.manager, "Navratri").await.unwrap();

    let member_ganesh = fx
        .engine
        .actor(fx.member.user_id, Some(ganesh.id))
        .await
        .unwrap();
    let member_navratri = fx
        .engine
        .actor(fx.member.user_id, Some(navratri.id))
        .await
        .unwrap();

    donate(&fx.engine, &member_ganesh, "g-1", 300_00).await;
    donate(&fx.engine, &member_navratri, "n-1", 200_00).await;
    donate(&fx.engine, &fx.member, "all-1", 50_00).await;

    let ganesh_balance = fx
        .engine
        .balance(&fx.member, fx.member.user_id, Some(ganesh.id))
        .await
        .unwrap();
    assert_eq!(ganesh_balance, Money::new(300_00));

    let mandal_balance = fx
        .engine
        .balance(&fx.member, fx.member.user_id, None)
        .await
        .unwrap();
    assert_eq!(mandal_balance, Money::new(550_00));

    let err = fx
        .engine
        .balance(&member_ganesh, fx.member.user_id, Some(navratri.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn member_cannot_read_another_members_balance() {
    let fx = fixture().await;
    let other = add_member(&fx.engine, &fx.manager, "Kiran", "9000000003").await;

    let err = fx
        .engine
        .balance(&fx.member, other.user_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .balance(&fx.member, fx.manager.user_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    fx.engine
        .balance(&fx.manager, other.user_id, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn manager_of_another_mandal_cannot_read_balance() {
    let fx = fixture().await;
    fx.engine
        .create_mandal(engine::NewMandalCmd::new(
            "Chinchpokli",
            "Meera",
            "9100000001",
            common::PASSWORD,
        ))
        .await
        .unwrap();
    let outsider = fx
        .engine
        .authenticate("9100000001", common::PASSWORD, None)
        .await
        .unwrap();

    let err = fx
        .engine
        .balance(&outsider, fx.member.user_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn unknown_user_balance_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .balance(&fx.manager, uuid::Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .balance(&fx.member, fx.member.user_id, Some(uuid::Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(fx.mandal.manager_id, fx.manager.user_id);
    assert_eq!(fx.member.scope, Scope::mandal(fx.mandal.id));
}

#[tokio::test]
async fn recompute_rewrites_drifted_cache() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 700_00).await;
    spend(&fx.engine, &fx.member, "e-1", 100_00).await;
    fx.engine
        .request_transfer(&fx.member, TransferRequestCmd::new("t-1", Money::new(200_00)))
        .await
        .unwrap();
    fx.engine.approve_transfer(&fx.manager, "t-1").await.unwrap();

    // Entries never touch the cache, only approvals do.
    let before = fx.engine.user(&fx.member, fx.member.user_id).await.unwrap();
    assert_eq!(before.cached.wallet_balance, Money::new(-200_00));

    let balance = fx
        .engine
        .recompute_cached_balances(&fx.manager, fx.member.user_id)
        .await
        .unwrap();
    assert_eq!(balance, Money::new(400_00));

    let member = fx.engine.user(&fx.member, fx.member.user_id).await.unwrap();
    assert_eq!(member.cached.wallet_balance, Money::new(400_00));
    assert_eq!(member.cached.total_collected, Money::new(700_00));
    assert_eq!(member.cached.total_transferred, Money::new(200_00));
    assert_eq!(member.cached.manager_balance, Money::ZERO);

    let manager_balance = fx
        .engine
        .recompute_cached_balances(&fx.manager, fx.manager.user_id)
        .await
        .unwrap();
    assert_eq!(manager_balance, Money::new(200_00));
    let manager = fx.engine.user(&fx.manager, fx.manager.user_id).await.unwrap();
    assert_eq!(manager.cached.manager_balance, Money::new(200_00));
}

#[tokio::test]
async fn recompute_requires_manager() {
    let fx = fixture().await;
    let err = fx
        .engine
        .recompute_cached_balances(&fx.member, fx.member.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn amounts_above_the_cap_are_rejected() {
    let fx = fixture().await;

    let err = fx
        .engine
        .create_donation(
            &fx.manager,
            NewEntryCmd::new("d-1", Money::new(i64::MAX), occurred_at()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .request_transfer(&fx.member, TransferRequestCmd::new("t-1", Money::new(i64::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    donate(&fx.engine, &fx.member, "d-2", Money::MAX_AMOUNT.minor()).await;
    let balance = fx
        .engine
        .balance(&fx.member, fx.member.user_id, None)
        .await
        .unwrap();
    assert_eq!(balance, Money::MAX_AMOUNT);
}

#[tokio::test]
async fn manager_balance_overflow_is_an_error() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.manager, "d-1", 100_00).await;
    // Stored rows written before the amount cap existed.
    fx.db
        .execute_unprepared(
            "UPDATE entries SET amount_minor = 9223372036854775807 WHERE idempotency_key = 'd-1'",
        )
        .await
        .unwrap();
    fx.engine
        .request_transfer(&fx.member, TransferRequestCmd::new("t-1", Money::new(100)))
        .await
        .unwrap();
    fx.engine.approve_transfer(&fx.manager, "t-1").await.unwrap();

    for result in [
        fx.engine.balance(&fx.manager, fx.manager.user_id, None).await,
        fx.engine
            .manager_balance(&fx.manager, fx.manager.user_id, None)
            .await,
    ] {
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }

    let own = fx
        .engine
        .user_balance(&fx.manager, fx.manager.user_id, None)
        .await
        .unwrap();
    assert_eq!(own, Money::new(i64::MAX));
}

#[tokio::test]
async fn overflowing_ledger_sum_is_an_error() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    donate(&fx.engine, &fx.member, "d-2", 100_00).await;
    fx.db
        .execute_unprepared("UPDATE entries SET amount_minor = 4611686018427387904")
        .await
        .unwrap();

    let err = fx
        .engine
        .balance(&fx.member, fx.member.user_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
