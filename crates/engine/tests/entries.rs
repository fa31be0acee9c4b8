mod common;

use engine::{EngineError, EntryKind, EntryListFilter, Money, NewEntryCmd, Scope};

use common::{add_manager, add_member, donate, fixture, occurred_at, spend};

#[tokio::test]
async fn entry_takes_scope_and_attribution_from_actor() {
    let fx = fixture().await;
    let entry = fx
        .engine
        .create_donation(
            &fx.member,
            NewEntryCmd::new(" d-1 ", Money::new(501_00), occurred_at())
                .counterparty("Shah Traders")
                .category("sponsorship")
                .payment_mode("upi")
                .contact("  ")
                .remarks("pandal lights"),
        )
        .await
        .unwrap();

    assert_eq!(entry.idempotency_key, "d-1");
    assert_eq!(entry.kind, EntryKind::Donation);
    assert_eq!(entry.scope, Scope::mandal(fx.mandal.id));
    assert_eq!(entry.created_by_user_id, fx.member.user_id);
    assert_eq!(entry.created_by_name, "Asha");
    assert!(entry.is_synced);
    assert!(!entry.is_deleted);
    assert_eq!(entry.details.counterparty.as_deref(), Some("Shah Traders"));
    assert_eq!(entry.details.contact, None);

    spend(&fx.engine, &fx.member, "e-1", 20_00).await;
    let member = fx.engine.user(&fx.member, fx.member.user_id).await.unwrap();
    assert_eq!(member.donation_count, 1);
    assert_eq!(member.expense_count, 1);
}

#[tokio::test]
async fn resubmitting_a_key_returns_the_existing_entry() {
    let fx = fixture().await;
    let first = donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    let again = donate(&fx.engine, &fx.member, "d-1", 900_00).await;
    assert_eq!(first, again);

    let member = fx.engine.user(&fx.member, fx.member.user_id).await.unwrap();
    assert_eq!(member.donation_count, 1);
    assert_eq!(
        fx.engine
            .balance(&fx.member, fx.member.user_id, None)
            .await
            .unwrap(),
        Money::new(100_00)
    );
}

#[tokio::test]
async fn key_owned_by_someone_else_is_a_conflict() {
    let fx = fixture().await;
    let other = add_member(&fx.engine, &fx.manager, "Kiran", "9000000003").await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;

    let err = fx
        .engine
        .create_donation(
            &other,
            NewEntryCmd::new("d-1", Money::new(100_00), occurred_at()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = fx
        .engine
        .create_expense(
            &fx.member,
            NewEntryCmd::new("d-1", Money::new(100_00), occurred_at()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn invalid_entries_are_rejected() {
    let fx = fixture().await;

    let err = fx
        .engine
        .create_expense(
            &fx.member,
            NewEntryCmd::new("e-1", Money::new(-1), occurred_at()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = fx
        .engine
        .create_donation(&fx.member, NewEntryCmd::new("", Money::new(1), occurred_at()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let zero = fx
        .engine
        .create_donation(&fx.member, NewEntryCmd::new("d-0", Money::ZERO, occurred_at()))
        .await
        .unwrap();
    assert!(zero.amount.is_zero());
}

#[tokio::test]
async fn soft_delete_hides_entry_and_records_who() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    donate(&fx.engine, &fx.member, "d-2", 40_00).await;

    fx.engine.soft_delete_entry(&fx.manager, "d-1").await.unwrap();

    let visible = fx
        .engine
        .list_entries(&fx.member, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].idempotency_key, "d-2");

    let all = fx
        .engine
        .list_entries(
            &fx.member,
            &EntryListFilter {
                include_deleted: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let deleted = all
        .iter()
        .find(|entry| entry.idempotency_key == "d-1")
        .unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());
    assert_eq!(deleted.deleted_by, Some(fx.manager.user_id));

    assert_eq!(
        fx.engine
            .balance(&fx.member, fx.member.user_id, None)
            .await
            .unwrap(),
        Money::new(40_00)
    );
}

#[tokio::test]
async fn deleting_twice_is_a_conflict() {
    let fx = fixture().await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    fx.engine.soft_delete_entry(&fx.member, "d-1").await.unwrap();

    let err = fx
        .engine
        .soft_delete_entry(&fx.member, "d-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = fx
        .engine
        .soft_delete_entry(&fx.member, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn only_creator_or_manager_can_delete() {
    let fx = fixture().await;
    let other = add_member(&fx.engine, &fx.manager, "Kiran", "9000000003").await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;

    let err = fx
        .engine
        .soft_delete_entry(&other, "d-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let deputy = add_manager(&fx.engine, &fx.manager, "Sunil", "9000000004").await;
    fx.engine.soft_delete_entry(&deputy, "d-1").await.unwrap();
}

#[tokio::test]
async fn listing_follows_role_and_kind() {
    let fx = fixture().await;
    let other = add_member(&fx.engine, &fx.manager, "Kiran", "9000000003").await;
    donate(&fx.engine, &fx.member, "d-1", 100_00).await;
    spend(&fx.engine, &fx.member, "e-1", 10_00).await;
    donate(&fx.engine, &other, "d-2", 70_00).await;

    let everything = fx
        .engine
        .list_entries(&fx.manager, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);

    let donations = fx
        .engine
        .list_entries(
            &fx.manager,
            &EntryListFilter {
                kind: Some(EntryKind::Donation),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(donations.len(), 2);
    assert!(donations.iter().all(|e| e.kind == EntryKind::Donation));

    let own = fx
        .engine
        .list_entries(&other, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].created_by_user_id, other.user_id);
}

#[tokio::test]
async fn event_actor_only_sees_its_event() {
    let fx = fixture().await;
    let ganesh = fx.engine.create_event(&fx.manager, "Ganeshotsav").await.unwrap();
    let in_event = fx
        .engine
        .actor(fx.member.user_id, Some(ganesh.id))
        .await
        .unwrap();

    let entry = donate(&fx.engine, &in_event, "g-1", 100_00).await;
    assert_eq!(entry.scope, Scope::event(fx.mandal.id, ganesh.id));
    donate(&fx.engine, &fx.member, "all-1", 10_00).await;

    let listed = fx
        .engine
        .list_entries(&in_event, &EntryListFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].idempotency_key, "g-1");

    let err = fx
        .engine
        .soft_delete_entry(&in_event, "all-1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
