use chrono::{Duration, TimeZone, Utc};

use mashaer::application::ports::{
    ConversationScope, ConversationStore, CustomerProfile, StoreError,
};
use mashaer::domain::{
    Channel, Conversation, ConversationId, ConversationStatus, Message, MessageSender,
    MessageType, SentimentSummary,
};
use mashaer::infrastructure::persistence::InMemoryConversationStore;

fn message(id: &str) -> Message {
    Message::new(
        id.to_string(),
        format!("message {}", id),
        MessageSender::Customer,
        MessageType::Text,
        Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap(),
    )
}

fn active_conversation(owner: &str, channel: Channel, customer: &str) -> Conversation {
    Conversation::new(
        owner.to_string(),
        channel,
        customer.to_string(),
        None,
        None,
        message("m-1"),
    )
}

#[tokio::test]
async fn given_active_conversation_when_creating_second_for_tuple_then_constraint_violation() {
    let store = InMemoryConversationStore::new();
    let first = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    store.create_conversation(&first).await.unwrap();

    let second = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    let result = store.create_conversation(&second).await;

    assert!(matches!(result, Err(StoreError::ConstraintViolation(_))));
}

#[tokio::test]
async fn given_resolved_conversation_when_creating_active_for_tuple_then_allowed() {
    let store = InMemoryConversationStore::new();
    let mut resolved = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    resolved.status = ConversationStatus::Resolved;
    store.create_conversation(&resolved).await.unwrap();

    let active = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    store.create_conversation(&active).await.unwrap();

    let found = store
        .find_active_by_tuple("owner-1", Channel::Whatsapp, "c-1")
        .await
        .unwrap()
        .expect("active conversation found");
    assert_eq!(found.id, active.id);
}

#[tokio::test]
async fn given_different_channel_when_creating_then_tuples_are_independent() {
    let store = InMemoryConversationStore::new();
    store
        .create_conversation(&active_conversation("owner-1", Channel::Whatsapp, "c-1"))
        .await
        .unwrap();
    store
        .create_conversation(&active_conversation("owner-1", Channel::Messenger, "c-1"))
        .await
        .unwrap();

    assert!(store
        .find_active_by_tuple("owner-1", Channel::Messenger, "c-1")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn given_duplicate_message_id_when_appending_then_list_is_unchanged() {
    let store = InMemoryConversationStore::new();
    let conversation = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    store.create_conversation(&conversation).await.unwrap();

    let duplicate = message("m-1");
    let summary = SentimentSummary::from_messages(&conversation.messages);
    store
        .append_message_and_update(
            conversation.id,
            &duplicate,
            &summary,
            conversation.end_time,
            &CustomerProfile::default(),
        )
        .await
        .unwrap();

    let found = store
        .find_active_by_tuple("owner-1", Channel::Whatsapp, "c-1")
        .await
        .unwrap()
        .expect("conversation found");
    assert_eq!(found.messages.len(), 1);
}

#[tokio::test]
async fn given_existing_profile_when_appending_then_backfill_does_not_overwrite() {
    let store = InMemoryConversationStore::new();
    let mut conversation = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    conversation.customer_name = Some("Ahmed".to_string());
    store.create_conversation(&conversation).await.unwrap();

    let profile = CustomerProfile {
        name: Some("Someone Else".to_string()),
        phone: Some("201001234567".to_string()),
    };
    let summary = conversation.summary;
    store
        .append_message_and_update(
            conversation.id,
            &message("m-2"),
            &summary,
            conversation.end_time,
            &profile,
        )
        .await
        .unwrap();

    let found = store
        .find_active_by_tuple("owner-1", Channel::Whatsapp, "c-1")
        .await
        .unwrap()
        .expect("conversation found");
    assert_eq!(found.customer_name.as_deref(), Some("Ahmed"));
    assert_eq!(found.customer_phone.as_deref(), Some("201001234567"));
}

#[tokio::test]
async fn given_unknown_id_when_updating_then_not_found() {
    let store = InMemoryConversationStore::new();
    let id = ConversationId::new();

    let status = store.set_status(id, ConversationStatus::Resolved).await;
    assert!(matches!(status, Err(StoreError::NotFound(_))));

    let handled = store.set_handled(id, true, Some("agent@example.com"), None).await;
    assert!(matches!(handled, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn given_handled_flag_when_setting_then_audit_fields_stored() {
    let store = InMemoryConversationStore::new();
    let conversation = active_conversation("owner-1", Channel::Whatsapp, "c-1");
    store.create_conversation(&conversation).await.unwrap();

    let at = Utc.with_ymd_and_hms(2024, 5, 21, 9, 0, 0).unwrap();
    store
        .set_handled(conversation.id, true, Some("agent@example.com"), Some(at))
        .await
        .unwrap();

    let found = store
        .find_active_by_tuple("owner-1", Channel::Whatsapp, "c-1")
        .await
        .unwrap()
        .expect("conversation found");
    assert!(found.handled);
    assert_eq!(found.handled_by.as_deref(), Some("agent@example.com"));
    assert_eq!(found.handled_at, Some(at));
}

#[tokio::test]
async fn given_scope_filters_when_querying_then_only_matches_returned() {
    let store = InMemoryConversationStore::new();
    store
        .create_conversation(&active_conversation("owner-1", Channel::Whatsapp, "c-1"))
        .await
        .unwrap();
    store
        .create_conversation(&active_conversation("owner-1", Channel::Messenger, "c-2"))
        .await
        .unwrap();
    store
        .create_conversation(&active_conversation("owner-2", Channel::Whatsapp, "c-3"))
        .await
        .unwrap();

    let since = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();

    let all = store
        .query_by_scope_and_time_range(&ConversationScope::default(), since)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let owner_scope = ConversationScope {
        owner_id: Some("owner-1".to_string()),
        channel: None,
    };
    let owned = store
        .query_by_scope_and_time_range(&owner_scope, since)
        .await
        .unwrap();
    assert_eq!(owned.len(), 2);

    let channel_scope = ConversationScope {
        owner_id: Some("owner-1".to_string()),
        channel: Some(Channel::Whatsapp),
    };
    let channeled = store
        .query_by_scope_and_time_range(&channel_scope, since)
        .await
        .unwrap();
    assert_eq!(channeled.len(), 1);

    let future = store
        .query_by_scope_and_time_range(
            &ConversationScope::default(),
            since + Duration::days(1),
        )
        .await
        .unwrap();
    assert!(future.is_empty());
}
