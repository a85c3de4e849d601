use crate::domain::message::{self, Conversation, Message, MessageKind};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::user::User;
use crate::error::{AppError, Result};
use crate::storage::UserStore;
use opentelemetry::{global, metrics::Counter};
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    sent_total: Counter<u64>,
    read_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("skillswap-server");
        Self {
            sent_total: meter
                .u64_counter("skillswap_messages_sent_total")
                .with_description("Total number of messages sent")
                .build(),
            read_total: meter
                .u64_counter("skillswap_messages_read_total")
                .with_description("Total number of messages marked as read")
                .build(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub partner: Option<User>,
}

/// Mailboxes embedded in each user record. A sent message is stored twice,
/// once per participant; read state only matters on the receiver's copy.
#[derive(Clone, Debug)]
pub struct MessageService {
    store: Arc<dyn UserStore>,
    metrics: Metrics,
}

impl MessageService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    async fn load(&self, user_id: Uuid) -> Result<User> {
        self.store.find_by_id(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    /// Appends the message to both mailboxes and returns the sender's copy.
    #[tracing::instrument(err(level = "warn"), skip(self, content))]
    pub async fn send(&self, sender_id: Uuid, receiver_id: Uuid, content: &str, kind: MessageKind) -> Result<Message> {
        let now = OffsetDateTime::now_utc();
        let outgoing = Message::new(sender_id, receiver_id, content, kind, now)?;

        let mut receiver =
            self.store.find_by_id(receiver_id).await?.ok_or_else(|| AppError::not_found("Target user"))?;
        if receiver_id == sender_id {
            return Err(AppError::bad_request("Cannot send message to yourself"));
        }
        let mut sender = self.load(sender_id).await?;

        sender.messages.push(outgoing.clone());
        self.store.save(&sender).await?;

        receiver.messages.push(outgoing.copy_for_mailbox());
        self.store.save(&receiver).await?;

        self.metrics.sent_total.add(1, &[]);
        Ok(outgoing)
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn conversations(&self, user_id: Uuid) -> Result<Vec<ConversationView>> {
        let user = self.load(user_id).await?;
        let conversations = message::conversations(user_id, &user.messages);

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.partner_id).collect();
        let partners: HashMap<Uuid, User> =
            self.store.find_by_ids(&ids).await?.into_iter().map(|u| (u.id, u)).collect();

        Ok(conversations
            .into_iter()
            .map(|conversation| {
                let partner = partners.get(&conversation.partner_id).cloned();
                ConversationView { conversation, partner }
            })
            .collect())
    }

    /// Returns one page of the thread with `partner_id`, oldest first. Every
    /// unread message from the partner is marked read first, not only those on
    /// the returned page.
    #[tracing::instrument(err(level = "warn"), skip(self, page))]
    pub async fn thread(&self, user_id: Uuid, partner_id: Uuid, page: PageRequest) -> Result<Page<Message>> {
        let mut user = self.load(user_id).await?;
        let now = OffsetDateTime::now_utc();

        let mut marked = 0_u64;
        for m in user.messages.iter_mut().filter(|m| m.sender_id == partner_id && m.receiver_id == user_id) {
            if m.mark_read(now) {
                marked += 1;
            }
        }
        if marked > 0 {
            self.store.save(&user).await?;
            tracing::debug!(marked, "Marked thread messages as read");
            self.metrics.read_total.add(marked, &[]);
        }

        Ok(page.paginate(message::thread(user_id, partner_id, &user.messages)))
    }

    /// Marks the requester's copy as read. Only the receiver can do this; for the
    /// sender the call succeeds without changing anything.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn mark_read(&self, user_id: Uuid, message_id: Uuid) -> Result<Message> {
        let mut user = self.load(user_id).await?;
        let Some(found) = user.messages.iter_mut().find(|m| m.id == message_id) else {
            return Err(AppError::not_found("Message"));
        };

        if found.receiver_id != user_id || !found.mark_read(OffsetDateTime::now_utc()) {
            return Ok(found.clone());
        }
        let updated = found.clone();
        self.store.save(&user).await?;
        self.metrics.read_total.add(1, &[]);
        Ok(updated)
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> Result<usize> {
        let user = self.load(user_id).await?;
        Ok(user.messages.iter().filter(|m| m.is_unread_for(user_id)).count())
    }

    /// Removes the requester's own copy of a message they sent. The receiver's
    /// copy is kept.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn delete(&self, user_id: Uuid, message_id: Uuid) -> Result<()> {
        let mut user = self.load(user_id).await?;
        let Some(index) = user.messages.iter().position(|m| m.id == message_id) else {
            return Err(AppError::not_found("Message"));
        };
        if user.messages[index].sender_id != user_id {
            return Err(AppError::bad_request("You can only delete messages you sent"));
        }
        user.messages.remove(index);
        self.store.save(&user).await
    }

    #[tracing::instrument(err(level = "warn"), skip(self, query, page))]
    pub async fn search(&self, user_id: Uuid, query: &str, page: PageRequest) -> Result<Page<Message>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::bad_request("Search query is required"));
        }
        let user = self.load(user_id).await?;
        Ok(page.paginate(message::search(query, &user.messages)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;
    use crate::storage::InMemoryUserStore;

    async fn seed(store: &InMemoryUserStore, email: &str) -> User {
        store
            .create_user(NewUser {
                email: email.into(),
                password_hash: String::new(),
                name: email.into(),
                bio: None,
                offers: vec![],
                seeks: vec![],
            })
            .await
            .unwrap()
    }

    async fn setup() -> (Arc<InMemoryUserStore>, MessageService, User, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let a = seed(&store, "a@example.com").await;
        let b = seed(&store, "b@example.com").await;
        let service = MessageService::new(Arc::clone(&store) as Arc<dyn UserStore>);
        (store, service, a, b)
    }

    fn first_page() -> PageRequest {
        PageRequest::new(None, None, 50, 100).unwrap()
    }

    #[tokio::test]
    async fn test_send_appends_to_both_mailboxes() {
        let (store, service, a, b) = setup().await;
        service.send(a.id, b.id, "hello", MessageKind::Text).await.unwrap();

        assert_eq!(store.find_by_id(a.id).await.unwrap().unwrap().messages.len(), 1);
        assert_eq!(store.find_by_id(b.id).await.unwrap().unwrap().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_send_validation() {
        let (_store, service, a, _b) = setup().await;
        assert!(matches!(service.send(a.id, Uuid::new_v4(), "hi", MessageKind::Text).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.send(a.id, a.id, "hi", MessageKind::Text).await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.send(a.id, a.id, " ", MessageKind::Text).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_thread_marks_all_unread_once() {
        let (store, service, a, b) = setup().await;
        for i in 0..3 {
            service.send(b.id, a.id, &format!("msg {i}"), MessageKind::Text).await.unwrap();
        }
        service.send(a.id, b.id, "reply", MessageKind::Text).await.unwrap();
        assert_eq!(service.unread_count(a.id).await.unwrap(), 3);

        let page = service.thread(a.id, b.id, PageRequest::new(None, Some(1), 50, 100).unwrap()).await.unwrap();
        assert_eq!(page.pagination.total, 4);
        assert_eq!(service.unread_count(a.id).await.unwrap(), 0);

        let read_at: Vec<_> = store.find_by_id(a.id).await.unwrap().unwrap().messages.iter().map(|m| m.read_at).collect();
        service.thread(a.id, b.id, first_page()).await.unwrap();
        let again: Vec<_> = store.find_by_id(a.id).await.unwrap().unwrap().messages.iter().map(|m| m.read_at).collect();
        assert_eq!(read_at, again);

        // Sender's copies are untouched.
        let b_doc = store.find_by_id(b.id).await.unwrap().unwrap();
        assert!(b_doc.messages.iter().filter(|m| m.sender_id == b.id).all(|m| !m.read));
    }

    #[tokio::test]
    async fn test_mark_read_only_for_receiver() {
        let (_store, service, a, b) = setup().await;
        let sent = service.send(a.id, b.id, "hello", MessageKind::Text).await.unwrap();

        let unchanged = service.mark_read(a.id, sent.id).await.unwrap();
        assert!(!unchanged.read);
        assert!(matches!(service.mark_read(b.id, sent.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_one_sided() {
        let (store, service, a, b) = setup().await;
        let sent = service.send(a.id, b.id, "oops", MessageKind::Text).await.unwrap();

        service.delete(a.id, sent.id).await.unwrap();
        assert!(store.find_by_id(a.id).await.unwrap().unwrap().messages.is_empty());
        assert_eq!(store.find_by_id(b.id).await.unwrap().unwrap().messages.len(), 1);

        let received = store.find_by_id(b.id).await.unwrap().unwrap().messages[0].id;
        assert!(matches!(service.delete(b.id, received).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_conversations_and_search() {
        let (_store, service, a, b) = setup().await;
        service.send(b.id, a.id, "Guitar on Friday?", MessageKind::Text).await.unwrap();
        service.send(a.id, b.id, "Sure", MessageKind::Text).await.unwrap();

        let convs = service.conversations(a.id).await.unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].conversation.unread_count, 1);
        assert_eq!(convs[0].partner.as_ref().map(|p| p.id), Some(b.id));

        let found = service.search(a.id, "guitar", first_page()).await.unwrap();
        assert_eq!(found.items.len(), 1);
        assert!(matches!(service.search(a.id, "  ", first_page()).await, Err(AppError::BadRequest(_))));
    }
}
