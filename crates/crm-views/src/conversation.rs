//! Live view of one lead's conversation.
//!
//! A [`LeadConversation`] owns the lead record and its sorted message list
//! while the lead is open. It listens to the shared realtime connection,
//! keeps the lead and Discord rooms joined, and folds server events into
//! local state. Events for other leads are ignored.

use std::sync::Arc;

use paveos_api::{Lead, LeadService, LeadUpdate, Message, MessageDirection, SendMessage};
use paveos_realtime::{ConnectionManager, LeadPatch, Room, RoomGuard, ServerEvent};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Result, ViewError};
use crate::notify::Notifier;

pub struct LeadConversation {
    service: Arc<dyn LeadService>,
    sockets: ConnectionManager,
    notifier: Notifier,
    lead: Lead,
    messages: Vec<Message>,
    draft: String,
    sending: bool,
    events: broadcast::Receiver<ServerEvent>,
    _lead_room: RoomGuard,
    discord_room: Option<RoomGuard>,
}

impl LeadConversation {
    /// Open a lead: listen, join its room, then load it once.
    ///
    /// Messages are sorted oldest first and unread incoming messages are
    /// marked read one by one. The Discord room is joined once the lead's
    /// linked identity is known.
    pub async fn open(
        service: Arc<dyn LeadService>,
        sockets: ConnectionManager,
        lead_id: &str,
        notifier: Notifier,
    ) -> Result<Self> {
        let events = sockets.subscribe();
        let lead_room = sockets.join(Room::lead(lead_id));

        let detail = match service.get_lead(lead_id).await {
            Ok(detail) => detail,
            Err(e) => {
                notifier.error(e.user_message());
                return Err(e.into());
            }
        };

        let mut messages = detail.messages;
        messages.sort_by_key(|message| message.created_at);

        let mut conversation = Self {
            service,
            sockets,
            notifier,
            lead: detail.lead,
            messages,
            draft: String::new(),
            sending: false,
            events,
            _lead_room: lead_room,
            discord_room: None,
        };
        conversation.mark_unread_read().await;
        conversation.sync_discord_room();

        info!(
            lead_id,
            messages = conversation.messages.len(),
            "Opened lead conversation"
        );
        Ok(conversation)
    }

    pub fn lead(&self) -> &Lead {
        &self.lead
    }

    pub fn lead_id(&self) -> &str {
        &self.lead.id
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// True while a send is in flight; input should be disabled.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Fold one server event into the view. Returns whether anything changed.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        if event.lead_id() != Some(self.lead.id.as_str()) {
            return false;
        }

        match event {
            ServerEvent::NewMessage(message) => self.insert_message(message.clone()),
            ServerEvent::MessageRead(read) => {
                match self.messages.iter_mut().find(|m| m.id == read.message_id) {
                    Some(message) if !message.is_read => {
                        message.is_read = true;
                        true
                    }
                    _ => false,
                }
            }
            ServerEvent::LeadUpdated(patch) => self.merge_patch(patch),
            ServerEvent::Other { .. } => false,
        }
    }

    /// Wait for the next server event and apply it.
    ///
    /// Returns the event if it changed this view, `None` if it was ignored.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    return if self.apply(&event) { Some(event) } else { None };
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(lead_id = %self.lead.id, skipped, "Conversation listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Realtime listener closed");
                    return None;
                }
            }
        }
    }

    /// Send the current draft to the lead's Discord identity.
    ///
    /// The draft is cleared only on success.
    pub async fn send_message(&mut self) -> Result<()> {
        let discord_user_id = match &self.lead.discord_user_id {
            Some(id) if !self.draft.trim().is_empty() => id.clone(),
            _ => {
                let msg = "Please enter a message";
                self.notifier.error(msg);
                return Err(ViewError::Validation(msg.to_string()));
            }
        };

        self.sending = true;
        let result = self
            .service
            .send_message(&SendMessage::direct(discord_user_id, self.draft.clone()))
            .await;
        self.sending = false;

        match result {
            Ok(()) => {
                self.draft.clear();
                self.notifier.success("Message sent!");
                Ok(())
            }
            Err(e) => {
                warn!(lead_id = %self.lead.id, error = %e, "Failed to send message");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Save edits to the lead and adopt the stored record.
    pub async fn update_lead(&mut self, update: &LeadUpdate) -> Result<&Lead> {
        match self.service.update_lead(&self.lead.id, update).await {
            Ok(lead) => {
                self.lead = lead;
                self.sync_discord_room();
                self.notifier.success("Lead updated successfully");
                Ok(&self.lead)
            }
            Err(e) => {
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Refetch the message history, keeping the lead record.
    pub async fn reload_messages(&mut self) -> Result<()> {
        let detail = self.service.get_lead(&self.lead.id).await?;
        self.messages = detail.messages;
        self.messages.sort_by_key(|message| message.created_at);
        self.mark_unread_read().await;
        Ok(())
    }

    /// Leave both rooms and detach the listener.
    pub fn close(self) {
        debug!(lead_id = %self.lead.id, "Closing lead conversation");
    }

    /// Insert keeping creation order; equal timestamps keep arrival order.
    fn insert_message(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            debug!(message_id = %message.id, "Duplicate message ignored");
            return false;
        }

        if message.direction == MessageDirection::Incoming {
            let author = message.author_username.as_deref().unwrap_or("User");
            self.notifier.success(format!("New message from {author}"));
        }

        let at = self
            .messages
            .partition_point(|m| m.created_at <= message.created_at);
        self.messages.insert(at, message);
        true
    }

    fn merge_patch(&mut self, patch: &LeadPatch) -> bool {
        let merged = serde_json::to_value(&self.lead).and_then(|mut value| {
            if let Value::Object(target) = &mut value {
                for (key, field) in &patch.fields {
                    if key != "id" && key != "_id" {
                        target.insert(key.clone(), field.clone());
                    }
                }
            }
            serde_json::from_value::<Lead>(value)
        });

        match merged {
            Ok(lead) => {
                self.lead = lead;
                self.sync_discord_room();
                self.notifier.success("Lead updated");
                true
            }
            Err(e) => {
                warn!(lead_id = %patch.id, error = %e, "Ignoring malformed lead update");
                false
            }
        }
    }

    /// Best effort: failures are logged and the batch continues.
    async fn mark_unread_read(&mut self) {
        let unread: Vec<String> = self
            .messages
            .iter()
            .filter(|m| m.is_unread_incoming())
            .map(|m| m.id.clone())
            .collect();

        for id in unread {
            match self.service.mark_message_read(&id).await {
                Ok(()) => {
                    if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
                        message.is_read = true;
                    }
                }
                Err(e) => warn!(message_id = %id, error = %e, "Failed to mark message as read"),
            }
        }
    }

    /// Hold the Discord room matching the lead's current linked identity.
    fn sync_discord_room(&mut self) {
        let wanted = self
            .lead
            .discord_user_id
            .as_ref()
            .map(|discord_user_id| Room::discord(discord_user_id.clone(), self.lead.id.clone()));

        let current = self.discord_room.as_ref().map(|guard| guard.room());
        if current == wanted.as_ref() {
            return;
        }
        self.discord_room = wanted.map(|room| self.sockets.join(room));
    }
}

impl std::fmt::Debug for LeadConversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadConversation")
            .field("lead_id", &self.lead.id)
            .field("messages", &self.messages.len())
            .field("sending", &self.sending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notification, NotificationLevel};
    use crate::testing::{at, lead, message, FakeBackend};
    use paveos_api::LeadStatus;
    use paveos_realtime::{ClientEvent, Loopback, MessageRead, SocketConfig};
    use serde_json::json;
    use tokio::sync::mpsc;

    struct Harness {
        backend: Arc<FakeBackend>,
        sockets: ConnectionManager,
        link: Loopback,
        notifications: mpsc::UnboundedReceiver<Notification>,
        notifier: Notifier,
    }

    fn harness() -> Harness {
        let mut l1 = lead("L1", LeadStatus::InConversation, Some(500.0));
        l1.discord_user_id = Some("987".to_string());
        let backend = Arc::new(FakeBackend::with_leads(vec![
            l1,
            lead("L2", LeadStatus::New, None),
        ]));
        backend.set_messages(
            "L1",
            vec![
                message("m3", "L1", MessageDirection::Incoming, 30, false),
                message("m1", "L1", MessageDirection::Outgoing, 10, true),
                message("m2", "L1", MessageDirection::Incoming, 20, false),
            ],
        );

        let sockets = ConnectionManager::new(SocketConfig::new("http://localhost:5000"));
        let link = sockets.loopback("u1");
        link.connect();
        let (notifier, notifications) = Notifier::channel();

        Harness {
            backend,
            sockets,
            link,
            notifications,
            notifier,
        }
    }

    impl Harness {
        async fn open(&self, lead_id: &str) -> LeadConversation {
            LeadConversation::open(
                self.backend.clone(),
                self.sockets.clone(),
                lead_id,
                self.notifier.clone(),
            )
            .await
            .unwrap()
        }

        fn drain(&mut self) -> Vec<Notification> {
            let mut out = Vec::new();
            while let Ok(n) = self.notifications.try_recv() {
                out.push(n);
            }
            out
        }
    }

    fn ids(conversation: &LeadConversation) -> Vec<&str> {
        conversation.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_open_sorts_and_marks_unread_read() {
        let h = harness();
        let conversation = h.open("L1").await;

        assert_eq!(ids(&conversation), vec!["m1", "m2", "m3"]);
        assert_eq!(*h.backend.read_calls.lock(), vec!["m2", "m3"]);
        assert!(conversation.messages().iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn test_failed_mark_read_does_not_stop_batch() {
        let h = harness();
        h.backend.fail_reads.lock().insert("m2".to_string());
        let conversation = h.open("L1").await;

        assert_eq!(*h.backend.read_calls.lock(), vec!["m2", "m3"]);
        let m2 = conversation.messages().iter().find(|m| m.id == "m2").unwrap();
        assert!(!m2.is_read);
    }

    #[tokio::test]
    async fn test_open_joins_lead_then_discord_room() {
        let h = harness();
        let _conversation = h.open("L1").await;

        let emitted = h.link.emitted();
        assert_eq!(
            &emitted[1..],
            &[
                ClientEvent::LeadJoin {
                    lead_id: "L1".into()
                },
                ClientEvent::DiscordJoin {
                    discord_user_id: "987".into(),
                    lead_id: "L1".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_open_while_disconnected_joins_rooms_on_connect() {
        let h = harness();
        h.link.disconnect();
        h.link.clear();

        let conversation = h.open("L1").await;
        assert_eq!(ids(&conversation), vec!["m1", "m2", "m3"]);
        assert!(h.link.emitted().is_empty());

        h.link.connect();
        assert_eq!(
            h.link.emitted(),
            vec![
                ClientEvent::JoinUser {
                    user_id: "u1".into()
                },
                ClientEvent::LeadJoin {
                    lead_id: "L1".into()
                },
                ClientEvent::DiscordJoin {
                    discord_user_id: "987".into(),
                    lead_id: "L1".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_lead_without_discord_identity_joins_only_lead_room() {
        let h = harness();
        let _conversation = h.open("L2").await;
        assert_eq!(h.sockets.active_rooms(), vec![Room::lead("L2")]);
    }

    #[tokio::test]
    async fn test_open_unknown_lead_fails_and_leaves_room() {
        let mut h = harness();
        let result = LeadConversation::open(
            h.backend.clone(),
            h.sockets.clone(),
            "missing",
            h.notifier.clone(),
        )
        .await;

        assert!(result.is_err());
        assert!(h.sockets.active_rooms().is_empty());
        assert_eq!(h.drain()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_duplicate_messages_are_kept_once() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        let event = ServerEvent::NewMessage(message("m4", "L1", MessageDirection::Incoming, 40, false));
        assert!(conversation.apply(&event));
        assert!(!conversation.apply(&event));
        let resend = ServerEvent::NewMessage(message("m2", "L1", MessageDirection::Incoming, 20, false));
        assert!(!conversation.apply(&resend));

        assert_eq!(ids(&conversation), vec!["m1", "m2", "m3", "m4"]);
        assert_eq!(h.drain(), vec![Notification::success("New message from buyer42")]);
    }

    #[tokio::test]
    async fn test_late_message_is_inserted_in_order() {
        let h = harness();
        let mut conversation = h.open("L1").await;

        let late = message("m15", "L1", MessageDirection::Incoming, 15, false);
        conversation.apply(&ServerEvent::NewMessage(late));
        let tie = message("m2b", "L1", MessageDirection::Incoming, 20, false);
        conversation.apply(&ServerEvent::NewMessage(tie));

        assert_eq!(ids(&conversation), vec!["m1", "m15", "m2", "m2b", "m3"]);
        assert!(conversation
            .messages()
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_outgoing_message_does_not_notify() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        let mut outgoing = message("m9", "L1", MessageDirection::Outgoing, 90, true);
        outgoing.author_username = None;
        assert!(conversation.apply(&ServerEvent::NewMessage(outgoing)));
        assert!(h.drain().is_empty());
    }

    #[tokio::test]
    async fn test_incoming_without_author_names_user() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        let mut incoming = message("m9", "L1", MessageDirection::Incoming, 90, false);
        incoming.author_username = None;
        conversation.apply(&ServerEvent::NewMessage(incoming));
        assert_eq!(h.drain(), vec![Notification::success("New message from User")]);
    }

    #[tokio::test]
    async fn test_events_for_other_leads_are_ignored() {
        let mut h = harness();
        let mut conversation = h.open("L2").await;
        h.drain();
        let before = conversation.messages().to_vec();
        let lead_before = conversation.lead().clone();

        let foreign = ServerEvent::NewMessage(message("x1", "L1", MessageDirection::Incoming, 5, false));
        assert!(!conversation.apply(&foreign));
        assert!(!conversation.apply(&ServerEvent::LeadUpdated(LeadPatch {
            id: "L1".into(),
            fields: json!({"status": "won"}).as_object().unwrap().clone(),
        })));

        assert_eq!(conversation.messages(), before.as_slice());
        assert_eq!(conversation.lead(), &lead_before);
        assert!(h.drain().is_empty());
    }

    #[tokio::test]
    async fn test_message_read_event_flags_message() {
        let h = harness();
        let mut conversation = h.open("L1").await;
        let event = ServerEvent::NewMessage(message("m4", "L1", MessageDirection::Incoming, 40, false));
        conversation.apply(&event);

        let read = ServerEvent::MessageRead(MessageRead {
            lead_id: "L1".into(),
            message_id: "m4".into(),
        });
        assert!(conversation.apply(&read));
        assert!(conversation.messages().last().unwrap().is_read);
        assert!(!conversation.apply(&read));
    }

    #[tokio::test]
    async fn test_lead_update_merges_fields_and_notifies() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        let patch = LeadPatch {
            id: "L1".into(),
            fields: json!({"_id": "L1", "status": "won", "actualValue": 750.0})
                .as_object()
                .unwrap()
                .clone(),
        };
        assert!(conversation.apply(&ServerEvent::LeadUpdated(patch)));

        assert_eq!(conversation.lead().status, LeadStatus::Won);
        assert_eq!(conversation.lead().actual_value, Some(750.0));
        assert_eq!(conversation.lead().name, "Lead L1");
        assert_eq!(h.drain(), vec![Notification::success("Lead updated")]);
    }

    #[tokio::test]
    async fn test_linking_discord_identity_joins_room() {
        let h = harness();
        let mut conversation = h.open("L2").await;

        let patch = LeadPatch {
            id: "L2".into(),
            fields: json!({"discordUserId": "555"}).as_object().unwrap().clone(),
        };
        conversation.apply(&ServerEvent::LeadUpdated(patch));

        assert_eq!(
            h.sockets.active_rooms(),
            vec![Room::lead("L2"), Room::discord("555", "L2")]
        );
    }

    #[tokio::test]
    async fn test_next_event_applies_delivered_events() {
        let h = harness();
        let mut conversation = h.open("L1").await;

        h.link.deliver(ServerEvent::NewMessage(message(
            "m4",
            "L1",
            MessageDirection::Incoming,
            40,
            false,
        )));
        let applied = conversation.next_event().await;
        assert!(matches!(applied, Some(ServerEvent::NewMessage(_))));

        h.link.deliver(ServerEvent::NewMessage(message(
            "x1",
            "L2",
            MessageDirection::Incoming,
            40,
            false,
        )));
        assert!(conversation.next_event().await.is_none());
        assert_eq!(conversation.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_send_success_clears_draft() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        conversation.set_draft("Still interested?");
        conversation.send_message().await.unwrap();

        assert_eq!(conversation.draft(), "");
        assert!(!conversation.is_sending());
        assert_eq!(
            *h.backend.sent.lock(),
            vec![SendMessage::direct("987", "Still interested?")]
        );
        assert_eq!(h.drain(), vec![Notification::success("Message sent!")]);
        // The sent message only appears once the server echoes it.
        assert_eq!(conversation.messages().len(), 3);
    }

    #[tokio::test]
    async fn test_send_failure_keeps_draft() {
        let mut h = harness();
        *h.backend.fail_sends.lock() = true;
        let mut conversation = h.open("L1").await;
        h.drain();

        conversation.set_draft("hello?");
        assert!(conversation.send_message().await.is_err());

        assert_eq!(conversation.draft(), "hello?");
        assert!(!conversation.is_sending());
        assert_eq!(h.drain(), vec![Notification::error("boom")]);
    }

    #[tokio::test]
    async fn test_send_validation_sends_nothing() {
        let mut h = harness();
        let mut with_identity = h.open("L1").await;
        with_identity.set_draft("   ");
        assert!(matches!(
            with_identity.send_message().await,
            Err(ViewError::Validation(_))
        ));

        let mut without_identity = h.open("L2").await;
        without_identity.set_draft("hi");
        assert!(without_identity.send_message().await.is_err());

        assert!(h.backend.sent.lock().is_empty());
        assert!(h
            .drain()
            .iter()
            .all(|n| *n == Notification::error("Please enter a message")));
    }

    #[tokio::test]
    async fn test_update_lead_adopts_server_record() {
        let mut h = harness();
        let mut conversation = h.open("L1").await;
        h.drain();

        let update = LeadUpdate {
            notes: Some("call on friday".into()),
            ..Default::default()
        };
        let lead = conversation.update_lead(&update).await.unwrap();
        assert_eq!(lead.notes.as_deref(), Some("call on friday"));
        assert_eq!(lead.updated_at, at(60));
        assert_eq!(h.drain(), vec![Notification::success("Lead updated successfully")]);
    }

    #[tokio::test]
    async fn test_close_leaves_rooms() {
        let h = harness();
        let conversation = h.open("L1").await;
        h.link.clear();

        conversation.close();

        assert!(h.sockets.active_rooms().is_empty());
        let emitted = h.link.emitted();
        assert!(emitted.contains(&ClientEvent::LeadLeave {
            lead_id: "L1".into()
        }));
        assert!(emitted.contains(&ClientEvent::DiscordLeave {
            discord_user_id: "987".into(),
            lead_id: "L1".into()
        }));
    }

    #[tokio::test]
    async fn test_reopen_does_not_duplicate_listeners() {
        let h = harness();
        let first = h.open("L1").await;
        first.close();
        let mut second = h.open("L1").await;

        h.link.deliver(ServerEvent::NewMessage(message(
            "m4",
            "L1",
            MessageDirection::Incoming,
            40,
            false,
        )));
        assert!(second.next_event().await.is_some());
        assert_eq!(second.messages().len(), 4);
        assert_eq!(h.sockets.active_rooms().len(), 2);
    }
}
