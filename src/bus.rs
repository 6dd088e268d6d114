use crate::events::{Event, NotificationEvent, NotificationSink};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) -> Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }
}

impl NotificationSink for EventBus {
    fn notify(&self, event: NotificationEvent) {
        // No subscribers is fine: nobody is looking at the dashboard.
        self.publish(Event::Notification(event)).ok();
    }

    fn refresh(&self) {
        self.publish(Event::Refresh).ok();
    }
}
