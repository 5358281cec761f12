//! The visual side of navigation.
//!
//! Coordinators never draw. They hand opaque [`ViewHandle`]s to a [`Stage`],
//! which performs (and animates) presentation, dismissal, stack and container
//! changes. [`HeadlessStage`] is the in-process implementation used by the
//! demo app and the tests: it only records what it was asked to do.

use std::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use shared::ViewId;
use tracing::debug;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to something displayable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewHandle {
    id: ViewId,
    name: String,
}

impl ViewHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ViewId(NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Each method resolves once the visual effect (animation included) is over.
#[async_trait(?Send)]
pub trait Stage {
    async fn present_modal(&self, parent: &ViewHandle, modal: &ViewHandle);
    async fn dismiss_modal(&self, modal: &ViewHandle);
    async fn set_stack(&self, stack: &ViewHandle, views: &[ViewHandle], animated: bool);
    async fn replace_child(
        &self,
        container: &ViewHandle,
        old: Option<&ViewHandle>,
        new: Option<&ViewHandle>,
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StageEvent {
    ModalPresented {
        parent: ViewHandle,
        modal: ViewHandle,
    },
    ModalDismissed {
        modal: ViewHandle,
    },
    StackSet {
        stack: ViewHandle,
        views: Vec<ViewHandle>,
        animated: bool,
    },
    ChildReplaced {
        container: ViewHandle,
        old: Option<ViewHandle>,
        new: Option<ViewHandle>,
    },
}

#[derive(Default)]
pub struct HeadlessStage {
    transition_delay: Duration,
    journal: RefCell<Vec<StageEvent>>,
    modals: RefCell<Vec<ViewHandle>>,
}

impl HeadlessStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transition_delay(transition_delay: Duration) -> Self {
        Self {
            transition_delay,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<StageEvent> {
        self.journal.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<StageEvent> {
        std::mem::take(&mut *self.journal.borrow_mut())
    }

    /// Modals currently on screen, oldest first.
    pub fn presented_modals(&self) -> Vec<ViewHandle> {
        self.modals.borrow().clone()
    }

    async fn animate(&self, animated: bool) {
        if !animated || self.transition_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.transition_delay).await;
        }
    }

    fn record(&self, event: StageEvent) {
        debug!(?event, "stage: transition finished");
        self.journal.borrow_mut().push(event);
    }
}

#[async_trait(?Send)]
impl Stage for HeadlessStage {
    async fn present_modal(&self, parent: &ViewHandle, modal: &ViewHandle) {
        self.animate(true).await;
        self.modals.borrow_mut().push(modal.clone());
        self.record(StageEvent::ModalPresented {
            parent: parent.clone(),
            modal: modal.clone(),
        });
    }

    async fn dismiss_modal(&self, modal: &ViewHandle) {
        self.animate(true).await;
        self.modals.borrow_mut().retain(|shown| shown != modal);
        self.record(StageEvent::ModalDismissed {
            modal: modal.clone(),
        });
    }

    async fn set_stack(&self, stack: &ViewHandle, views: &[ViewHandle], animated: bool) {
        self.animate(animated).await;
        self.record(StageEvent::StackSet {
            stack: stack.clone(),
            views: views.to_vec(),
            animated,
        });
    }

    async fn replace_child(
        &self,
        container: &ViewHandle,
        old: Option<&ViewHandle>,
        new: Option<&ViewHandle>,
    ) {
        self.animate(true).await;
        self.record(StageEvent::ChildReplaced {
            container: container.clone(),
            old: old.cloned(),
            new: new.cloned(),
        });
    }
}
