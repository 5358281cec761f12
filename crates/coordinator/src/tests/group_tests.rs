use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    completion::channel,
    test_support::{run_local, settle},
};

fn counting(calls: &Rc<Cell<u32>>) -> Completion {
    let calls = calls.clone();
    Completion::new("group.done", move || calls.set(calls.get() + 1))
}

#[tokio::test]
async fn done_waits_for_every_leg() {
    run_local(async {
        let calls = Rc::new(Cell::new(0));
        let group = CompletionGroup::new("legs");
        let first = group.enter();
        let second = group.enter();
        assert_eq!(group.outstanding(), 2);
        group.notify(counting(&calls));

        settle().await;
        assert_eq!(calls.get(), 0);

        first.complete();
        settle().await;
        assert_eq!(calls.get(), 0);

        second.complete();
        settle().await;
        assert_eq!(calls.get(), 1);
    })
    .await;
}

#[tokio::test]
async fn legs_finished_before_notify_do_not_fire_early() {
    run_local(async {
        let calls = Rc::new(Cell::new(0));
        let group = CompletionGroup::new("eager");
        group.enter().complete();
        let late = group.enter();
        assert_eq!(group.outstanding(), 1);

        group.notify(counting(&calls));
        settle().await;
        assert_eq!(calls.get(), 0);

        late.complete();
        settle().await;
        assert_eq!(calls.get(), 1);
    })
    .await;
}

#[tokio::test]
async fn done_runs_on_a_later_turn() {
    run_local(async {
        let calls = Rc::new(Cell::new(0));
        let group = CompletionGroup::new("empty");
        assert_eq!(group.label(), "empty");

        group.notify(counting(&calls));
        assert_eq!(calls.get(), 0, "never synchronously inside notify");

        settle().await;
        assert_eq!(calls.get(), 1);
    })
    .await;
}

#[tokio::test]
async fn token_can_leave_from_another_thread() {
    run_local(async {
        let group = CompletionGroup::new("threaded");
        let token = group.enter_token();
        std::thread::spawn(move || token.leave())
            .join()
            .expect("worker thread");

        let (done, transition) = channel("threaded.done");
        group.notify(done);
        transition.await.expect("group completes");
    })
    .await;
}

#[tokio::test]
async fn dropped_token_counts_as_leaving() {
    run_local(async {
        let group = CompletionGroup::new("dropped");
        let token = group.enter_token();
        drop(token);
        assert_eq!(group.outstanding(), 0);

        let (done, transition) = channel("dropped.done");
        group.notify(done);
        transition.await.expect("group completes");
    })
    .await;
}
