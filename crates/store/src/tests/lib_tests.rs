use super::*;

#[derive(Debug, Clone, PartialEq, Default)]
struct Session {
    name: String,
    signed_in: bool,
}

enum SessionAction {
    SignIn(String),
    SignOut,
}

fn session_store() -> MemoryStore<Session, SessionAction> {
    MemoryStore::new(Session::default(), |state, action| match action {
        SessionAction::SignIn(name) => {
            state.name = name;
            state.signed_in = true;
        }
        SessionAction::SignOut => *state = Session::default(),
    })
}

#[test]
fn dispatch_runs_reducer() {
    let store = session_store();
    store.dispatch(SessionAction::SignIn("ada".into()));
    let state = store.state();
    assert!(state.app.signed_in);
    assert_eq!(state.app.name, "ada");
}

#[test]
fn subscriber_gets_current_value_then_distinct_changes() {
    let store = session_store();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.subscribe(|state| state.app.signed_in, move |signed_in| {
        sink.borrow_mut().push(signed_in)
    });

    store.dispatch(SessionAction::SignIn("ada".into()));
    store.dispatch(SessionAction::SignIn("grace".into()));
    store.dispatch(SessionAction::SignOut);

    assert_eq!(*seen.borrow(), vec![false, true, false]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let store = session_store();
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let id = store.subscribe(|state| state.app.name.clone(), move |_| {
        counter.set(counter.get() + 1)
    });

    store.dispatch(SessionAction::SignIn("ada".into()));
    store.unsubscribe(id);
    store.dispatch(SessionAction::SignIn("grace".into()));

    assert_eq!(count.get(), 2);
}

#[test]
fn unknown_id_outside_a_round_is_not_remembered() {
    let store = session_store();
    store.unsubscribe(42);
    assert!(store.inner.borrow().unsubscribed.is_empty());
}

#[test]
fn subscriber_can_unsubscribe_itself_mid_round() {
    let store = session_store();
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let own_id = Rc::new(Cell::new(None));
    let id_slot = own_id.clone();
    let detaching = store.clone();
    let id = store.subscribe(|state| state.app.signed_in, move |signed_in| {
        counter.set(counter.get() + 1);
        if signed_in {
            if let Some(id) = id_slot.get() {
                detaching.unsubscribe(id);
            }
        }
    });
    own_id.set(Some(id));

    store.dispatch(SessionAction::SignIn("ada".into()));
    store.dispatch(SessionAction::SignOut);

    assert_eq!(count.get(), 2);
    assert!(store.inner.borrow().unsubscribed.is_empty());
}

#[test]
fn set_route_applies_action_and_publishes() {
    let store = session_store();
    let receiver = store.subscribe_route();

    store.set_route(RouteAction::Goto(Route::from(["auth", "signIn"])));
    store.set_route(RouteAction::Push(Route::from(["fp"])));

    assert_eq!(store.route(), Route::from(["auth", "signIn", "fp"]));
    assert_eq!(*receiver.borrow(), store.route());
}

#[test]
fn dispatch_from_subscriber_is_applied_after_current_round() {
    let store = session_store();
    let observed = Rc::new(RefCell::new(Vec::new()));

    let reentrant = store.clone();
    let sink = observed.clone();
    store.subscribe(
        |state| state.route.clone(),
        move |route: Route| {
            sink.borrow_mut().push(route.to_string());
            if route.last() == Some("signIn") {
                reentrant.set_route(RouteAction::Push(Route::from(["fp"])));
            }
        },
    );

    store.set_route(RouteAction::Goto(Route::from(["auth", "signIn"])));

    assert_eq!(
        *observed.borrow(),
        vec![
            "".to_string(),
            "auth/signIn".to_string(),
            "auth/signIn/fp".to_string()
        ]
    );
    assert_eq!(store.route(), Route::from(["auth", "signIn", "fp"]));
}

#[tokio::test]
async fn route_receiver_wakes_on_change() {
    let store = session_store();
    let mut receiver = store.subscribe_route();

    store.set_route(RouteAction::Goto(Route::from(["catalog"])));
    receiver.changed().await.expect("sender alive");
    assert_eq!(*receiver.borrow_and_update(), Route::from(["catalog"]));
}
