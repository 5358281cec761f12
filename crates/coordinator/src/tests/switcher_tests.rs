use super::*;
use crate::{
    completion::channel,
    stage::StageEvent,
    test_support::{drain, headless, journal, run_local, settle, Journal, RecordingCoordinator},
};

fn scenes(context: NavigationContext, journal: &Journal) -> Rc<SceneCoordinator> {
    let entries = ["auth", "catalog"]
        .into_iter()
        .map(|prefix| {
            let journal = journal.clone();
            SceneEntry::new(prefix, move || {
                Ok(RecordingCoordinator::new(prefix, &journal) as SharedCoordinator)
            })
        })
        .collect();
    SceneCoordinator::new("app", context, entries)
}

async fn set(scenes: &SceneCoordinator, target: Option<Route>) {
    let (done, transition) = channel("test.set_route");
    scenes.set_route(target, done);
    transition.await.expect("set_route completes");
}

#[tokio::test]
async fn start_without_route_selects_the_first_scene() {
    run_local(async {
        let journal = journal();
        let (context, stage) = headless();
        let mut events = context.subscribe_events();
        let scenes = scenes(context, &journal);

        scenes.start(None);
        settle().await;

        assert_eq!(scenes.current_scene().as_deref(), Some("auth"));
        assert_eq!(scenes.route(), Route::from(["auth"]));
        assert_eq!(*journal.borrow(), vec!["auth.start()"]);
        assert!(matches!(
            stage.events().as_slice(),
            [StageEvent::ChildReplaced { old: None, new: Some(_), .. }]
        ));
        assert_eq!(
            drain(&mut events),
            vec![NavigationEvent::SceneChanged {
                coordinator: "app".into(),
                scene: "auth".into(),
            }]
        );
    })
    .await;
}

#[tokio::test]
async fn same_scene_delegates_the_rest() {
    run_local(async {
        let journal = journal();
        let (context, _) = headless();
        let scenes = scenes(context, &journal);
        scenes.start(Some(Route::from(["auth", "signIn"])));
        settle().await;
        let before = scenes.current_coordinator().expect("auth").root_view();

        set(&scenes, Some(Route::from(["auth", "signUp"]))).await;

        let after = scenes.current_coordinator().expect("auth").root_view();
        assert_eq!(before, after);
        assert_eq!(scenes.route(), Route::from(["auth", "signUp"]));
        assert_eq!(
            *journal.borrow(),
            vec!["auth.start(signIn)", "auth.set_route(signUp)"]
        );
    })
    .await;
}

#[tokio::test]
async fn other_prefix_replaces_the_scene() {
    run_local(async {
        let journal = journal();
        let (context, stage) = headless();
        let scenes = scenes(context, &journal);
        scenes.start(Some(Route::from(["auth"])));
        settle().await;
        let auth_view = scenes.current_coordinator().expect("auth").root_view();
        stage.take_events();

        set(&scenes, Some(Route::from(["catalog", "item"]))).await;

        assert_eq!(scenes.current_scene().as_deref(), Some("catalog"));
        assert_eq!(scenes.route(), Route::from(["catalog", "item"]));
        match stage.events().as_slice() {
            [StageEvent::ChildReplaced { old, new, .. }] => {
                assert_eq!(old.as_ref(), Some(&auth_view));
                assert_eq!(new.as_ref().map(|view| view.name()), Some("catalog"));
            }
            other => panic!("unexpected stage events: {other:?}"),
        }
    })
    .await;
}

#[tokio::test]
async fn unknown_prefix_is_ignored() {
    run_local(async {
        let journal = journal();
        let (context, _) = headless();
        let mut events = context.subscribe_events();
        let scenes = scenes(context, &journal);
        scenes.start(Some(Route::from(["auth"])));
        settle().await;
        drain(&mut events);

        set(&scenes, Some(Route::from(["settings", "x"]))).await;

        assert_eq!(scenes.current_scene().as_deref(), Some("auth"));
        assert!(matches!(
            drain(&mut events).as_slice(),
            [NavigationEvent::UnroutableSegment { segment, .. }] if segment == "settings"
        ));
    })
    .await;
}

#[tokio::test]
async fn nil_route_clears_the_container() {
    run_local(async {
        let journal = journal();
        let (context, stage) = headless();
        let scenes = scenes(context, &journal);
        scenes.start(Some(Route::from(["auth"])));
        settle().await;

        set(&scenes, None).await;

        assert!(scenes.current_scene().is_none());
        assert!(scenes.route().is_empty());
        assert!(matches!(
            stage.events().last(),
            Some(StageEvent::ChildReplaced { new: None, .. })
        ));
    })
    .await;
}

#[tokio::test]
async fn failing_factory_keeps_the_current_scene() {
    run_local(async {
        let journal = journal();
        let (context, _) = headless();
        let recording = journal.clone();
        let scenes = SceneCoordinator::new(
            "app",
            context,
            vec![
                SceneEntry::new("auth", move || {
                    Ok(RecordingCoordinator::new("auth", &recording) as SharedCoordinator)
                }),
                SceneEntry::new("broken", || {
                    Err(NavigationError::DuplicateTag {
                        tag: "fp".to_string(),
                    })
                }),
            ],
        );
        scenes.start(None);
        settle().await;

        set(&scenes, Some(Route::from(["broken"]))).await;
        assert_eq!(scenes.current_scene().as_deref(), Some("auth"));
    })
    .await;
}

#[tokio::test]
async fn route_during_a_switch_reaches_the_scene_being_built() {
    run_local(async {
        let journal = journal();
        let (context, stage) = headless();
        let mut events = context.subscribe_events();
        let scenes = scenes(context, &journal);

        scenes.start(Some(Route::from(["auth", "signIn"])));
        set(&scenes, Some(Route::from(["auth", "signUp"]))).await;

        assert_eq!(
            *journal.borrow(),
            vec!["auth.start(signIn)", "auth.set_route(signUp)"]
        );
        assert_eq!(scenes.route(), Route::from(["auth", "signUp"]));
        let installed: Vec<StageEvent> = stage
            .events()
            .into_iter()
            .filter(|event| matches!(event, StageEvent::ChildReplaced { .. }))
            .collect();
        assert_eq!(installed.len(), 1);
        assert!(drain(&mut events).iter().any(|event| matches!(
            event,
            NavigationEvent::RouteQueued { depth: 1, .. }
        )));
    })
    .await;
}

#[tokio::test]
async fn queued_scene_switches_apply_in_order() {
    run_local(async {
        let journal = journal();
        let (context, _) = headless();
        let scenes = scenes(context, &journal);
        scenes.start(Some(Route::from(["auth"])));

        let (first, first_done) = channel("catalog");
        let (second, second_done) = channel("auth again");
        scenes.set_route(Some(Route::from(["catalog", "item"])), first);
        scenes.set_route(Some(Route::from(["auth", "signUp"])), second);
        first_done.await.expect("first completes");
        second_done.await.expect("second completes");

        assert_eq!(scenes.current_scene().as_deref(), Some("auth"));
        assert_eq!(scenes.route(), Route::from(["auth", "signUp"]));
        assert_eq!(
            *journal.borrow(),
            vec!["auth.start()", "catalog.start(item)", "auth.start(signUp)"]
        );
    })
    .await;
}
