//! The sign-in / forgot-password / catalog prototype.
//!
//! ```text
//! app (scenes)
//! ├── auth     presenting: stack [signIn | signUp], modal "fp": stack [fp, sent]
//! └── catalog  presenting: stack [list, item],      modal "help": stack [help]
//! ```

use std::rc::{Rc, Weak};

use coordinator::{
    GeneratingScene, HeadlessStage, NavigationContext, PresentingCoordinator, SceneCoordinator,
    SceneEntry, SharedCoordinator, StackCoordinator, StackEntry,
};
use shared::{NavigationError, Route, RouteAction};
use store::{MemoryStore, RouteStore};
use tracing::info;

use crate::config::Settings;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub user: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppAction {
    SignIn(String),
    SignOut,
}

pub fn reduce(state: &mut AppState, action: AppAction) {
    match action {
        AppAction::SignIn(user) => state.user = Some(user),
        AppAction::SignOut => state.user = None,
    }
}

pub type AppStore = MemoryStore<AppState, AppAction>;

pub fn signed_in_route() -> Route {
    Route::from(["catalog", "list"])
}

pub fn signed_out_route() -> Route {
    Route::from(["auth", "signIn"])
}

pub struct Prototype {
    pub store: Rc<AppStore>,
    pub stage: Rc<HeadlessStage>,
    pub context: NavigationContext,
    pub root: Rc<SceneCoordinator>,
}

impl Prototype {
    pub fn build(settings: &Settings) -> Self {
        let store = Rc::new(AppStore::with_route(
            AppState::default(),
            settings.initial_route(),
            reduce,
        ));
        let stage = Rc::new(HeadlessStage::with_transition_delay(
            settings.transition_delay(),
        ));
        let context = NavigationContext::new(stage.clone()).with_store(store.clone());

        redirect_on_session_change(&store);

        let root = SceneCoordinator::new(
            "app",
            context.clone(),
            vec![auth_scene(&context), catalog_scene(&context)],
        );

        Self {
            store,
            stage,
            context,
            root,
        }
    }

    pub fn sign_in(&self, user: impl Into<String>) {
        self.store.dispatch(AppAction::SignIn(user.into()));
    }

    pub fn sign_out(&self) {
        self.store.dispatch(AppAction::SignOut);
    }
}

/// Moves between the auth and catalog scenes when the session starts or ends.
fn redirect_on_session_change(store: &Rc<AppStore>) {
    let weak: Weak<AppStore> = Rc::downgrade(store);
    let mut initial = true;
    store.subscribe(
        |state| state.app.user.clone(),
        move |user| {
            if std::mem::take(&mut initial) {
                return;
            }
            let Some(store) = weak.upgrade() else {
                return;
            };
            let target = match &user {
                Some(user) => {
                    info!(user = %user, "app: signed in");
                    signed_in_route()
                }
                None => {
                    info!("app: signed out");
                    signed_out_route()
                }
            };
            store.set_route(RouteAction::Goto(target));
        },
    );
}

fn auth_scene(context: &NavigationContext) -> SceneEntry {
    let context = context.clone();
    SceneEntry::new("auth", move || -> Result<SharedCoordinator, NavigationError> {
        let root = StackCoordinator::new(
            "auth.stack",
            context.clone(),
            vec![StackEntry::named("signIn"), StackEntry::named("signUp")],
        );
        let forgot_password = stack_scene("fp", &context, &["fp", "sent"]);
        let auth = PresentingCoordinator::new("auth", context.clone(), root, vec![forgot_password])?;
        Ok(auth)
    })
}

fn catalog_scene(context: &NavigationContext) -> SceneEntry {
    let context = context.clone();
    SceneEntry::new("catalog", move || -> Result<SharedCoordinator, NavigationError> {
        let root = StackCoordinator::new(
            "catalog.stack",
            context.clone(),
            vec![StackEntry::named("list"), StackEntry::named("item")],
        );
        let help = stack_scene("help", &context, &["help"]);
        let catalog = PresentingCoordinator::new("catalog", context.clone(), root, vec![help])?;
        Ok(catalog)
    })
}

/// A presentable whose coordinator is a stack starting with its own tag.
fn stack_scene(
    tag: &'static str,
    context: &NavigationContext,
    segments: &'static [&'static str],
) -> GeneratingScene {
    let context = context.clone();
    GeneratingScene::new(tag, move || -> SharedCoordinator {
        StackCoordinator::new(
            tag,
            context.clone(),
            segments.iter().copied().map(StackEntry::named).collect(),
        )
    })
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
