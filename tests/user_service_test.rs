//! User service tests against a real SQLite database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use hdm_boot::domain::{EventEnvelope, User, UserRole, UserStatus};
use hdm_boot::errors::{AppError, AppResult};
use hdm_boot::infra::{Database, Persistence};
use hdm_boot::services::{EventDispatcher, EventListener, NewUser, UserChanges, UserManager, UserService};
use hdm_boot::types::{PaginationParams, UserFilter};

/// Remembers the name of every event it sees
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventListener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn handle(&self, event: &EventEnvelope) -> AppResult<()> {
        self.seen.lock().unwrap().push(event.event.name().to_string());
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    service: UserManager<Persistence>,
    recorder: Arc<Recorder>,
    admin: User,
}

async fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("users.db").display());
    let db = Database::connect(&url).await.unwrap();

    let recorder = Arc::new(Recorder::default());
    let events = Arc::new(EventDispatcher::new());
    for name in ["user.created", "user.updated", "user.deleted", "user.password_changed"] {
        events.subscribe(name, recorder.clone());
    }

    let service = UserManager::new(Arc::new(Persistence::new(db.get_connection())), events);
    let admin = service
        .create_user(None, new_user("root@example.com", "Root", UserRole::Admin))
        .await
        .unwrap();

    Fixture {
        _dir: dir,
        service,
        recorder,
        admin,
    }
}

fn new_user(email: &str, name: &str, role: UserRole) -> NewUser {
    NewUser {
        email: email.to_string(),
        password: "Secret123".to_string(),
        name: name.to_string(),
        role,
    }
}

#[tokio::test]
async fn test_create_normalizes_and_rejects_duplicates() {
    let f = setup().await;

    let user = f
        .service
        .create_user(Some(&f.admin), new_user("  Mixed@Example.COM ", "Mixed", UserRole::User))
        .await
        .unwrap();
    assert_eq!(user.email, "mixed@example.com");
    assert_eq!(user.status, UserStatus::Active);

    let err = f
        .service
        .create_user(Some(&f.admin), new_user("mixed@example.com", "Again", UserRole::User))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let weak = f
        .service
        .create_user(
            Some(&f.admin),
            NewUser {
                password: "alllowercase".to_string(),
                ..new_user("weak@example.com", "Weak", UserRole::User)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(weak, AppError::Validation(_)));
}

#[tokio::test]
async fn test_editor_cannot_grant_roles() {
    let f = setup().await;
    let editor = f
        .service
        .create_user(None, new_user("ed@example.com", "Ed", UserRole::Editor))
        .await
        .unwrap();

    let err = f
        .service
        .create_user(Some(&editor), new_user("x@example.com", "X", UserRole::User))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let f = setup().await;
    for (email, name, role) in [
        ("anna@example.com", "Anna Editor", UserRole::Editor),
        ("boris@example.com", "Boris", UserRole::User),
        ("cyril@example.com", "Cyril", UserRole::User),
    ] {
        f.service
            .create_user(Some(&f.admin), new_user(email, name, role))
            .await
            .unwrap();
    }

    let all = f
        .service
        .list_users(&f.admin, UserFilter::default(), PaginationParams::new(1, 3))
        .await
        .unwrap();
    assert_eq!(all.meta.total, 4);
    assert_eq!(all.meta.total_pages, 2);
    assert_eq!(all.data.len(), 3);

    let users = f
        .service
        .list_users(
            &f.admin,
            UserFilter {
                role: Some("user".into()),
                ..Default::default()
            },
            PaginationParams::new(1, 20),
        )
        .await
        .unwrap();
    assert_eq!(users.meta.total, 2);

    let search = f
        .service
        .list_users(
            &f.admin,
            UserFilter {
                search: Some("editor".into()),
                ..Default::default()
            },
            PaginationParams::new(1, 20),
        )
        .await
        .unwrap();
    assert_eq!(search.data.len(), 1);
    assert_eq!(search.data[0].email, "anna@example.com");

    let bad = f
        .service
        .list_users(
            &f.admin,
            UserFilter {
                role: Some("owner".into()),
                ..Default::default()
            },
            PaginationParams::new(1, 20),
        )
        .await
        .unwrap_err();
    assert!(matches!(bad, AppError::Validation(_)));
}

#[tokio::test]
async fn test_role_and_status_changes() {
    let f = setup().await;
    let user = f
        .service
        .create_user(Some(&f.admin), new_user("promote@example.com", "Pro", UserRole::User))
        .await
        .unwrap();

    let promoted = f
        .service
        .update_user(
            &f.admin,
            user.id,
            UserChanges {
                role: Some(UserRole::Editor),
                status: Some(UserStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Editor);
    assert_eq!(promoted.status, UserStatus::Inactive);

    // Users may rename themselves but not promote themselves
    let renamed = f
        .service
        .update_user(
            &promoted,
            promoted.id,
            UserChanges {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Renamed");

    let err = f
        .service
        .update_user(
            &f.admin,
            f.admin.id,
            UserChanges {
                role: Some(UserRole::User),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stats = f.service.statistics(&f.admin).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_role["editor"], 1);
    assert_eq!(stats.by_status["inactive"], 1);
}

#[tokio::test]
async fn test_delete_and_password_change() {
    let f = setup().await;
    let user = f
        .service
        .create_user(Some(&f.admin), new_user("temp@example.com", "Temp", UserRole::User))
        .await
        .unwrap();

    f.service
        .change_password(&user, user.id, Some("Secret123".into()), "Changed123".into())
        .await
        .unwrap();
    // Admins reset without knowing the current password
    f.service
        .change_password(&f.admin, user.id, None, "Reset1234".into())
        .await
        .unwrap();

    let own = f.service.delete_user(&f.admin, f.admin.id).await.unwrap_err();
    assert!(matches!(own, AppError::Conflict(_)));

    f.service.delete_user(&f.admin, user.id).await.unwrap();
    assert!(matches!(
        f.service.get_user(user.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        f.service.delete_user(&f.admin, Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));

    assert_eq!(
        f.recorder.seen(),
        vec![
            "user.created",
            "user.created",
            "user.password_changed",
            "user.password_changed",
            "user.deleted"
        ]
    );
}
