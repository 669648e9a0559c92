use claim::{assert_none, assert_ok};
use fitness_gym::core::AppErrorType;
use fitness_gym::db::assignments;
use fitness_gym::models::assignments::{AssignmentStatus, CoachRequest};
use fitness_gym::models::notifications::NotificationType;
use fitness_gym::models::users::{AdminUpdateUserRequest, Role, UserStatus};
use fitness_gym::services::{admin, assignments as coaching};
use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::helpers::TestApp;

fn ask(coach_id: i64) -> CoachRequest {
    CoachRequest {
        client_id: None,
        coach_id,
    }
}

#[tokio::test]
async fn request_notifies_the_coach() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (coach_id, coach) = app.seed_coach().await;

    let assignment = coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Pending);
    assert_eq!(assignment.client_id, client.user_id);

    let inbox = coaching::list_notifications(&app.pool, &coach).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::CoachRequest);
    assert_eq!(inbox[0].origin_user_id, Some(client.user_id));

    let pending = coaching::list_pending_requests_for_coach(&app.pool, &coach, coach_id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].client_id, client.user_id);

    let status = coaching::get_coach_status(&app.pool, client.user_id).await.unwrap();
    assert!(status.pending_request);
    assert!(!status.has_coach);
}

#[tokio::test]
async fn second_request_while_pending_is_a_conflict() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (first_coach, _) = app.seed_coach().await;
    let (second_coach, _) = app.seed_coach().await;

    coaching::request_coach(&app.pool, &client, ask(first_coach)).await.unwrap();
    let error = coaching::request_coach(&app.pool, &client, ask(second_coach))
        .await
        .unwrap_err();

    assert_eq!(error.error_type, AppErrorType::ConflictError);
    assert_eq!(error.message(), "You already have a pending request");
    assert_eq!(app.open_assignments(client.user_id).await, 1);
}

#[tokio::test]
async fn accepting_notifies_the_client() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (coach_id, coach) = app.seed_coach().await;
    let (other_coach, _) = app.seed_coach().await;

    let request = coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();
    let accepted = coaching::accept_request(&app.pool, &coach, request.id).await.unwrap();
    assert_eq!(accepted.status, AssignmentStatus::Active);

    let inbox = coaching::list_notifications(&app.pool, &client).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification_type, NotificationType::CoachAssignment);

    let status = coaching::get_coach_status(&app.pool, client.user_id).await.unwrap();
    assert!(status.has_coach);
    assert_eq!(status.coach.unwrap().coach_id, coach_id);

    let clients = coaching::list_clients_for_coach(&app.pool, &coach, coach_id).await.unwrap();
    assert_eq!(clients.len(), 1);

    let error = coaching::request_coach(&app.pool, &client, ask(other_coach))
        .await
        .unwrap_err();
    assert_eq!(error.message(), "You already have an assigned coach");
}

#[tokio::test]
async fn requests_are_answered_once_and_only_by_their_coach() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (coach_id, coach) = app.seed_coach().await;
    let (_, intruder) = app.seed_coach().await;

    let request = coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();

    let error = coaching::accept_request(&app.pool, &intruder, request.id).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ForbiddenError);
    let error = coaching::list_clients_for_coach(&app.pool, &intruder, coach_id).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ForbiddenError);

    assert_ok!(coaching::reject_request(&app.pool, &coach, request.id).await);
    let error = coaching::accept_request(&app.pool, &coach, request.id).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ConflictError);
}

#[tokio::test]
async fn rejected_client_may_ask_again() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (coach_id, coach) = app.seed_coach().await;

    let request = coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();
    coaching::reject_request(&app.pool, &coach, request.id).await.unwrap();

    let status = coaching::get_coach_status(&app.pool, client.user_id).await.unwrap();
    assert!(!status.has_coach && !status.pending_request);
    assert_ok!(coaching::request_coach(&app.pool, &client, ask(coach_id)).await);
}

#[tokio::test]
async fn unknown_or_inactive_coaches_are_not_found() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let admin_user = app.seed_user(Role::Admin).await;
    let (coach_id, coach) = app.seed_coach().await;

    let error = coaching::request_coach(&app.pool, &client, ask(coach_id + 50)).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::NotFoundError);

    admin::deactivate_user(&app.pool, &admin_user, coach.user_id).await.unwrap();
    let error = coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::NotFoundError);
    assert!(coaching::list_available_coaches(&app.pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn deactivating_a_coach_closes_their_assignments() {
    let app = TestApp::spawn().await;
    let admin_user = app.seed_user(Role::Admin).await;
    let (coach_id, coach) = app.seed_coach().await;
    let (other_coach, _) = app.seed_coach().await;
    let active_client = app.seed_user(Role::Client).await;
    let waiting_client = app.seed_user(Role::Client).await;

    let request = coaching::request_coach(&app.pool, &active_client, ask(coach_id)).await.unwrap();
    coaching::accept_request(&app.pool, &coach, request.id).await.unwrap();
    coaching::request_coach(&app.pool, &waiting_client, ask(coach_id)).await.unwrap();

    admin::deactivate_user(&app.pool, &admin_user, coach.user_id).await.unwrap();

    for client in [&active_client, &waiting_client] {
        assert_none!(assignments::find_open_for_client(&app.pool, client.user_id).await.unwrap());
        assert_ok!(coaching::request_coach(&app.pool, client, ask(other_coach)).await);
    }
    let closed = assignments::find_assignment(&app.pool, request.id).await.unwrap().unwrap();
    assert_eq!(closed.status, AssignmentStatus::Inactive);
}

#[tokio::test]
async fn status_change_through_update_also_cascades() {
    let app = TestApp::spawn().await;
    let admin_user = app.seed_user(Role::Admin).await;
    let (coach_id, coach) = app.seed_coach().await;
    let client = app.seed_user(Role::Client).await;

    coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();

    let update = AdminUpdateUserRequest {
        status: Some(UserStatus::Inactive),
        ..Default::default()
    };
    admin::update_user(&app.pool, &admin_user, coach.user_id, update).await.unwrap();

    assert_eq!(app.open_assignments(client.user_id).await, 0);
}

#[tokio::test]
async fn notifications_are_marked_read_by_their_owner_only() {
    let app = TestApp::spawn().await;
    let client = app.seed_user(Role::Client).await;
    let (coach_id, coach) = app.seed_coach().await;

    coaching::request_coach(&app.pool, &client, ask(coach_id)).await.unwrap();
    let notification = coaching::list_notifications(&app.pool, &coach).await.unwrap().remove(0);
    assert!(!notification.is_read);

    let error = coaching::mark_notification_read(&app.pool, &client, notification.id)
        .await
        .unwrap_err();
    assert_eq!(error.error_type, AppErrorType::NotFoundError);

    assert_ok!(coaching::mark_notification_read(&app.pool, &coach, notification.id).await);
    let notification = coaching::list_notifications(&app.pool, &coach).await.unwrap().remove(0);
    assert!(notification.is_read);
}

#[tokio::test]
async fn coach_profile_shows_up_on_the_current_user() {
    let app = TestApp::spawn().await;
    let (coach_id, coach) = app.seed_coach().await;

    let current = fitness_gym::services::accounts::current_user(&app.pool, coach.user_id)
        .await
        .unwrap();
    assert_eq!(current.coach_profile.map(|profile| profile.id), Some(coach_id));
    assert!(current.membership.is_none());
}

#[derive(Debug, Clone, Copy)]
enum CoachingOp {
    Request { client: usize, coach: usize },
    AcceptLatest,
    RejectLatest,
}

impl Arbitrary for CoachingOp {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        match u8::arbitrary(g) % 3 {
            0 => CoachingOp::Request {
                client: usize::arbitrary(g) % 2,
                coach: usize::arbitrary(g) % 2,
            },
            1 => CoachingOp::AcceptLatest,
            _ => CoachingOp::RejectLatest,
        }
    }
}

fn at_most_one_open_assignment(ops: Vec<CoachingOp>) -> bool {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let app = TestApp::spawn().await;
        let clients = [app.seed_user(Role::Client).await, app.seed_user(Role::Client).await];
        let coaches = [app.seed_coach().await, app.seed_coach().await];
        let mut latest = None;

        for op in ops {
            match op {
                CoachingOp::Request { client, coach } => {
                    if let Ok(assignment) =
                        coaching::request_coach(&app.pool, &clients[client], ask(coaches[coach].0)).await
                    {
                        latest = Some((assignment.id, coach));
                    }
                }
                CoachingOp::AcceptLatest | CoachingOp::RejectLatest => {
                    let Some((id, coach)) = latest else { continue };
                    let session = &coaches[coach].1;
                    let _ = match op {
                        CoachingOp::AcceptLatest => coaching::accept_request(&app.pool, session, id).await,
                        _ => coaching::reject_request(&app.pool, session, id).await,
                    };
                }
            }

            for client in &clients {
                let open = app.open_assignments(client.user_id).await;
                if open > 1 {
                    return false;
                }
            }
        }
        true
    })
}

#[test]
fn interleaved_requests_keep_a_single_open_assignment() {
    QuickCheck::new()
        .tests(30)
        .quickcheck(at_most_one_open_assignment as fn(Vec<CoachingOp>) -> bool);
}
