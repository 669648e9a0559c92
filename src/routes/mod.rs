use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

mod accounts;
mod admin;
mod coaching;
mod health_check;
mod memberships;

use crate::routes::health_check::*;

fn util_routes() -> Scope {
    scope("").service(health_check)
}

fn accounts_routes() -> Scope {
    scope("accounts")
        .service(accounts::register)
        .service(accounts::verify_email)
        .service(accounts::resend_verification)
        .service(accounts::login)
        .service(accounts::forgot_password)
        .service(accounts::check_reset_token)
        .service(accounts::reset_password)
        .service(accounts::me)
        .service(accounts::update_profile)
        .service(accounts::change_password)
}

fn plans_routes() -> Scope {
    scope("plans")
        .service(memberships::get_plans)
        .service(memberships::quote_plan)
}

fn memberships_routes() -> Scope {
    scope("memberships")
        .service(memberships::create_membership)
        .service(memberships::renew_membership)
        .service(memberships::cancel_membership)
}

fn users_routes() -> Scope {
    scope("users")
        .service(memberships::get_user_membership)
        .service(memberships::get_membership_history)
}

fn coaches_routes() -> Scope {
    scope("coaches")
        .service(coaching::get_available_coaches)
        .service(coaching::get_coach_clients)
        .service(coaching::get_pending_requests)
}

fn coach_requests_routes() -> Scope {
    scope("coach-requests")
        .service(coaching::request_coach)
        .service(coaching::accept_request)
        .service(coaching::reject_request)
}

fn clients_routes() -> Scope {
    scope("clients").service(coaching::get_coach_status)
}

fn notifications_routes() -> Scope {
    scope("notifications")
        .service(coaching::get_notifications)
        .service(coaching::mark_notification_read)
}

fn admin_routes() -> Scope {
    scope("admin")
        .service(admin::list_users)
        .service(admin::create_user)
        .service(admin::update_user)
        .service(admin::deactivate_user)
        .service(admin::list_coaches)
        .service(admin::create_coach)
        .service(admin::update_coach)
        .service(admin::create_plan)
        .service(admin::users_with_memberships)
        .service(admin::expire_memberships)
        .service(admin::update_membership)
        .service(admin::dashboard_stats)
        .service(admin::dashboard_comparison)
        .service(admin::recent_activity)
        .service(admin::pending_verifications)
}

pub fn gym_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(accounts_routes())
            .service(plans_routes())
            .service(memberships_routes())
            .service(users_routes())
            .service(coaches_routes())
            .service(coach_requests_routes())
            .service(clients_routes())
            .service(notifications_routes())
            .service(admin_routes())
            .service(util_routes()),
    );
}
