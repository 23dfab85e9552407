use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Json,
    extract::{Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::AppError,
    pages::{self, Chrome},
    report::{render_report, report_filename},
    screens::{
        contact::{ContactField, ContactScreen},
        dashboard::DashboardScreen,
        login::{LoginOutcome, LoginScreen},
        registration::{Field, RegistrationOutcome, RegistrationScreen},
    },
    shell::{Guest, Visitor, submitting},
    state::AppState,
    utils::local_path,
};

type Shared = State<Arc<AppState>>;

fn render(visitor: &Visitor, path: &str, page: impl FnOnce(Chrome<'_>) -> String) -> Response {
    let html = {
        let navigation = visitor.shell.navigation.lock();
        page(Chrome::new(&navigation, path))
    };

    visitor.reply(Html(html))
}

/// Pages without a screen leave first-time visitors shell-less.
fn render_static(
    guest: &Guest,
    path: &str,
    page: impl FnOnce(Chrome<'_>) -> String,
) -> Html<String> {
    let html = match &guest.0 {
        Some(shell) => {
            let navigation = shell.navigation.lock();
            page(Chrome::new(&navigation, path))
        }
        None => page(Chrome {
            signed_in: false,
            menu_open: false,
            path,
        }),
    };

    Html(html)
}

pub async fn landing_handler(guest: Guest) -> Html<String> {
    render_static(&guest, "/", pages::landing)
}

pub async fn about_handler(guest: Guest) -> Html<String> {
    render_static(&guest, "/about", pages::about)
}

pub async fn register_page_handler(visitor: Visitor) -> Response {
    let mut screen = visitor.shell.registration.lock().await;
    *screen = RegistrationScreen::new();

    render(&visitor, "/register", |chrome| pages::registration(chrome, &screen))
}

pub async fn register_handler(
    State(state): Shared,
    visitor: Visitor,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let mut screen = submitting(&visitor.shell.registration)?;

    for field in Field::ALL {
        let value = form.get(field.name()).cloned().unwrap_or_default();
        screen.on_change(field, value);
    }

    let outcome = screen
        .submit(&visitor.shell.session, state.records.as_ref(), &state.auditor)
        .await;

    match outcome {
        RegistrationOutcome::Registered { .. } => {
            Ok(visitor.reply(Redirect::to("/login?registered=true")))
        }
        RegistrationOutcome::Invalid | RegistrationOutcome::Failed => Ok(render(
            &visitor,
            "/register",
            |chrome| pages::registration(chrome, &screen),
        )),
    }
}

#[derive(Deserialize)]
pub struct ValidateForm {
    field: String,
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
pub struct ValidateResult {
    field: &'static str,
    error: String,
}

pub async fn validate_handler(
    visitor: Visitor,
    Form(form): Form<ValidateForm>,
) -> Result<Response, AppError> {
    let field = Field::from_name(&form.field).ok_or(AppError::UnknownField(form.field))?;

    let mut screen = visitor.shell.registration.lock().await;
    let error = screen
        .on_change(field, form.value)
        .unwrap_or_default()
        .to_string();

    Ok(visitor.reply(Json(ValidateResult {
        field: field.name(),
        error,
    })))
}

#[derive(Deserialize)]
pub struct LoginQuery {
    registered: Option<String>,
}

pub async fn login_page_handler(visitor: Visitor, Query(query): Query<LoginQuery>) -> Response {
    let mut screen = visitor.shell.login.lock().await;
    *screen = LoginScreen::mount(query.registered.as_deref() == Some("true"));

    render(&visitor, "/login", |chrome| pages::login(chrome, &screen))
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login_handler(
    visitor: Visitor,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut screen = submitting(&visitor.shell.login)?;
    screen.email = form.email;
    screen.password = form.password;

    match screen.submit(&visitor.shell.session).await {
        LoginOutcome::SignedIn { user_id } => {
            Ok(visitor.reply(Redirect::to(&format!("/dashboard?uid={user_id}"))))
        }
        LoginOutcome::Failed => Ok(render(&visitor, "/login", |chrome| {
            pages::login(chrome, &screen)
        })),
    }
}

#[derive(Deserialize)]
pub struct DashboardQuery {
    uid: Option<String>,
}

pub async fn dashboard_page_handler(
    visitor: Visitor,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let mut screen = visitor.shell.dashboard.lock().await;
    *screen = DashboardScreen::mount(query.uid);

    render(&visitor, "/dashboard", |chrome| pages::dashboard(chrome, &screen))
}

#[derive(Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    prn: String,
}

pub async fn verify_handler(
    State(state): Shared,
    visitor: Visitor,
    Form(form): Form<VerifyForm>,
) -> Result<Response, AppError> {
    let mut screen = submitting(&visitor.shell.dashboard)?;

    screen.set_prn(form.prn);
    screen.verify(state.records.as_ref()).await;

    Ok(render(&visitor, "/dashboard", |chrome| {
        pages::dashboard(chrome, &screen)
    }))
}

#[derive(Deserialize)]
pub struct HistoryForm {
    action: String,
}

pub async fn history_handler(
    visitor: Visitor,
    Form(form): Form<HistoryForm>,
) -> Result<Response, AppError> {
    let mut screen = visitor.shell.dashboard.lock().await;

    match form.action.as_str() {
        "open" => screen.open_history(),
        "close" => screen.close_history(),
        _ => return Err(AppError::MalformedPayload),
    }

    Ok(render(&visitor, "/dashboard", |chrome| {
        pages::dashboard(chrome, &screen)
    }))
}

pub async fn report_handler(visitor: Visitor) -> Result<Response, AppError> {
    let screen = visitor.shell.dashboard.lock().await;
    let record = screen.record().ok_or(AppError::NoReport)?;

    let filename = report_filename(&record.prn);
    info!(prn = %record.prn, "Report downloaded");

    Ok(visitor.reply((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        render_report(record),
    )))
}

pub async fn contact_page_handler(visitor: Visitor) -> Response {
    let mut screen = visitor.shell.contact.lock().await;
    *screen = ContactScreen::new();

    render(&visitor, "/contact", |chrome| pages::contact(chrome, &screen))
}

#[derive(Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    message: String,
}

pub async fn contact_handler(
    State(state): Shared,
    visitor: Visitor,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let mut screen = submitting(&visitor.shell.contact)?;

    screen.set_value(ContactField::Name, form.name);
    screen.set_value(ContactField::Email, form.email);
    screen.set_value(ContactField::Phone, form.phone);
    screen.set_value(ContactField::Message, form.message);

    screen
        .submit(state.notifications.as_ref(), &state.contact)
        .await;

    Ok(render(&visitor, "/contact", |chrome| {
        pages::contact(chrome, &screen)
    }))
}

pub async fn logout_handler(visitor: Visitor) -> Response {
    let target = visitor
        .shell
        .navigation
        .lock()
        .logout(&visitor.shell.session);
    visitor.shell.unmount_screens().await;

    visitor.reply(Redirect::to(target))
}

#[derive(Deserialize)]
pub struct MenuForm {
    return_to: Option<String>,
}

pub async fn menu_handler(visitor: Visitor, Form(form): Form<MenuForm>) -> Response {
    visitor.shell.navigation.lock().toggle_menu();

    visitor.reply(Redirect::to(local_path(form.return_to.as_deref())))
}

pub async fn fallback_handler(guest: Guest) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        render_static(&guest, "/", pages::not_found),
    )
}
