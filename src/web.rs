use std::sync::Arc;

use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::info;

use crate::config::CalendarConfig;
use crate::drag::{commit_reschedule, run_dispatcher, DragCoordinator, DragGesture, DropTarget, RescheduleCommand};
use crate::error::CalendarError;
use crate::grid::{effective_columns, layout_day, parse_time_to_minutes, pixel_to_time, ViewMode};
use crate::notify::NotificationLog;
use crate::parser::load_appointments;
use crate::practice::{AppointmentSource, InMemoryPractice, ResourceSource};

/// Shared server state
pub struct AppState {
    pub config: CalendarConfig,
    pub practice: Arc<InMemoryPractice>,
    pub notifications: Arc<NotificationLog>,
    pub commands: UnboundedSender<RescheduleCommand>,
}

impl AppState {
    /// Builds the state and the receiving end of the reschedule queue
    pub fn new(config: CalendarConfig, practice: Arc<InMemoryPractice>) -> (Self, UnboundedReceiver<RescheduleCommand>) {
        let (commands, receiver) = unbounded_channel();
        let notifications = Arc::new(NotificationLog::new(config.notification_history));
        (
            Self {
                config,
                practice,
                notifications,
                commands,
            },
            receiver,
        )
    }

    fn view_mode(&self, requested: Option<&str>) -> std::result::Result<ViewMode, CalendarError> {
        match requested {
            Some(view) => view.parse(),
            None => Ok(self.config.default_view_mode),
        }
    }
}

#[derive(Deserialize)]
pub struct ViewQuery {
    view: Option<String>,
}

#[derive(Deserialize)]
pub struct DateQuery {
    date: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    view: Option<String>,
    resource_id: u32,
    start_time: String,
}

#[derive(Deserialize)]
pub struct DropRequest {
    appointment_id: u32,
    view: Option<String>,
    resource_id: Option<u32>,
    pixel_offset: Option<f64>,
}

#[derive(Serialize)]
pub struct DropResponse {
    issued: bool,
    command: Option<RescheduleCommand>,
}

fn error_body(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({"success": false, "error": message.to_string()})
}

fn error_response(err: &CalendarError) -> HttpResponse {
    match err {
        CalendarError::RescheduleFailed(_) => HttpResponse::Conflict().json(error_body(err)),
        CalendarError::UnassignedResource { .. } => HttpResponse::NotFound().json(error_body(err)),
        CalendarError::InvalidRange(_) | CalendarError::InvalidConfiguration(_) | CalendarError::Csv(_) => {
            HttpResponse::BadRequest().json(error_body(err))
        }
        CalendarError::Io(_) | CalendarError::Config(_) => HttpResponse::InternalServerError().json(error_body(err)),
    }
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, HttpResponse> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| HttpResponse::BadRequest().json(error_body(format!("Invalid date '{}', expected YYYY-MM-DD", value))))
}

fn check_admin(req: &HttpRequest, state: &AppState) -> Option<HttpResponse> {
    let Some(expected) = state.config.admin_password.as_deref() else {
        return Some(HttpResponse::Forbidden().json(error_body("Uploads are disabled")));
    };
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if password != expected {
        return Some(HttpResponse::Unauthorized().json(error_body("Unauthorized")));
    }
    None
}

// Resource columns for a view mode
async fn get_resources(query: web::Query<ViewQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let view_mode = match state.view_mode(query.view.as_deref()) {
        Ok(view_mode) => view_mode,
        Err(e) => return Ok(error_response(&e)),
    };
    let columns = effective_columns(state.practice.list_resources(view_mode), view_mode);
    Ok(HttpResponse::Ok().json(columns))
}

async fn get_appointments(query: web::Query<DateQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let date = match parse_date(&query.date) {
        Ok(date) => date,
        Err(response) => return Ok(response),
    };
    Ok(HttpResponse::Ok().json(state.practice.list_appointments(date)))
}

// Full day layout
async fn get_calendar(
    date: web::Path<String>,
    query: web::Query<ViewQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(response) => return Ok(response),
    };
    let view_mode = match state.view_mode(query.view.as_deref()) {
        Ok(view_mode) => view_mode,
        Err(e) => return Ok(error_response(&e)),
    };

    let view = state.config.view_state(date).with_view_mode(view_mode);
    let columns = effective_columns(state.practice.list_resources(view_mode), view_mode);
    let appointments = state.practice.list_appointments(date);

    match layout_day(&view, &columns, &appointments) {
        Ok(layout) => Ok(HttpResponse::Ok().json(layout)),
        Err(e) => Ok(error_response(&e)),
    }
}

// Direct reschedule, bypassing the gesture
async fn reschedule(
    id: web::Path<u32>,
    req: web::Json<RescheduleRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let view_mode = match state.view_mode(req.view.as_deref()) {
        Ok(view_mode) => view_mode,
        Err(e) => return Ok(error_response(&e)),
    };
    let Some(new_start_minutes) = parse_time_to_minutes(&req.start_time) else {
        return Ok(HttpResponse::BadRequest().json(error_body(format!("Invalid start time '{}'", req.start_time))));
    };

    let command = RescheduleCommand {
        appointment_id: id.into_inner(),
        view_mode,
        new_resource_id: req.resource_id,
        new_start_minutes,
    };
    match commit_reschedule(command, &*state.practice, &*state.notifications).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "appointment": state.practice.appointment(command.appointment_id),
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

// Runs one drag gesture; the dispatcher commits the issued command
async fn drop_appointment(
    date: web::Path<String>,
    req: web::Json<DropRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(response) => return Ok(response),
    };
    let view_mode = match state.view_mode(req.view.as_deref()) {
        Ok(view_mode) => view_mode,
        Err(e) => return Ok(error_response(&e)),
    };
    let view = state.config.view_state(date).with_view_mode(view_mode);

    let mut coordinator = match DragCoordinator::new(&view, state.commands.clone()) {
        Ok(coordinator) => coordinator,
        Err(e) => return Ok(error_response(&e)),
    };
    coordinator.sync_appointments(&state.practice.list_appointments(date));

    let target = match (req.resource_id, req.pixel_offset) {
        (Some(resource_id), Some(pixel_offset)) => match pixel_to_time(pixel_offset, &view.metrics) {
            Ok(raw_time) => Some(DropTarget { resource_id, raw_time }),
            Err(e) => return Ok(error_response(&e)),
        },
        _ => None,
    };

    coordinator.on_drag_start(req.appointment_id);
    if let Some(target) = target {
        coordinator.on_drag_move(target.resource_id, target.raw_time);
    }
    let command = coordinator.on_drag_end(target);

    let response = DropResponse {
        issued: command.is_some(),
        command,
    };
    if response.issued {
        Ok(HttpResponse::Accepted().json(response))
    } else {
        Ok(HttpResponse::Ok().json(response))
    }
}

async fn get_notifications(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.notifications.recent()))
}

// Admin login endpoint
async fn admin_login(req: web::Json<LoginRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.config.admin_password.as_deref() {
        Some(expected) if req.password == expected => {
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
        }
        Some(_) => Ok(HttpResponse::Unauthorized().json(error_body("Invalid password"))),
        None => Ok(HttpResponse::Forbidden().json(error_body("Admin access is disabled"))),
    }
}

// Admin CSV upload endpoint, replaces all appointments
async fn admin_upload(req: HttpRequest, body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(rejection) = check_admin(&req, &state) {
        return Ok(rejection);
    }

    match load_appointments(&body[..]) {
        Ok(appointments) => {
            let count = appointments.len();
            state.practice.replace_appointments(appointments);
            info!(count, "appointments replaced from upload");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": format!("Loaded {} appointments", count),
            })))
        }
        Err(e) => Ok(HttpResponse::BadRequest().json(error_body(format!("Failed to process CSV: {}", e)))),
    }
}

/// Registers every route; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/resources", web::get().to(get_resources))
        .route("/api/appointments", web::get().to(get_appointments))
        .route("/api/appointments/{id}/reschedule", web::put().to(reschedule))
        .route("/api/calendar/{date}", web::get().to(get_calendar))
        .route("/api/calendar/{date}/drop", web::post().to(drop_appointment))
        .route("/api/notifications", web::get().to(get_notifications))
        .route("/api/login", web::post().to(admin_login))
        .route("/api/upload", web::post().to(admin_upload));
}

pub async fn start_server(config: CalendarConfig, practice: Arc<InMemoryPractice>) -> std::io::Result<()> {
    let port = config.port;
    let (state, receiver) = AppState::new(config, practice.clone());
    tokio::spawn(run_dispatcher(receiver, practice, state.notifications.clone()));

    let app_state = web::Data::new(state);
    info!(port, "starting calendar server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
