use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::middleware::{JwtAuth, RequestLogger};
use crate::routes::{
    add_member, check_in, check_out, create_cell, create_event, create_person, create_task,
    get_current_user, get_event, get_person, health_check, list_attendance, list_cells,
    list_events, list_members, list_open_tasks, list_people, login, logout, refresh,
    remove_member, search_people, signup, tasks_by_day, tasks_last_7_days, tasks_previous_month,
    tasks_this_week, upcoming_meetings, update_person,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RequestLogger)
            .wrap(Cors::permissive())

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .service(
                        web::resource("/logout")
                            .wrap(JwtAuth::new(jwt_config.clone()))
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(JwtAuth::new(jwt_config.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )

            // Protected routes: identity is established by the scope-level
            // middleware, per-operation role gates live in the handlers.
            .service(
                web::scope("/people")
                    .wrap(JwtAuth::new(jwt_config.clone()))
                    .route("/search", web::get().to(search_people))
                    .service(
                        web::resource("")
                            .route(web::post().to(create_person))
                            .route(web::get().to(list_people)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(get_person))
                            .route(web::put().to(update_person)),
                    ),
            )
            .service(
                web::scope("/events")
                    .wrap(JwtAuth::new(jwt_config.clone()))
                    .service(
                        web::resource("")
                            .route(web::post().to(create_event))
                            .route(web::get().to(list_events)),
                    )
                    .route("/{id}/checkin", web::post().to(check_in))
                    .route("/{id}/checkout", web::post().to(check_out))
                    .route("/{id}/attendance", web::get().to(list_attendance))
                    .route("/{id}", web::get().to(get_event)),
            )
            .service(
                web::scope("/cells")
                    .wrap(JwtAuth::new(jwt_config.clone()))
                    .service(
                        web::resource("")
                            .route(web::post().to(create_cell))
                            .route(web::get().to(list_cells)),
                    )
                    .service(
                        web::resource("/{id}/members")
                            .route(web::post().to(add_member))
                            .route(web::get().to(list_members)),
                    )
                    .route("/{id}/members/{person_id}", web::delete().to(remove_member))
                    .route("/{id}/meetings", web::get().to(upcoming_meetings)),
            )
            .service(
                web::scope("/tasks")
                    .wrap(JwtAuth::new(jwt_config.clone()))
                    .service(
                        web::resource("")
                            .route(web::post().to(create_task))
                            .route(web::get().to(list_open_tasks)),
                    )
                    .route("/day/{date}", web::get().to(tasks_by_day))
                    .route("/last-7-days", web::get().to(tasks_last_7_days))
                    .route("/this-week", web::get().to(tasks_this_week))
                    .route("/previous-month", web::get().to(tasks_previous_month)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
