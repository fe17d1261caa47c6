mod auth;
mod cells;
mod events;
mod health_check;
mod people;
mod tasks;

pub use auth::{get_current_user, login, logout, refresh, signup};
pub use cells::{
    add_member, create_cell, list_cells, list_members, remove_member, upcoming_meetings,
};
pub use events::{check_in, check_out, create_event, get_event, list_attendance, list_events};
pub use health_check::health_check;
pub use people::{create_person, get_person, list_people, search_people, update_person};
pub use tasks::{
    create_task, list_open_tasks, tasks_by_day, tasks_last_7_days, tasks_previous_month,
    tasks_this_week,
};
