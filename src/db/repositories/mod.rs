mod activity_events;
mod auth_sessions;
mod profiles;
