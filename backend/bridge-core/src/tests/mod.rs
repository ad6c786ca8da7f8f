mod deferred;
mod exposed;
mod frontend_events;
mod wire;
