pub mod helpers;

mod calls;
mod events;
mod lifecycle;
mod websocket;
