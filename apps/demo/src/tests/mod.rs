mod counter;
mod error;
mod logger;
