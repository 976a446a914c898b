mod builder;
mod dump;
mod label;
mod types;
