#[path = "helpers/mod.rs"]
mod helpers;

#[path = "backend/mod.rs"]
mod backend;

#[path = "interchange/mod.rs"]
mod interchange;

#[path = "model/mod.rs"]
mod model;

#[path = "tools/mod.rs"]
mod tools;
