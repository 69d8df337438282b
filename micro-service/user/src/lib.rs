pub mod handlers;
pub mod routes;
pub mod service;

#[cfg(test)]
mod tests;
