//! HTTP request handlers

pub mod health;
pub mod images;
pub mod products;
pub mod upload;

#[cfg(test)]
mod tests;
