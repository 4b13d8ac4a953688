pub mod reviews;
pub mod sales;
