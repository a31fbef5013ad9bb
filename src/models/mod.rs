pub mod index;
pub mod report;
pub mod series;
pub mod window;
