pub mod delete;
pub mod images;
pub mod inspect;
pub mod merge;
pub mod sort;
