pub mod annotate;
pub mod catalog;
pub mod run;
