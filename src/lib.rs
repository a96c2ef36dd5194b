#![forbid(unsafe_code)]

pub mod archive;
pub mod cli;
pub mod comic_info;
pub mod formats;
pub mod inspect;
pub mod logging;
pub mod make;
pub mod numbers;
pub mod resolver;
